//! Injected run-status state, read by the health endpoint.
//!
//! Constructed once at process start and shared by handle; all mutation
//! goes through the setters below. No module-level globals.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tagarr_model::RunSummary;

/// Coarse process state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "target")]
pub enum AppState {
    Starting,
    Idle,
    Syncing(String),
}

/// Outcome of the most recent pass against one target.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunRecord {
    pub finished_at: DateTime<Utc>,
    pub ok: bool,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
}

/// Health of one named component (a target connection, the source set).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ComponentHealth {
    pub healthy: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Default)]
struct StatusInner {
    state: Option<AppState>,
    last_runs: HashMap<String, RunRecord>,
    components: HashMap<String, ComponentHealth>,
}

/// Point-in-time view for the status endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StatusSnapshot {
    pub state: AppState,
    pub last_runs: HashMap<String, RunRecord>,
    pub components: HashMap<String, ComponentHealth>,
    pub healthy: bool,
}

/// Shared, explicitly-owned application status.
#[derive(Debug, Clone, Default)]
pub struct AppStatus {
    inner: Arc<RwLock<StatusInner>>,
}

impl AppStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_syncing(&self, target: &str) {
        self.write().state = Some(AppState::Syncing(target.to_string()));
    }

    pub fn set_idle(&self) {
        self.write().state = Some(AppState::Idle);
    }

    pub fn record_run(&self, target: &str, result: Result<RunSummary, String>) {
        let record = match result {
            Ok(summary) => RunRecord {
                finished_at: Utc::now(),
                ok: true,
                summary: Some(summary),
                error: None,
            },
            Err(error) => RunRecord {
                finished_at: Utc::now(),
                ok: false,
                summary: None,
                error: Some(error),
            },
        };
        self.write().last_runs.insert(target.to_string(), record);
    }

    pub fn set_component_health(&self, component: &str, healthy: bool, detail: Option<String>) {
        self.write()
            .components
            .insert(component.to_string(), ComponentHealth { healthy, detail });
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read().expect("status lock poisoned");
        let healthy = inner.components.values().all(|c| c.healthy);
        StatusSnapshot {
            state: inner.state.clone().unwrap_or(AppState::Starting),
            last_runs: inner.last_runs.clone(),
            components: inner.components.clone(),
            healthy,
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, StatusInner> {
        self.inner.write().expect("status lock poisoned")
    }
}
