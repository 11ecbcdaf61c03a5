//! The periodic sync loop.
//!
//! Each pass collects every configured source once, derives the safety
//! verdict per library kind, and runs one reconciliation per target. A
//! single target's failure is recorded and never kills the loop.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use tagarr_core::{AppStatus, Reconciler, SourceCollector, TargetClient, assess, collect};
use tagarr_model::MediaKind;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// One configured target with its reconciler, ready to run.
pub struct TargetRuntime {
    pub name: String,
    pub kind: MediaKind,
    pub reconciler: Reconciler<dyn TargetClient>,
}

pub struct SyncScheduler {
    interval: Duration,
    once: bool,
    sources: Vec<Arc<dyn SourceCollector>>,
    targets: Vec<TargetRuntime>,
    status: AppStatus,
    shutdown: mpsc::Receiver<()>,
}

impl SyncScheduler {
    pub fn new(
        interval: Duration,
        once: bool,
        sources: Vec<Arc<dyn SourceCollector>>,
        targets: Vec<TargetRuntime>,
        status: AppStatus,
        shutdown: mpsc::Receiver<()>,
    ) -> Self {
        Self {
            interval,
            once,
            sources,
            targets,
            status,
            shutdown,
        }
    }

    /// Run until shutdown. The first pass starts immediately.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_pass().await;
                    if self.once {
                        info!("single pass requested, exiting");
                        return;
                    }
                }
                _ = self.shutdown.recv() => {
                    info!("shutdown requested, stopping sync loop");
                    return;
                }
            }
        }
    }

    async fn run_pass(&self) {
        info!(sources = self.sources.len(), targets = self.targets.len(), "starting sync pass");
        let collection = collect(&self.sources).await;

        let failing = collection
            .reports
            .iter()
            .filter(|report| report.compromised())
            .count();
        if failing > 0 {
            warn!(failing, "some sources are compromised this pass");
            self.status.set_component_health(
                "sources",
                false,
                Some(format!("{failing} source(s) failing or degraded")),
            );
        } else {
            self.status.set_component_health("sources", true, None);
        }

        let source_kinds: HashMap<String, MediaKind> = self
            .sources
            .iter()
            .map(|source| (source.name(), source.kind()))
            .collect();

        for target in &self.targets {
            self.status.set_syncing(&target.name);
            let desired = collection.desired_for(target.kind);
            let reports = collection.reports_for(target.kind, &source_kinds);
            // Declared names come from the reports, not the produced items,
            // so a failed list still contributes its tags.
            let declared: BTreeSet<String> = reports
                .iter()
                .flat_map(|report| report.tags.iter().cloned())
                .collect();
            let verdict = assess(&reports);

            match target.reconciler.run(&desired, &declared, &verdict).await {
                Ok(summary) => {
                    info!(target = %target.name, %summary, "sync pass finished");
                    self.status.set_component_health(&target.name, true, None);
                    self.status.record_run(&target.name, Ok(summary));
                }
                Err(err) => {
                    error!(target = %target.name, error = %err, "sync pass failed");
                    self.status
                        .set_component_health(&target.name, false, Some(err.to_string()));
                    self.status.record_run(&target.name, Err(err.to_string()));
                }
            }
        }
        self.status.set_idle();
    }
}
