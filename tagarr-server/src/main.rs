//! tagarr: keeps Radarr/Sonarr tag state in sync with watchlist sources.

mod health;
mod scheduler;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tagarr_config::{Config, ConfigLoader, SyncConfig, TargetConfig};
use tagarr_core::{
    AdaptiveQueue, AppStatus, DeleteOptions, JsonListSource, QueueSettings, RadarrClient,
    Reconciler, RetryPolicy, SonarrClient, SourceCollector, SyncSettings, TargetClient,
};
use tagarr_model::MediaKind;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::scheduler::{SyncScheduler, TargetRuntime};

#[derive(Debug, Parser)]
#[command(name = "tagarr", version, about = "Watchlist-driven tag reconciliation for media-library managers")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "tagarr.toml")]
    config: PathBuf,

    /// Run a single sync pass and exit.
    #[arg(long)]
    once: bool,

    /// Log every change without applying it, regardless of the config.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tagarr=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let load = ConfigLoader::new(&cli.config)
        .load()
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    for warning in &load.warnings {
        warn!("{warning}");
    }

    let mut config = load.config;
    if cli.dry_run {
        config.sync.dry_run = true;
        info!("dry-run forced from the command line");
    }

    let status = AppStatus::new();
    let sources = build_sources(&config)?;
    let targets = build_targets(&config)?;
    info!(
        sources = sources.len(),
        targets = targets.len(),
        interval = %config.sync.interval,
        "tagarr starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding health endpoint to {}", config.server.bind))?;
    info!(bind = %config.server.bind, "health endpoint listening");
    let router = health::router(status.clone());
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router).await {
            error!(error = %err, "health endpoint stopped");
        }
    });

    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(()).await;
        }
    });

    SyncScheduler::new(
        config.sync.interval_duration(),
        cli.once,
        sources,
        targets,
        status,
        shutdown_rx,
    )
    .run()
    .await;

    info!("tagarr stopped");
    Ok(())
}

fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn SourceCollector>>> {
    let mut sources: Vec<Arc<dyn SourceCollector>> = Vec::new();
    for list in &config.sources {
        let url = Url::parse(&list.url)
            .with_context(|| format!("source '{}' has an invalid url", list.name))?;
        let tags: BTreeSet<String> = list.tags.iter().cloned().collect();
        let source = JsonListSource::new(&list.name, list.kind, tags, url)
            .with_context(|| format!("building source '{}'", list.name))?;
        sources.push(Arc::new(source));
    }
    Ok(sources)
}

fn build_targets(config: &Config) -> anyhow::Result<Vec<TargetRuntime>> {
    let mut targets = Vec::new();
    if let Some(target) = &config.targets.radarr {
        let base = Url::parse(&target.base_url).context("radarr base_url")?;
        let client: Arc<dyn TargetClient> =
            Arc::new(RadarrClient::new("radarr", base, target.api_key.clone())?);
        targets.push(TargetRuntime {
            name: "radarr".to_string(),
            kind: MediaKind::Movies,
            reconciler: build_reconciler(client, &config.sync, target),
        });
    }
    if let Some(target) = &config.targets.sonarr {
        let base = Url::parse(&target.base_url).context("sonarr base_url")?;
        let client: Arc<dyn TargetClient> =
            Arc::new(SonarrClient::new("sonarr", base, target.api_key.clone())?);
        targets.push(TargetRuntime {
            name: "sonarr".to_string(),
            kind: MediaKind::Series,
            reconciler: build_reconciler(client, &config.sync, target),
        });
    }
    Ok(targets)
}

fn build_reconciler(
    client: Arc<dyn TargetClient>,
    sync: &SyncConfig,
    target: &TargetConfig,
) -> Reconciler<dyn TargetClient> {
    let settings = SyncSettings {
        ownership_tag: sync.ownership_tag.clone(),
        extra_tags: sync.extra_tags.clone(),
        update_untagged: sync.update_untagged,
        monitor: sync.monitor,
        quality_profile: target.quality_profile.clone(),
        root_folder: target.root_folder.clone(),
        search_on_add: sync.search_on_add,
        dry_run: sync.dry_run,
        delete: DeleteOptions {
            delete_files: target.delete_files,
            add_import_exclusion: target.add_import_exclusion,
        },
    };
    let queue = AdaptiveQueue::new(QueueSettings {
        max: sync.max_concurrency,
        ..QueueSettings::default()
    });
    let retry = RetryPolicy::new(sync.retry_attempts, sync.retry_delay_duration());
    Reconciler::new(client, settings, queue, retry)
}
