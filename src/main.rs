//! Announcement monitor: binary entrypoint.
//! Loads config, opens the store, runs one tick immediately and then on the
//! configured interval until Ctrl+C / SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use announce_monitor::ingest::providers::HttpFetcher;
use announce_monitor::ingest::scheduler::{run_until, shutdown_signal};
use announce_monitor::{notify, Monitor, MonitorConfig, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cfg = MonitorConfig::load_default().context("loading monitor config")?;
    announce_monitor::init_tracing(&cfg.log.level);
    tracing::info!(
        targets = cfg.targets.len(),
        keywords = ?cfg.keywords,
        interval_secs = cfg.monitor_interval_secs,
        "announcement monitor starting"
    );

    // The only fatal runtime condition: no usable store.
    let store = Store::open(&cfg.storage.path)
        .await
        .with_context(|| format!("initializing store at {}", cfg.storage.path.display()))?;

    let fetcher = HttpFetcher::new(&cfg.request).context("building http client")?;
    let notifier: Arc<dyn notify::Notifier> = Arc::from(notify::from_config(&cfg.notification));

    let monitor = Monitor::new(&cfg, store.clone(), Arc::new(fetcher), notifier);
    let ticks = run_until(
        &monitor,
        Duration::from_secs(cfg.monitor_interval_secs),
        shutdown_signal(),
    )
    .await;

    store.close().await;
    tracing::info!(ticks, "announcement monitor stopped");
    Ok(())
}
