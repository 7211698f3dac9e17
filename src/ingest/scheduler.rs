// src/ingest/scheduler.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::ingest::Monitor;

/// Run a tick right away, then every `interval`, until `shutdown` resolves.
///
/// Ticks never overlap: a slow tick pushes the next one back instead of
/// queueing a burst. `shutdown` is only observed between ticks, so an
/// in-flight tick (and its store writes) always completes. Returns the
/// number of ticks run.
pub async fn run_until<F>(monitor: &Monitor, interval: Duration, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    tracing::info!(interval_secs = interval.as_secs(), "scheduler started");
    let mut ticks = 0u64;
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!(ticks, "shutdown requested, scheduler stopped");
                return ticks;
            }
            _ = ticker.tick() => {
                monitor.run_tick().await;
                ticks += 1;
            }
        }
    }
}

/// Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received terminate signal, shutting down"),
    }
}
