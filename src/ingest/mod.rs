// src/ingest/mod.rs
pub mod filter;
pub mod normalize;
pub mod providers;
pub mod retry;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::config::{MonitorConfig, Target};
use crate::error::{MonitorError, Result};
use crate::ingest::retry::{with_retry, RetryPolicy};
use crate::ingest::types::{Fetcher, TargetReport, TickReport};
use crate::model::{Announcement, KeywordSet};
use crate::notify::Notifier;
use crate::store::Store;

/// One-time metrics registration (so series show up once a recorder is installed).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("monitor_ticks_total", "Completed monitor ticks.");
        describe_counter!("monitor_fetched_total", "Raw records received from providers.");
        describe_counter!("monitor_new_total", "Announcements stored for the first time.");
        describe_counter!(
            "monitor_target_errors_total",
            "Targets skipped in a tick because of an error."
        );
        describe_counter!(
            "monitor_notify_failures_total",
            "Notification deliveries that failed."
        );
        describe_histogram!("monitor_fetch_ms", "Provider fetch time in milliseconds.");
        describe_gauge!("monitor_last_tick_ts", "Unix ts when the last tick finished.");
    });
}

/// Fetch -> normalize -> filter -> dedup-insert -> notify, across all targets.
/// Holds no announcement state between ticks; the store is the only memory.
pub struct Monitor {
    targets: Vec<Target>,
    keywords: Vec<String>,
    retry: RetryPolicy,
    store: Store,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        cfg: &MonitorConfig,
        store: Store,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            targets: cfg.targets.clone(),
            keywords: cfg.keywords.clone(),
            retry: RetryPolicy::from_request_config(&cfg.request),
            store,
            fetcher,
            notifier,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Keyword set handed to the notifier. Global keywords plus every target's
    /// own list, or empty when some target runs unfiltered: its items carry no
    /// matches and must still pass the notifier's own check.
    fn notify_keywords(&self) -> KeywordSet {
        let unfiltered = self
            .targets
            .iter()
            .any(|t| filter::merge_keywords(&self.keywords, &t.keywords).is_empty());
        if unfiltered {
            return KeywordSet::new();
        }
        filter::merge_keywords(
            &self.keywords,
            self.targets.iter().flat_map(|t| &t.keywords),
        )
    }

    pub async fn run_tick(&self) -> TickReport {
        ensure_metrics_described();
        tracing::info!(targets = self.targets.len(), "monitor tick started");

        let mut report = TickReport::default();
        let mut new_items: Vec<Announcement> = Vec::new();

        for target in &self.targets {
            let mut tr = TargetReport {
                name: target.name.clone(),
                ..TargetReport::default()
            };

            if let Err(e) = self.process_target(target, &mut tr, &mut new_items).await {
                counter!("monitor_target_errors_total").increment(1);
                tracing::error!(
                    target_name = %target.name,
                    url = %target.location(),
                    kind = e.kind(),
                    error = %e,
                    "target skipped this tick"
                );
                tr.error = Some(e.to_string());
            } else if tr.new > 0 {
                tracing::info!(target_name = %target.name, new = tr.new, "new announcements found");
            } else {
                tracing::info!(target_name = %target.name, "no new announcements");
            }
            report.targets.push(tr);
        }

        report.new_total = new_items.len();
        counter!("monitor_new_total").increment(new_items.len() as u64);

        if !new_items.is_empty() {
            report.notified = self.notifier.notify(&new_items, &self.notify_keywords()).await;
            if !report.notified {
                tracing::warn!(count = new_items.len(), "new announcements were not delivered");
            }
        }

        counter!("monitor_ticks_total").increment(1);
        gauge!("monitor_last_tick_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(
            new = report.new_total,
            failed = report.failed_targets().len(),
            "monitor tick finished"
        );
        report
    }

    /// Items inserted before a storage failure stay in `new_items`: they are in
    /// the store now and would never be reported otherwise.
    async fn process_target(
        &self,
        target: &Target,
        tr: &mut TargetReport,
        new_items: &mut Vec<Announcement>,
    ) -> Result<()> {
        tracing::info!(target_name = %target.name, kind = target.kind_name(), "checking target");

        let fetcher = &self.fetcher;
        let raw = with_retry(&self.retry, MonitorError::is_retryable, || {
            fetcher.fetch(target)
        })
        .await?;
        tr.fetched = raw.len();

        let mut candidates = Vec::with_capacity(raw.len());
        for rec in &raw {
            match normalize::normalize(rec).and_then(|a| a.validate().map(|_| a)) {
                Ok(a) => candidates.push(a),
                Err(e) => {
                    tr.invalid += 1;
                    tracing::warn!(target_name = %target.name, error = %e, "skipping raw record");
                }
            }
        }

        let keywords = filter::merge_keywords(&self.keywords, &target.keywords);
        let kept = filter::filter(candidates, &keywords);
        tr.kept = kept.len();

        for a in kept {
            if self.store.insert_if_new(&a).await? {
                tr.new += 1;
                new_items.push(a);
            }
        }
        Ok(())
    }
}
