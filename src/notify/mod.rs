// src/notify/mod.rs
pub mod email;
pub mod render;

use chrono::Local;

use crate::ingest::filter::matched_keywords;
use crate::model::{Announcement, KeywordSet};

pub use email::EmailNotifier;
pub use render::{render_summary, subject_line, Summary};

/// Delivers one digest of new announcements. Failures are reported as `false`
/// and logged by the implementation; they never abort a tick.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, items: &[Announcement], keywords: &KeywordSet) -> bool;
}

/// Defensive second pass over the keyword policy. Items that already carry
/// matches pass untouched; the rest are checked against `keywords`.
pub fn refilter(items: &[Announcement], keywords: &KeywordSet) -> Vec<Announcement> {
    if keywords.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter_map(|a| {
            if !a.matched_keywords.is_empty() {
                return Some(a.clone());
            }
            let hits = matched_keywords(&a.title, keywords);
            (!hits.is_empty()).then(|| Announcement {
                matched_keywords: hits,
                ..a.clone()
            })
        })
        .collect()
}

/// Writes the digest to the log. Used when no mail channel is configured so
/// new items still show up somewhere.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, items: &[Announcement], keywords: &KeywordSet) -> bool {
        let items = refilter(items, keywords);
        if items.is_empty() {
            return false;
        }
        let summary = render_summary(&items, None, Local::now());
        tracing::info!(target: "notify", subject = %summary.subject, "{}", summary.body);
        true
    }
}

/// Mail when it is usable, log otherwise.
pub fn from_config(cfg: &crate::config::NotificationConfig) -> Box<dyn Notifier> {
    let email = EmailNotifier::from_config(cfg);
    if email.is_active() {
        Box::new(email)
    } else {
        tracing::warn!("no delivery channel configured; new announcements will only be logged");
        Box::new(LogNotifier)
    }
}
