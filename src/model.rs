// src/model.rs
//! Canonical announcement types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{MonitorError, Result};

/// Raw provider payload item; field names vary per provider.
pub type RawRecord = serde_json::Value;

/// Merged keyword set (global ∪ per-target). Ordered so matches render deterministically.
pub type KeywordSet = BTreeSet<String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    /// Sole dedup identity.
    pub url: String,
    pub publish_date: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub content: Option<String>,
    /// Attached by the keyword filter; never persisted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

impl Announcement {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        publish_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            publish_date: publish_date.into(),
            source: String::new(),
            content: None,
            matched_keywords: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Required fields must be present before an item may reach the store.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(MonitorError::Normalize("announcement has empty title".into()));
        }
        if self.url.trim().is_empty() {
            return Err(MonitorError::Normalize(format!(
                "announcement '{}' has no url",
                self.title
            )));
        }
        Ok(())
    }
}

/// Row as persisted by the store. `id` and `crawl_date` are assigned on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::FromRow)]
pub struct StoredRecord {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub content: Option<String>,
    pub source: Option<String>,
    pub publish_date: String,
    pub crawl_date: String,
}

impl From<StoredRecord> for Announcement {
    fn from(r: StoredRecord) -> Self {
        Self {
            title: r.title,
            url: r.url,
            publish_date: r.publish_date,
            source: r.source.unwrap_or_default(),
            content: r.content,
            matched_keywords: Vec::new(),
        }
    }
}
