// src/ingest/types.rs
use crate::config::Target;
use crate::error::Result;
use crate::model::RawRecord;

/// Produces raw records for one target. One call is one attempt: it either
/// returns the full record set or fails; retrying is the caller's business.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &Target) -> Result<Vec<RawRecord>>;
}

/// Per-target outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetReport {
    pub name: String,
    pub fetched: usize,
    pub invalid: usize,
    pub kept: usize,
    pub new: usize,
    pub error: Option<String>,
}

/// Summary of one full tick across all targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub targets: Vec<TargetReport>,
    pub new_total: usize,
    pub notified: bool,
}

impl TickReport {
    pub fn failed_targets(&self) -> Vec<&str> {
        self.targets
            .iter()
            .filter(|t| t.error.is_some())
            .map(|t| t.name.as_str())
            .collect()
    }
}
