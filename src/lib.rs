// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod notify;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::MonitorConfig;
pub use crate::error::MonitorError;
pub use crate::ingest::Monitor;
pub use crate::model::{Announcement, KeywordSet, RawRecord, StoredRecord};
pub use crate::store::Store;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the fmt subscriber. `RUST_LOG` wins; otherwise `default_level`
/// (the configured `log.level`) applies to everything.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_level).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    // try_init: a second call (tests, tools) is a no-op rather than a panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
