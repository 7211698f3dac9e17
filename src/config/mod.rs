// src/config/mod.rs
pub mod monitor;

pub use monitor::{
    EmailConfig, LogConfig, MonitorConfig, NotificationConfig, RequestConfig, StorageConfig,
    Target, TargetKind,
};
