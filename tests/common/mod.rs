// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use announce_monitor::config::{Target, TargetKind};
use announce_monitor::error::{MonitorError, Result};
use announce_monitor::ingest::types::Fetcher;
use announce_monitor::notify::{refilter, Notifier};
use announce_monitor::{Announcement, KeywordSet, RawRecord};

pub enum Canned {
    Records(Vec<RawRecord>),
    Network(&'static str),
    Application(&'static str),
}

/// Fetcher answering per target name, counting calls.
pub struct ScriptedFetcher {
    answers: HashMap<String, Canned>,
    calls: Mutex<HashMap<String, u32>>,
    pub total_calls: AtomicU32,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            total_calls: AtomicU32::new(0),
        }
    }

    pub fn answer(mut self, target: &str, canned: Canned) -> Self {
        self.answers.insert(target.to_string(), canned);
        self
    }

    pub fn calls_for(&self, target: &str) -> u32 {
        self.calls.lock().unwrap().get(target).copied().unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, target: &Target) -> Result<Vec<RawRecord>> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(target.name.clone())
            .or_default() += 1;
        match self.answers.get(&target.name) {
            Some(Canned::Records(r)) => Ok(r.clone()),
            Some(Canned::Network(m)) => Err(MonitorError::Network(m.to_string())),
            Some(Canned::Application(m)) => Err(MonitorError::Application(m.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

/// Notifier that applies the same keyword re-check as the real channels and
/// remembers every batch it delivered.
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<Vec<Announcement>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(vec![]),
        }
    }

    pub fn batches(&self) -> Vec<Vec<Announcement>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, items: &[Announcement], keywords: &KeywordSet) -> bool {
        let delivered = refilter(items, keywords);
        if delivered.is_empty() {
            return false;
        }
        self.calls.lock().unwrap().push(delivered);
        true
    }
}

pub fn api_target(name: &str) -> Target {
    Target {
        name: name.to_string(),
        kind: TargetKind::Api {
            api_url: format!("https://example.test/{name}/getData"),
            tag_id: "3".into(),
            article_type: "4".into(),
            page_index: 1,
            page_size: 20,
        },
        keywords: vec![],
    }
}
