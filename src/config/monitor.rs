// src/config/monitor.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "MONITOR_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/monitor.toml";
pub const DEFAULT_JSON_PATH: &str = "config/monitor.json";
const MAX_RETRY_DELAY_SECS: f64 = 300.0;
const MAX_BACKOFF: f64 = 10.0;

fn default_interval_secs() -> u64 {
    3600
}
fn default_db_path() -> PathBuf {
    PathBuf::from("grain_announcements.db")
}
fn default_smtp_server() -> String {
    "smtp.163.com".to_string()
}
fn default_smtp_port() -> u16 {
    465
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_secs() -> f64 {
    2.0
}
fn default_backoff() -> f64 {
    2.0
}
fn default_page_index() -> u32 {
    1
}
fn default_page_size() -> u32 {
    20
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "User-Agent".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string(),
        ),
        ("X-Requested-With".to_string(), "XMLHttpRequest".to_string()),
    ])
}

/// Everything the monitor needs, resolved once at start and passed down explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub targets: Vec<Target>,
    /// Global keywords, unioned with each target's own list.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_interval_secs")]
    pub monitor_interval_secs: u64,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub request: RequestConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    #[serde(flatten)]
    pub kind: TargetKind,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TargetKind {
    Api {
        api_url: String,
        tag_id: String,
        article_type: String,
        #[serde(default = "default_page_index")]
        page_index: u32,
        #[serde(default = "default_page_size")]
        page_size: u32,
    },
    Web {
        url: String,
    },
}

impl Target {
    /// Endpoint or page the target talks to; used in log lines.
    pub fn location(&self) -> &str {
        match &self.kind {
            TargetKind::Api { api_url, .. } => api_url,
            TargetKind::Web { url } => url,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TargetKind::Api { .. } => "api",
            TargetKind::Web { .. } => "web",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub recipient: String,
    /// Prepended to the subject line, e.g. "[Grain monitor]".
    #[serde(default)]
    pub subject_prefix: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            recipient: String::new(),
            subject_prefix: None,
        }
    }
}

// Hand-written so the password never ends up in a log line.
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("password_len", &self.password.len())
            .field("recipient", &self.recipient)
            .field("subject_prefix", &self.subject_prefix)
            .finish()
    }
}

impl EmailConfig {
    /// Names of required settings that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.smtp_server.trim().is_empty() {
            out.push("smtp_server");
        }
        if self.username.trim().is_empty() {
            out.push("username");
        }
        if self.password.is_empty() {
            out.push("password");
        }
        if self.recipient.trim().is_empty() {
            out.push("recipient");
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per fetch, first one included.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: f64,
    #[serde(default = "default_backoff")]
    pub backoff: f64,
    #[serde(default = "default_headers")]
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            backoff: default_backoff(),
            headers: default_headers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: vec![Target {
                name: "国家粮食交易中心-交易公告".to_string(),
                kind: TargetKind::Api {
                    api_url: "https://www.grainmarket.com.cn/centerweb/getData".to_string(),
                    tag_id: "3".to_string(),
                    article_type: "4".to_string(),
                    page_index: default_page_index(),
                    page_size: default_page_size(),
                },
                keywords: vec![
                    "进口大豆".to_string(),
                    "大豆".to_string(),
                    "竞价销售".to_string(),
                ],
            }],
            keywords: vec!["进口大豆".to_string()],
            monitor_interval_secs: default_interval_secs(),
            storage: StorageConfig::default(),
            notification: NotificationConfig {
                enabled: true,
                email: EmailConfig::default(),
            },
            request: RequestConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from an explicit path. Supports TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading monitor config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = Self::parse(&content, ext.as_str())
            .with_context(|| format!("parsing monitor config {}", path.display()))?;
        cfg.finish()
    }

    /// Resolve config using env var + fallbacks:
    /// 1) $MONITOR_CONFIG_PATH
    /// 2) config/monitor.toml
    /// 3) config/monitor.json
    /// 4) built-in defaults
    ///
    /// Credential env overrides are applied in every case.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        Self::default().finish()
    }

    fn parse(s: &str, hint_ext: &str) -> Result<Self> {
        match hint_ext {
            "json" => Ok(serde_json::from_str(s)?),
            "toml" => Ok(toml::from_str(s)?),
            _ => {
                if let Ok(v) = toml::from_str::<Self>(s) {
                    return Ok(v);
                }
                serde_json::from_str::<Self>(s)
                    .map_err(|_| anyhow!("unsupported monitor config format"))
            }
        }
    }

    fn finish(mut self) -> Result<Self> {
        self.apply_env_overrides()?;
        self.sanitize();
        self.validate()?;
        Ok(self)
    }

    /// EMAIL_* and MONITOR_INTERVAL_SECS win over file values when set and non-empty.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        let email = &mut self.notification.email;
        if let Some(v) = env_nonempty("EMAIL_SMTP_SERVER") {
            email.smtp_server = v;
        }
        if let Some(v) = env_nonempty("EMAIL_SMTP_PORT") {
            email.smtp_port = v
                .trim()
                .parse()
                .with_context(|| format!("EMAIL_SMTP_PORT is not a port number: {v}"))?;
        }
        if let Some(v) = env_nonempty("EMAIL_USERNAME") {
            email.username = v;
        }
        if let Some(v) = env_nonempty("EMAIL_PASSWORD") {
            email.password = v;
        }
        if let Some(v) = env_nonempty("EMAIL_RECIPIENT") {
            email.recipient = v;
        }
        if let Some(v) = env_nonempty("MONITOR_INTERVAL_SECS") {
            self.monitor_interval_secs = v
                .trim()
                .parse()
                .with_context(|| format!("MONITOR_INTERVAL_SECS is not a number: {v}"))?;
        }
        Ok(())
    }

    fn sanitize(&mut self) {
        self.keywords = clean_list(std::mem::take(&mut self.keywords));
        for t in &mut self.targets {
            t.keywords = clean_list(std::mem::take(&mut t.keywords));
        }
        if self.request.max_retries == 0 {
            self.request.max_retries = 1;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.monitor_interval_secs == 0 {
            bail!("monitor_interval_secs must be greater than zero");
        }
        if self.request.timeout_secs == 0 {
            bail!("request.timeout_secs must be greater than zero");
        }
        let delay = self.request.retry_delay_secs;
        if !delay.is_finite() || !(0.0..=MAX_RETRY_DELAY_SECS).contains(&delay) {
            bail!("request.retry_delay_secs must be between 0 and {MAX_RETRY_DELAY_SECS}, got {delay}");
        }
        let backoff = self.request.backoff;
        if !backoff.is_finite() || !(1.0..=MAX_BACKOFF).contains(&backoff) {
            bail!("request.backoff must be between 1 and {MAX_BACKOFF}, got {backoff}");
        }
        for t in &self.targets {
            if t.name.trim().is_empty() {
                bail!("target with empty name ({})", t.location());
            }
            if t.location().trim().is_empty() {
                bail!("target '{}' has no url", t.name);
            }
        }
        Ok(())
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|o| o == t) {
            out.push(t.to_string());
        }
    }
    out
}
