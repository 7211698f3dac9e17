// src/ingest/normalize.rs
//! Raw provider record -> canonical `Announcement`.
//!
//! Providers spell the same field differently (`title` / `Title`,
//! `contentUrl` / `ContentUrl`, ...). Each canonical field has an ordered alias
//! list; the first alias present with a non-null value wins.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{MonitorError, Result};
use crate::model::{Announcement, RawRecord};

pub const UNTITLED: &str = "untitled";

pub const TITLE_ALIASES: &[&str] = &["title", "Title"];
pub const URL_ALIASES: &[&str] = &["contentUrl", "ContentUrl", "url", "URL"];
pub const PUBLISH_DATE_ALIASES: &[&str] = &["publishtime", "PublishTime", "pub_date", "publish_date"];
pub const SOURCE_ALIASES: &[&str] = &["source", "Source"];
pub const CONTENT_ALIASES: &[&str] = &["content", "Content"];

/// First alias with a usable value. Strings are taken as-is, numbers and bools
/// are stringified, null and nested values count as absent.
pub fn pick_field(obj: &Map<String, Value>, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Decode entities, strip tags, collapse whitespace.
pub fn clean_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("static regex"));
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("static regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

pub fn normalize(raw: &RawRecord) -> Result<Announcement> {
    let obj = raw.as_object().ok_or_else(|| {
        MonitorError::Normalize(format!("expected a JSON object, got {}", value_kind(raw)))
    })?;

    let title = pick_field(obj, TITLE_ALIASES)
        .map(|t| clean_title(&t))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    Ok(Announcement {
        title,
        url: pick_field(obj, URL_ALIASES)
            .map(|u| u.trim().to_string())
            .unwrap_or_default(),
        publish_date: pick_field(obj, PUBLISH_DATE_ALIASES)
            .map(|d| d.trim().to_string())
            .unwrap_or_default(),
        source: pick_field(obj, SOURCE_ALIASES).unwrap_or_default(),
        content: pick_field(obj, CONTENT_ALIASES).filter(|c| !c.is_empty()),
        matched_keywords: Vec::new(),
    })
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
