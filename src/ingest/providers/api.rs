// src/ingest/providers/api.rs
//! JSON list endpoint of the grain trading center (`centerweb/getData`).

use metrics::{counter, histogram};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MonitorError, Result};
use crate::model::RawRecord;

pub const SUCCESS_CODE: &str = "001";
const LIST_METHOD: &str = "tradeCenterOtherNewsList";

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<Vec<Value>>,
}

/// Form payload: `param=<json>` with the list method and paging parameters.
pub fn request_param(article_type: &str, page_index: u32, page_size: u32) -> String {
    serde_json::json!({
        "m": LIST_METHOD,
        "articleTypeID": article_type,
        "indexid": page_index.to_string(),
        "pagesize": page_size.to_string(),
    })
    .to_string()
}

/// Unwrap the provider envelope. A non-success code is a provider-side answer,
/// not a transport problem.
pub fn parse_envelope(body: &str) -> Result<Vec<RawRecord>> {
    let env: Envelope = serde_json::from_str(body)
        .map_err(|e| MonitorError::Application(format!("malformed provider envelope: {e}")))?;

    let code = match &env.code {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    if code != SUCCESS_CODE {
        let msg = env.msg.as_deref().unwrap_or("unknown error");
        return Err(MonitorError::Application(format!(
            "provider returned code {code:?}: {msg}"
        )));
    }
    Ok(env.data.unwrap_or_default())
}

pub async fn fetch(
    client: &Client,
    api_url: &str,
    tag_id: &str,
    article_type: &str,
    page_index: u32,
    page_size: u32,
) -> Result<Vec<RawRecord>> {
    let t0 = std::time::Instant::now();
    tracing::info!(api_url, tag_id, article_type, "requesting announcement list");

    let resp = client
        .post(api_url)
        .form(&[("param", request_param(article_type, page_index, page_size))])
        .send()
        .await?
        .error_for_status()?;
    let body = resp.text().await?;

    let items = parse_envelope(&body)?;

    histogram!("monitor_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("monitor_fetched_total").increment(items.len() as u64);
    tracing::info!(api_url, count = items.len(), "announcement list received");
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_yields_data() {
        let body = r#"{"code":"001","msg":"ok","data":[{"title":"a"},{"title":"b"}]}"#;
        let items = parse_envelope(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "a");
    }

    #[test]
    fn success_envelope_without_data_is_empty() {
        assert!(parse_envelope(r#"{"code":"001"}"#).unwrap().is_empty());
    }

    #[test]
    fn error_code_is_application_error_with_message() {
        let err = parse_envelope(r#"{"code":"002","msg":"参数错误"}"#).unwrap_err();
        match err {
            MonitorError::Application(m) => assert!(m.contains("参数错误"), "{m}"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!parse_envelope(r#"{"code":1,"data":[]}"#)
            .unwrap_err()
            .is_retryable());
    }

    #[test]
    fn garbage_body_is_not_retryable() {
        let err = parse_envelope("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, MonitorError::Application(_)));
    }

    #[test]
    fn request_param_carries_paging() {
        let p: Value = serde_json::from_str(&request_param("4", 1, 20)).unwrap();
        assert_eq!(p["m"], "tradeCenterOtherNewsList");
        assert_eq!(p["articleTypeID"], "4");
        assert_eq!(p["indexid"], "1");
        assert_eq!(p["pagesize"], "20");
    }
}
