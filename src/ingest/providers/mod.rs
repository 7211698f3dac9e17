// src/ingest/providers/mod.rs
pub mod api;
pub mod web;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use crate::config::{RequestConfig, Target, TargetKind};
use crate::error::{MonitorError, Result};
use crate::ingest::types::Fetcher;
use crate::model::RawRecord;

/// HTTP-backed fetcher: one shared client, dispatch on target kind.
/// Proxies come from HTTP_PROXY / HTTPS_PROXY through reqwest's defaults.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(cfg: &RequestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(build_headers(cfg)?)
            .build()
            .map_err(|e| MonitorError::Configuration(format!("http client: {e}")))?;
        Ok(Self { client })
    }
}

fn build_headers(cfg: &RequestConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (k, v) in &cfg.headers {
        let name = HeaderName::from_bytes(k.as_bytes())
            .map_err(|e| MonitorError::Configuration(format!("header name {k:?}: {e}")))?;
        let value = HeaderValue::from_str(v)
            .map_err(|e| MonitorError::Configuration(format!("header value for {k}: {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &Target) -> Result<Vec<RawRecord>> {
        match &target.kind {
            TargetKind::Api {
                api_url,
                tag_id,
                article_type,
                page_index,
                page_size,
            } => {
                api::fetch(
                    &self.client,
                    api_url,
                    tag_id,
                    article_type,
                    *page_index,
                    *page_size,
                )
                .await
            }
            TargetKind::Web { url } => web::fetch(&self.client, url).await,
        }
    }
}
