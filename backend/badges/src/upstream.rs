//! Upstream metrics provider: a single JSON endpoint fetched over HTTP.
//!
//! The provider is unreliable: it may time out, answer with HTML, or return
//! a well-formed body carrying an `error` field.  Every one of those cases
//! is reported as an `Err` so the cache can fall back uniformly.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::{BadgeError, Result};
use crate::metrics::CampaignMetrics;

/// Anything that can produce a fresh metrics snapshot.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self) -> Result<CampaignMetrics>;
}

// ─────────────────────────────────────────────────────────
// Response shape
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MetricsPayload {
    #[serde(rename = "amountRaised")]
    pub amount_raised: Option<f64>,
    pub target: Option<f64>,
    #[serde(rename = "donationCount")]
    pub donation_count: Option<f64>,
    /// Present (with any non-null value) when the provider failed.
    pub error: Option<Value>,
}

/// Parse an upstream body into normalised metrics.
pub fn parse_payload(body: &str) -> Result<CampaignMetrics> {
    let payload: MetricsPayload = serde_json::from_str(body)?;

    if let Some(err) = payload.error.filter(|e| !e.is_null()) {
        let message = match err {
            Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(BadgeError::Upstream(message));
    }

    Ok(CampaignMetrics::new(
        payload.amount_raised,
        payload.target,
        payload.donation_count,
    ))
}

// ─────────────────────────────────────────────────────────
// HTTP source
// ─────────────────────────────────────────────────────────

/// Fetches metrics with one GET per call. Retries are left to the cache's
/// refresh cadence; the request timeout is configured on the shared client.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricsSource for HttpSource {
    async fn fetch(&self) -> Result<CampaignMetrics> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(BadgeError::Upstream(format!("status {status}")));
        }

        let metrics = parse_payload(&body)?;
        debug!(
            "Fetched metrics: raised={} target={} donations={}",
            metrics.amount_raised, metrics.target, metrics.donation_count
        );
        Ok(metrics)
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
