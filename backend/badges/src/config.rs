//! Application configuration loaded from environment variables.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::errors::{BadgeError, Result};

const DEFAULT_CAMPAIGN_END: &str = "2025-12-09T12:00:00Z";

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream endpoint returning `{amountRaised, target, donationCount}` JSON
    pub metrics_url: String,
    /// Port for the HTTP server
    pub api_port: u16,
    /// Maximum age of a cached snapshot before a refresh is attempted
    pub cache_ttl: Duration,
    /// Upper bound on a single upstream request
    pub fetch_timeout: Duration,
    /// Background refresh period; `None` when disabled
    pub refresh_interval: Option<Duration>,
    /// Instant the campaign countdown runs to
    pub campaign_end: DateTime<Utc>,
    /// Leading symbol for currency labels
    pub currency_symbol: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cache_ttl_secs = parse_u64(&lookup, "CACHE_TTL_SECS", 300)?;
        if cache_ttl_secs == 0 {
            return Err(BadgeError::Config("CACHE_TTL_SECS must be positive".to_string()));
        }
        let fetch_timeout_secs = parse_u64(&lookup, "FETCH_TIMEOUT_SECS", 5)?;
        if fetch_timeout_secs == 0 {
            return Err(BadgeError::Config(
                "FETCH_TIMEOUT_SECS must be positive".to_string(),
            ));
        }
        let refresh_interval_secs = parse_u64(&lookup, "REFRESH_INTERVAL_SECS", 0)?;

        let end_raw = lookup("CAMPAIGN_END").unwrap_or_else(|| DEFAULT_CAMPAIGN_END.to_string());
        let campaign_end = DateTime::parse_from_rfc3339(end_raw.trim())
            .map_err(|e| BadgeError::Config(format!("Invalid CAMPAIGN_END: {e}")))?
            .with_timezone(&Utc);

        Ok(Config {
            metrics_url: lookup("METRICS_URL")
                .filter(|url| !url.trim().is_empty())
                .ok_or_else(|| {
                    BadgeError::Config("METRICS_URL environment variable is required".to_string())
                })?,
            api_port: lookup("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|_| BadgeError::Config("Invalid API_PORT".to_string()))?,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
            refresh_interval: (refresh_interval_secs > 0)
                .then(|| Duration::from_secs(refresh_interval_secs)),
            campaign_end,
            currency_symbol: lookup("CURRENCY_SYMBOL").unwrap_or_else(|| "£".to_string()),
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| BadgeError::Config(format!("Invalid {key}"))),
    }
}
