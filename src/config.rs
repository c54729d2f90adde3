use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::schedule::ScheduleResolver;
use crate::service::FeedSettings;

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub database_path: PathBuf,
    pub venues_path: PathBuf,
    pub bind_addr: String,
    pub timezone: Tz,
    /// 0 = unbounded fan-out
    pub max_concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            database_path: PathBuf::from("venues.db"),
            venues_path: PathBuf::from("venues.json"),
            bind_addr: "0.0.0.0:3000".to_string(),
            timezone: Tz::UTC,
            max_concurrency: 16,
            request_timeout: Duration::from_millis(10_000),
        }
    }
}

impl FeedConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (environment, map in tests)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = FeedConfig::default();

        let database_path = lookup("FEED_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let venues_path = lookup("FEED_VENUES_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.venues_path);

        let bind_addr = lookup("FEED_BIND_ADDR").unwrap_or(defaults.bind_addr);

        let timezone = match lookup("FEED_TIMEZONE") {
            Some(raw) => Tz::from_str(raw.trim()).map_err(|_| {
                anyhow!(
                    "Invalid FEED_TIMEZONE: {} (expected IANA tz like America/New_York)",
                    raw
                )
            })?,
            None => defaults.timezone,
        };

        let max_concurrency = parse_usize(&lookup, "FEED_MAX_CONCURRENCY", defaults.max_concurrency)?;

        let timeout_ms = parse_usize(&lookup, "FEED_REQUEST_TIMEOUT_MS", 10_000)?;
        if timeout_ms == 0 {
            return Err(anyhow!("Invalid FEED_REQUEST_TIMEOUT_MS: must be greater than 0"));
        }

        Ok(Self {
            database_path,
            venues_path,
            bind_addr,
            timezone,
            max_concurrency,
            request_timeout: Duration::from_millis(timeout_ms as u64),
        })
    }

    pub fn feed_settings(&self) -> FeedSettings {
        FeedSettings {
            schedule: ScheduleResolver::new(self.timezone),
            max_concurrency: self.max_concurrency,
            request_timeout: self.request_timeout,
        }
    }
}

fn parse_usize<F>(lookup: &F, key: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid {key}: {raw} (expected integer)")),
        None => Ok(default),
    }
}
