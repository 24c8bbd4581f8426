use crate::sdk::locus::error::LocusError;
use std::{env, num::NonZeroU32, str::FromStr, time::Duration};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where and how to reach the locus service.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Geocode lookups allowed per second.
    pub geocode_per_second: NonZeroU32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            geocode_per_second: NonZeroU32::MIN,
        }
    }
}

impl ServiceConfig {
    /// Reads `LOCUS_API_URL`, `LOCUS_TIMEOUT_SECS` and
    /// `LOCUS_GEOCODE_PER_SECOND`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self, LocusError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, LocusError> {
        let defaults = ServiceConfig::default();
        let base_url = lookup("LOCUS_API_URL").unwrap_or(defaults.base_url);
        let timeout = match parse_var::<u64, _>(&lookup, "LOCUS_TIMEOUT_SECS")? {
            Some(secs) => Duration::from_secs(secs),
            None => defaults.timeout,
        };
        let geocode_per_second = match parse_var::<u32, _>(&lookup, "LOCUS_GEOCODE_PER_SECOND")? {
            Some(n) => NonZeroU32::new(n).ok_or_else(|| {
                LocusError::Config("LOCUS_GEOCODE_PER_SECOND must be at least 1".to_string())
            })?,
            None => defaults.geocode_per_second,
        };
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            geocode_per_second,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

fn parse_var<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Result<Option<T>, LocusError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| LocusError::Config(format!("{} has an invalid value: {:?}", key, raw))),
    }
}
