//! Configuration loading and representation.
//!
//! Values come from `SCRIBEFLOW_*` environment variables; anything unset
//! falls back to its default.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::types::RetryPolicy;

pub const BIND_ADDR: &str = "SCRIBEFLOW_BIND_ADDR";
pub const ASR_BASE_URL: &str = "SCRIBEFLOW_ASR_BASE_URL";
pub const ASR_TIMEOUT_MS: &str = "SCRIBEFLOW_ASR_TIMEOUT_MS";
pub const MAX_RETRIES: &str = "SCRIBEFLOW_MAX_RETRIES";
pub const BACKOFF_BASE_MS: &str = "SCRIBEFLOW_BACKOFF_BASE_MS";
pub const BACKOFF_MAX_MS: &str = "SCRIBEFLOW_BACKOFF_MAX_MS";

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process configuration for the API server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub asr_base_url: String,
    pub asr_timeout: Duration,
    pub retry_policy: RetryPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            asr_base_url: "http://localhost:3001".to_string(),
            asr_timeout: Duration::from_secs(30),
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_or(&lookup, BIND_ADDR, defaults.bind_addr)?;
        let asr_base_url = match lookup(ASR_BASE_URL) {
            Some(url) if url.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    key: ASR_BASE_URL,
                    value: url,
                    reason: "must not be blank".to_string(),
                });
            }
            Some(url) => url.trim().to_string(),
            None => defaults.asr_base_url,
        };
        let asr_timeout = Duration::from_millis(parse_or(
            &lookup,
            ASR_TIMEOUT_MS,
            defaults.asr_timeout.as_millis() as u64,
        )?);

        let policy = defaults.retry_policy;
        let retry_policy = RetryPolicy {
            max_retries: parse_or(&lookup, MAX_RETRIES, policy.max_retries)?,
            base_delay: Duration::from_millis(parse_or(
                &lookup,
                BACKOFF_BASE_MS,
                policy.base_delay.as_millis() as u64,
            )?),
            max_delay: Duration::from_millis(parse_or(
                &lookup,
                BACKOFF_MAX_MS,
                policy.max_delay.as_millis() as u64,
            )?),
            strategy: policy.strategy,
        };

        Ok(Self {
            bind_addr,
            asr_base_url,
            asr_timeout,
            retry_policy,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.asr_base_url, "http://localhost:3001");
        assert_eq!(cfg.retry_policy, RetryPolicy::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            (BIND_ADDR, "127.0.0.1:8080"),
            (ASR_BASE_URL, " http://asr:9000 "),
            (ASR_TIMEOUT_MS, "1500"),
            (MAX_RETRIES, "5"),
            (BACKOFF_BASE_MS, "25"),
            (BACKOFF_MAX_MS, "1000"),
        ]))
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.asr_base_url, "http://asr:9000");
        assert_eq!(cfg.asr_timeout, Duration::from_millis(1500));
        assert_eq!(cfg.retry_policy.max_retries, 5);
        assert_eq!(cfg.retry_policy.base_delay, Duration::from_millis(25));
        assert_eq!(cfg.retry_policy.max_delay, Duration::from_millis(1000));
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = AppConfig::from_lookup(lookup_from(&[(MAX_RETRIES, "three")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: MAX_RETRIES, .. }));

        let err = AppConfig::from_lookup(lookup_from(&[(ASR_BASE_URL, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ASR_BASE_URL, .. }));
    }
}
