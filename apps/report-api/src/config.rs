use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::workflow::{ReadinessPolicy, WorkflowPolicy};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub interview_api_url: String,
    pub port: u16,
    pub rust_log: String,
    pub probe_timeout: Duration,
    pub workflow: WorkflowPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = WorkflowPolicy::default();

        Ok(Config {
            interview_api_url: require_env("INTERVIEW_API_URL")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            probe_timeout: Duration::from_secs(optional_env("PROBE_TIMEOUT_SECS", 5)?),
            workflow: WorkflowPolicy {
                readiness: ReadinessPolicy {
                    deadline: nonzero_millis_env(
                        "READINESS_DEADLINE_MS",
                        defaults.readiness.deadline,
                    )?,
                    interval: nonzero_millis_env(
                        "READINESS_INTERVAL_MS",
                        defaults.readiness.interval,
                    )?,
                    settle_delay: millis_env(
                        "READINESS_SETTLE_MS",
                        defaults.readiness.settle_delay,
                    )?,
                },
                max_timeout_retries: optional_env(
                    "MAX_TIMEOUT_RETRIES",
                    defaults.max_timeout_retries,
                )?,
                retry_backoff: millis_env("RETRY_BACKOFF_MS", defaults.retry_backoff)?,
                snapshot_retention: Duration::from_secs(optional_env(
                    "SNAPSHOT_TTL_SECS",
                    defaults.snapshot_retention.as_secs(),
                )?),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn millis_env(key: &str, default: Duration) -> Result<Duration> {
    let millis = optional_env(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

/// Like `millis_env`, but zero is rejected: these bound a polling loop.
fn nonzero_millis_env(key: &str, default: Duration) -> Result<Duration> {
    let value = millis_env(key, default)?;
    if value.is_zero() {
        bail!("{key} must be greater than zero");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_falls_back_to_default() {
        let value: u32 = optional_env("REPORT_API_TEST_UNSET_VALUE", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_optional_env_rejects_non_numeric() {
        std::env::set_var("REPORT_API_TEST_BAD_NUMBER", "soon");
        let result: Result<u32> = optional_env("REPORT_API_TEST_BAD_NUMBER", 2);
        assert!(result.is_err());
    }

    #[test]
    fn test_millis_env_reads_override() {
        std::env::set_var("REPORT_API_TEST_BACKOFF_MS", "1500");
        let backoff = millis_env("REPORT_API_TEST_BACKOFF_MS", Duration::from_secs(5)).unwrap();
        assert_eq!(backoff, Duration::from_millis(1500));
    }

    #[test]
    fn test_zero_polling_interval_is_rejected() {
        std::env::set_var("REPORT_API_TEST_INTERVAL_MS", "0");
        let err = nonzero_millis_env("REPORT_API_TEST_INTERVAL_MS", Duration::from_secs(2))
            .unwrap_err();
        assert!(err.to_string().contains("REPORT_API_TEST_INTERVAL_MS"));
    }

    #[test]
    fn test_nonzero_millis_env_accepts_positive_value() {
        std::env::set_var("REPORT_API_TEST_DEADLINE_MS", "4000");
        let deadline =
            nonzero_millis_env("REPORT_API_TEST_DEADLINE_MS", Duration::from_secs(30)).unwrap();
        assert_eq!(deadline, Duration::from_secs(4));
    }
}
