//! Configuration types for bulk-geocoder

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// URL fragments used to turn an address into a request URL
///
/// Each request URL is built as `prefix + address + suffix`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Everything before the address (default: OneMap search endpoint)
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Everything after the address (default: OneMap geometry/detail flags)
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            suffix: default_suffix(),
        }
    }
}

/// Main configuration for bulk-geocoder
///
/// Every field has a default, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of requests in flight at once (default: 10)
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Deadline for a single request, including reading the body (default: 1s)
    ///
    /// Serialized as whole milliseconds.
    #[serde(default = "default_request_timeout", with = "duration_ms_serde")]
    pub request_timeout: Duration,

    /// Append-only log of failed URLs (default: "failed_requests.csv")
    #[serde(default = "default_failure_log_path")]
    pub failure_log_path: PathBuf,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request URL fragments
    #[serde(default)]
    pub query: QueryConfig,

    /// Capacity of the progress event broadcast channel (default: 1000)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            concurrency_limit: default_concurrency_limit(),
            request_timeout: default_request_timeout(),
            failure_log_path: default_failure_log_path(),
            user_agent: default_user_agent(),
            query: QueryConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    /// Check the configuration for values the resolver cannot work with
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(Error::config(
                "concurrency_limit",
                "concurrency_limit must be at least 1",
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config(
                "request_timeout",
                "request_timeout must be greater than zero",
            ));
        }

        if self.failure_log_path.as_os_str().is_empty() {
            return Err(Error::config(
                "failure_log_path",
                "failure_log_path must not be empty",
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err(Error::config(
                "event_channel_capacity",
                "event_channel_capacity must be at least 1",
            ));
        }

        // Only the prefix has to stand on its own; the address and suffix are appended verbatim
        let parsed = url::Url::parse(&self.query.prefix).map_err(|e| {
            Error::config(
                "query.prefix",
                format!("query prefix '{}' is not a valid URL: {}", self.query.prefix, e),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(
                "query.prefix",
                format!(
                    "query prefix must use http or https, got '{}'",
                    parsed.scheme()
                ),
            ));
        }

        Ok(())
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}

fn default_concurrency_limit() -> usize {
    10
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(1)
}

fn default_failure_log_path() -> PathBuf {
    PathBuf::from("failed_requests.csv")
}

fn default_user_agent() -> String {
    concat!("bulk-geocoder/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_event_channel_capacity() -> usize {
    1000
}

fn default_prefix() -> String {
    "https://developers.onemap.sg/commonapi/search?searchVal=".to_string()
}

fn default_suffix() -> String {
    "&&returnGeom=Y&getAddrDetails=Y&pageNum=1".to_string()
}

// Duration serialization helper (milliseconds; request timeouts are sub-second in practice)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
