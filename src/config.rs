//! Configuration module for the roster client.
//!
//! Values are layered: built-in defaults, then `roster.toml` in the working
//! directory (if present), then `ROSTER_*` environment variables.

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fundu::{DurationParser, TimeUnit};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

pub const CONFIG_FILE: &str = "roster.toml";
pub const ENV_PREFIX: &str = "ROSTER_";

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    /// Root of the REST backend, e.g. `http://localhost:8080/api`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Bearer token sent with every request; absent means anonymous
    #[serde(default)]
    pub api_token: Option<String>,
    /// Login name shown in logs alongside the token
    #[serde(default)]
    pub api_user: Option<String>,
    /// Log level for the crate's own targets
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Accepts `"10s"`, `"1500ms"`, `"1m"` or a bare number of seconds
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub request_timeout: Duration,
    /// Requests slower than this are logged at warn level
    #[serde(
        default = "default_slow_request_threshold",
        deserialize_with = "deserialize_duration"
    )]
    pub slow_request_threshold: Duration,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            api_user: None,
            log_level: default_log_level(),
            request_timeout: default_request_timeout(),
            slow_request_threshold: default_slow_request_threshold(),
            page_size: default_page_size(),
        }
    }
}

impl Config {
    /// Load from `roster.toml` and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment(CONFIG_FILE).extract()
    }

    pub fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}

fn default_api_base_url() -> String {
    "http://localhost:8080/api".to_owned()
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_slow_request_threshold() -> Duration {
    Duration::from_secs(2)
}

fn default_page_size() -> u32 {
    crate::paging::DEFAULT_PAGE_SIZE
}

fn duration_parser() -> DurationParser<'static> {
    DurationParser::builder()
        .time_units(&[TimeUnit::MilliSecond, TimeUnit::Second, TimeUnit::Minute])
        .allow_time_unit_delimiter()
        .disable_exponent()
        .disable_infinity()
        .build()
}

/// Parse a human duration string; a bare number is seconds.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let parsed = duration_parser()
        .parse(value.trim())
        .map_err(|e| format!("invalid duration {value:?}: {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration {value:?}: {e}"))
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct DurationVisitor;

    impl Visitor<'_> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a duration string like \"10s\" or a number of seconds")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Duration, E> {
            u64::try_from(value)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("duration cannot be negative: {value}")))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
            parse_duration(value).map_err(E::custom)
        }
    }

    deserializer.deserialize_any(DurationVisitor)
}
