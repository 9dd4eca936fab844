use serde::Deserialize;
use std::{env, fs, path::PathBuf, time::Duration};

use crate::domain::Credentials;
use crate::use_cases::BrokerSettings;

// Runtime/server configuration. Credentials come from the environment only.

pub const DEFAULT_BASE_URL: &str = "https://fleet.lagaam.in";
pub const DEFAULT_HTTP_PORT: u16 = 3000;
// Gateway spans at info, dependencies only when they warn.
pub const DEFAULT_LOG_FILTER: &str = "warn,fleet_gateway=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

// Read before anything else so config loading itself is logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

impl LogSettings {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("RUST_LOG")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self { filter, format }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// Broker and vendor client tuning; also the `[broker]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrokerTuning {
    pub max_attempts: u32,
    pub reauth_backoff_ms: u64,
    pub session_ttl_seconds: u64,
    pub request_timeout_ms: u64,
    // Development vendors sometimes sit behind self-signed certificates.
    pub accept_invalid_certs: bool,
}

impl Default for BrokerTuning {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            reauth_backoff_ms: 2000,
            session_ttl_seconds: 60 * 60,
            request_timeout_ms: 10_000,
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    broker: BrokerTuning,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub http_port: u16,
    pub base_url: String,
    pub credentials: Credentials,
    pub tuning: BrokerTuning,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Defaults, then the optional TOML file, then environment overrides.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut tuning = match lookup("FLEET_CONFIG_FILE") {
            Some(path) => load_tuning_file(PathBuf::from(path))?,
            None => BrokerTuning::default(),
        };

        override_parsed(&lookup, "FLEET_MAX_ATTEMPTS", &mut tuning.max_attempts);
        override_parsed(&lookup, "FLEET_REAUTH_BACKOFF_MS", &mut tuning.reauth_backoff_ms);
        override_parsed(&lookup, "FLEET_SESSION_TTL_SECONDS", &mut tuning.session_ttl_seconds);
        override_parsed(&lookup, "FLEET_REQUEST_TIMEOUT_MS", &mut tuning.request_timeout_ms);
        if let Some(value) = lookup("FLEET_ACCEPT_INVALID_CERTS") {
            tuning.accept_invalid_certs = matches!(value.trim(), "1" | "true" | "TRUE" | "True");
        }

        let mut http_port = DEFAULT_HTTP_PORT;
        override_parsed(&lookup, "FLEET_GATEWAY_PORT", &mut http_port);

        Ok(Self {
            http_port,
            base_url: lookup("FLEET_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            credentials: Credentials::new(
                lookup("FLEET_USERNAME").unwrap_or_default(),
                lookup("FLEET_PASSWORD").unwrap_or_default(),
            ),
            tuning,
        })
    }

    pub fn broker_settings(&self) -> BrokerSettings {
        BrokerSettings {
            max_attempts: self.tuning.max_attempts,
            reauth_backoff: Duration::from_millis(self.tuning.reauth_backoff_ms),
            session_ttl: Duration::from_secs(self.tuning.session_ttl_seconds),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.tuning.request_timeout_ms)
    }
}

pub fn parse_tuning(contents: &str) -> Result<BrokerTuning, toml::de::Error> {
    toml::from_str::<ConfigFile>(contents).map(|file| file.broker)
}

fn load_tuning_file(path: PathBuf) -> Result<BrokerTuning, ConfigError> {
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) => return Err(ConfigError::Read { path, source }),
    };
    parse_tuning(&contents).map_err(|source| ConfigError::Parse { path, source })
}

// Invalid values keep the current setting.
fn override_parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) {
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!(key, value = %raw, "ignoring invalid config value"),
    }
}
