use std::time::Duration;

use scribe_tasks::PollConfig;

use crate::args::Cli;

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a server running on the same
/// machine.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (default: `http://127.0.0.1:8000`).
    pub api_url: String,
    /// Task identity database (default: `sqlite://scribe.db`).
    pub store_url: String,
    pub poll: PollConfig,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Timeout for job submissions, which may upload audio (default: `600`).
    pub submit_timeout_secs: u64,
    pub log_format: LogFormat,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                  |
    /// |---------------------------|--------------------------|
    /// | `SCRIBE_API_URL`          | `http://127.0.0.1:8000`  |
    /// | `SCRIBE_STORE_URL`        | `sqlite://scribe.db`     |
    /// | `SCRIBE_POLL_INTERVAL_MS` | `800`                    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                     |
    /// | `SUBMIT_TIMEOUT_SECS`     | `600`                    |
    /// | `SCRIBE_LOG_FORMAT`       | `text` (or `json`)       |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("SCRIBE_API_URL").unwrap_or_else(|| "http://127.0.0.1:8000".into());
        let store_url = lookup("SCRIBE_STORE_URL").unwrap_or_else(|| "sqlite://scribe.db".into());

        let poll = match lookup("SCRIBE_POLL_INTERVAL_MS") {
            Some(raw) => PollConfig::from_millis(parse_positive(
                "SCRIBE_POLL_INTERVAL_MS",
                &raw,
            )?),
            None => PollConfig::default(),
        };

        let request_timeout_secs = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_positive("REQUEST_TIMEOUT_SECS", &raw)?,
            None => 30,
        };

        let submit_timeout_secs = match lookup("SUBMIT_TIMEOUT_SECS") {
            Some(raw) => parse_positive("SUBMIT_TIMEOUT_SECS", &raw)?,
            None => 600,
        };

        let log_format = match lookup("SCRIBE_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SCRIBE_LOG_FORMAT",
                    value: other.to_string(),
                    expected: "`text` or `json`",
                })
            }
        };

        Ok(Self {
            api_url,
            store_url,
            poll,
            request_timeout_secs,
            submit_timeout_secs,
            log_format,
        })
    }

    /// Apply command-line flags on top of the environment.
    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(api_url) = &cli.api_url {
            self.api_url.clone_from(api_url);
        }
        if let Some(store_url) = &cli.store_url {
            self.store_url.clone_from(store_url);
        }
        if let Some(ms) = cli.poll_interval_ms {
            self.poll = PollConfig::from_millis(ms);
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_string(),
            expected: "a positive integer",
        }),
    }
}
