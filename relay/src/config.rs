use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("invalid value {value:?} for {var}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("upstream URL must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("rate limit must allow at least one request in a non-empty window")]
    InvalidRateLimit,
}

/// Relay configuration
///
/// Every field has a default, so an empty config section is valid. Environment
/// variables are layered on top with [`Config::apply_env`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for the relay API
    pub listener: Listener,
    /// Optional listener for `/health` and `/ready`
    pub admin_listener: Option<Listener>,
    /// Origins allowed to call the relay. Requests without an origin are
    /// always allowed.
    pub allowed_origins: Vec<String>,
    /// Base URL of the upstream repository API
    pub github_api_url: Url,
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            admin_listener: None,
            allowed_origins: Vec::new(),
            github_api_url: Url::parse(DEFAULT_GITHUB_API_URL).expect("default URL is valid"),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Override fields from environment variables.
    ///
    /// Recognized: `HOST`, `PORT`, `ADMIN_PORT`, `ALLOWED_ORIGINS`,
    /// `GITHUB_API_URL`, `RATE_LIMIT_MAX` and `RATE_LIMIT_WINDOW_SECS`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("HOST") {
            self.listener.host = host;
        }
        if let Some(port) = var("PORT") {
            self.listener.port = parse_number("PORT", &port)?;
        }
        if let Some(port) = var("ADMIN_PORT") {
            self.admin_listener = Some(Listener {
                host: self.listener.host.clone(),
                port: parse_number("ADMIN_PORT", &port)?,
            });
        }
        if let Some(origins) = var("ALLOWED_ORIGINS") {
            self.allowed_origins = parse_origins(&origins);
        }
        if let Some(url) = var("GITHUB_API_URL") {
            self.github_api_url = Url::parse(&url)?;
        }
        if let Some(max) = var("RATE_LIMIT_MAX") {
            self.rate_limit.max_requests = parse_number("RATE_LIMIT_MAX", &max)?;
        }
        if let Some(secs) = var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECS", &secs)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.listener.validate()?;
        if let Some(admin) = &self.admin_listener {
            admin.validate()?;
        }

        match self.github_api_url.scheme() {
            "http" | "https" => {}
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        }

        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            return Err(ConfigError::InvalidRateLimit);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3001,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests allowed per client within one window
    pub max_requests: u64,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        var,
        value: value.to_string(),
    })
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
