use crate::config::ConfigError;
use std::io;

/// Errors that stop the relay from starting or serving
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
