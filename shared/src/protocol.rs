//! Wire types shared by the relay and its client.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A personal access token.
///
/// The value only ever travels inside a single request. `Debug` and `Display`
/// never print it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Body of `POST /update-repos`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    pub username: String,
    pub token: AccessToken,
    pub repos: Vec<String>,
    pub make_private: bool,
}

impl VisibilityRequest {
    /// Deserialize and shape-check a request body.
    ///
    /// Only the shape is checked: `username` and `token` must be non-empty
    /// strings, `repos` an array of strings and `makePrivate` a boolean.
    pub fn from_json(body: &[u8]) -> Result<Self, InvalidRequest> {
        let request: VisibilityRequest =
            serde_json::from_slice(body).map_err(|e| InvalidRequest(e.to_string()))?;

        if request.username.is_empty() {
            return Err(InvalidRequest("username must not be empty".into()));
        }
        if request.token.is_empty() {
            return Err(InvalidRequest("token must not be empty".into()));
        }

        Ok(request)
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("invalid request: {0}")]
pub struct InvalidRequest(pub String);
