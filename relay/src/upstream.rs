use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use shared::protocol::AccessToken;
use url::Url;

pub const USER_AGENT: &str = concat!("repovis-relay/", env!("CARGO_PKG_VERSION"));
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
    /// The upstream answered with a non-success status
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("cannot build repository URL from base {0}")]
    InvalidBaseUrl(String),
}

#[derive(Serialize)]
struct VisibilityPatch {
    private: bool,
}

#[derive(Deserialize)]
struct GithubErrorBody {
    message: Option<String>,
}

/// Client for the upstream repository API.
#[derive(Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_url: Url,
}

impl GithubClient {
    pub fn new(api_url: Url) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(GithubClient { client, api_url })
    }

    /// `{api}/repos/{owner}/{repo}`, with both names percent-encoded as path
    /// segments.
    pub fn repo_url(&self, owner: &str, repo: &str) -> Result<Url, UpstreamError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["repos", owner, repo]);
        Ok(url)
    }

    /// Set the visibility of `owner/repo`, authenticating with `token`.
    pub async fn set_visibility(
        &self,
        owner: &str,
        repo: &str,
        token: &AccessToken,
        make_private: bool,
    ) -> Result<(), UpstreamError> {
        let url = self.repo_url(owner, repo)?;

        let response = self
            .client
            .patch(url)
            .bearer_auth(token.expose())
            .header(ACCEPT, GITHUB_ACCEPT)
            .json(&VisibilityPatch {
                private: make_private,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await.unwrap_or_default();
        Err(UpstreamError::Rejected {
            status,
            message: error_message(status, &body),
        })
    }
}

/// The upstream's own `message` if the body carries one, otherwise a message
/// naming the status code.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<GithubErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()))
}
