use crate::errors::ClientError;
use async_trait::async_trait;
use shared::protocol::VisibilityRequest;
use url::Url;

/// Default relay base URL, taken from `REPOVIS_RELAY_URL` at build time when
/// it is set.
pub const DEFAULT_RELAY_URL: &str = match option_env!("REPOVIS_RELAY_URL") {
    Some(url) => url,
    None => "http://localhost:3001",
};

/// Destination for bulk visibility updates.
#[async_trait]
pub trait VisibilityRelay: Send + Sync {
    async fn update_repos(&self, request: &VisibilityRequest) -> Result<(), ClientError>;
}

pub struct RelayClient {
    client: reqwest::Client,
    update_url: Url,
}

impl RelayClient {
    pub fn new(relay_url: Url) -> Result<Self, ClientError> {
        let mut update_url = relay_url.clone();
        update_url
            .path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(relay_url.to_string()))?
            .pop_if_empty()
            .push("update-repos");

        Ok(RelayClient {
            client: reqwest::Client::new(),
            update_url,
        })
    }
}

#[async_trait]
impl VisibilityRelay for RelayClient {
    async fn update_repos(&self, request: &VisibilityRequest) -> Result<(), ClientError> {
        let response = self
            .client
            .post(self.update_url.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Relay { status, message })
    }
}
