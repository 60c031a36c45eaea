pub mod app;
pub mod console;
pub mod credential;
pub mod errors;
pub mod listing;
pub mod pagination;
pub mod relay_client;
pub mod selection;
#[cfg(test)]
mod testutils;

pub use app::{Notice, RepoManager};
pub use errors::ClientError;

use console::Console;
use listing::GithubRepoSource;
use relay_client::RelayClient;
use shared::protocol::AccessToken;
use tokio::io::BufReader;
use url::Url;

pub struct ClientConfig {
    pub username: Option<String>,
    pub token: Option<AccessToken>,
    pub relay_url: Url,
    pub github_api_url: Url,
}

/// Run the interactive client on stdin/stdout.
pub async fn run(config: ClientConfig) -> Result<(), ClientError> {
    let mut manager = RepoManager::new(
        GithubRepoSource::new(config.github_api_url)?,
        RelayClient::new(config.relay_url)?,
    );
    if let Some(username) = config.username {
        manager.set_username(username);
    }
    if let Some(token) = config.token {
        manager.set_token(token);
    }

    let mut console = Console::new(
        manager,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    console.run().await
}
