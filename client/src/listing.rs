use crate::credential::Credential;
use crate::errors::ClientError;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, LINK};
use serde::Deserialize;
use url::Url;

pub const PER_PAGE: u32 = 20;
pub const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
pub const USER_AGENT: &str = concat!("repovis-client/", env!("CARGO_PKG_VERSION"));

/// One page of the authenticated user's repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPage {
    pub names: Vec<String>,
    pub total_pages: u32,
}

/// Source of repository listings.
#[async_trait]
pub trait RepoSource: Send + Sync {
    async fn fetch_page(&self, credential: &Credential, page: u32)
    -> Result<RepoPage, ClientError>;
}

#[derive(Deserialize)]
struct RepoSummary {
    name: String,
}

/// Lists repositories straight from the upstream API, bypassing the relay.
pub struct GithubRepoSource {
    client: reqwest::Client,
    api_url: Url,
}

impl GithubRepoSource {
    pub fn new(api_url: Url) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(GithubRepoSource { client, api_url })
    }

    fn page_url(&self, page: u32) -> Result<Url, ClientError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.api_url.to_string()))?
            .pop_if_empty()
            .extend(["user", "repos"]);
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}

#[async_trait]
impl RepoSource for GithubRepoSource {
    async fn fetch_page(
        &self,
        credential: &Credential,
        page: u32,
    ) -> Result<RepoPage, ClientError> {
        let url = self.page_url(page)?;
        tracing::debug!(%url, "fetching repositories");

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.token.expose())
            .header(ACCEPT, GITHUB_ACCEPT)
            .send()
            .await?
            .error_for_status()?;

        let total_pages = last_page(
            response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok()),
        );
        let repos: Vec<RepoSummary> = response.json().await?;

        Ok(RepoPage {
            names: repos.into_iter().map(|r| r.name).collect(),
            total_pages,
        })
    }
}

/// Number of the last page advertised by a `Link` header.
///
/// Looks for the entry whose `rel` includes `last` and reads the `page` query
/// parameter of its target. Anything missing or unparsable means one page.
pub fn last_page(link_header: Option<&str>) -> u32 {
    link_header
        .and_then(|header| header.split(',').find_map(last_link_page))
        .filter(|&page| page >= 1)
        .unwrap_or(1)
}

fn last_link_page(entry: &str) -> Option<u32> {
    let (target, params) = entry.split_once(';')?;

    let is_last = params.split(';').any(|param| {
        param
            .trim()
            .strip_prefix("rel=")
            .is_some_and(|rel| rel.trim_matches('"').split_whitespace().any(|r| r == "last"))
    });
    if !is_last {
        return None;
    }

    let target = target.trim().strip_prefix('<')?.strip_suffix('>')?;
    let url = Url::parse(target).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
}
