use crate::credential::Credential;
use crate::listing::RepoSource;
use crate::pagination::Pagination;
use crate::relay_client::VisibilityRelay;
use crate::selection::Selection;
use shared::protocol::{AccessToken, VisibilityRequest};
use std::fmt;

pub const FETCH_FAILED: &str = "Failed to fetch repositories. Please check your credentials.";
pub const UPDATE_SUCCEEDED: &str = "Repositories updated successfully";
pub const UPDATE_FAILED: &str = "Failed to update repositories. Please try again.";

/// One-shot message shown to the user after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success(message) => write!(f, "ok: {message}"),
            Notice::Error(message) => write!(f, "error: {message}"),
        }
    }
}

/// A required form field left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    UsernameRequired,
    TokenRequired,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::UsernameRequired => f.write_str("Username is required"),
            FieldError::TokenRequired => f.write_str("Token is required"),
        }
    }
}

/// State of the repository manager: the credential form, the visible page,
/// the selection and the chosen visibility.
pub struct RepoManager<S, R> {
    source: S,
    relay: R,
    credential: Credential,
    repos: Vec<String>,
    selection: Selection,
    pagination: Pagination,
    make_private: bool,
}

impl<S, R> RepoManager<S, R>
where
    S: RepoSource,
    R: VisibilityRelay,
{
    pub fn new(source: S, relay: R) -> Self {
        RepoManager {
            source,
            relay,
            credential: Credential::default(),
            repos: Vec::new(),
            selection: Selection::new(),
            pagination: Pagination::default(),
            make_private: true,
        }
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.credential.username = username.into();
    }

    pub fn set_token(&mut self, token: AccessToken) {
        self.credential.token = token;
    }

    pub fn set_make_private(&mut self, make_private: bool) {
        self.make_private = make_private;
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn make_private(&self) -> bool {
        self.make_private
    }

    /// Load `page` of the listing.
    ///
    /// Does nothing while username or token is empty. The selection is left
    /// as is. Every failure produces the same notice.
    pub async fn fetch_repositories(&mut self, page: u32) -> Option<Notice> {
        if !self.credential.is_complete() {
            return None;
        }

        match self.source.fetch_page(&self.credential, page).await {
            Ok(listing) => {
                tracing::debug!(page, total_pages = listing.total_pages, "fetched repositories");
                self.repos = listing.names;
                self.pagination.set_current_page(page);
                // The last page carries no rel="last" link, but it is still
                // at least as far as the page just fetched
                self.pagination
                    .set_total_pages(listing.total_pages.max(page));
                None
            }
            Err(e) => {
                tracing::debug!(page, error = %e, "failed to fetch repositories");
                Some(Notice::Error(FETCH_FAILED.to_string()))
            }
        }
    }

    /// Re-fetch the current page.
    pub async fn refresh(&mut self) -> Option<Notice> {
        self.fetch_repositories(self.pagination.current_page()).await
    }

    /// Move to `page` and fetch it.
    pub async fn go_to_page(&mut self, page: u32) -> Option<Notice> {
        self.pagination.set_current_page(page);
        self.fetch_repositories(page).await
    }

    /// Move to the next page. `None` when already on the last page.
    pub async fn next_page(&mut self) -> Option<Option<Notice>> {
        let page = self.pagination.next()?;
        Some(self.go_to_page(page).await)
    }

    /// Move to the previous page. `None` when already on the first page.
    pub async fn previous_page(&mut self) -> Option<Option<Notice>> {
        let page = self.pagination.previous()?;
        Some(self.go_to_page(page).await)
    }

    pub fn toggle(&mut self, name: &str) -> bool {
        self.selection.toggle(name)
    }

    /// Check the form, then send the selection to the relay.
    ///
    /// Form errors are returned without touching the network. The selection
    /// is kept after a successful update.
    pub async fn submit_update(&mut self) -> Result<Notice, Vec<FieldError>> {
        let mut errors = Vec::new();
        if self.credential.username.is_empty() {
            errors.push(FieldError::UsernameRequired);
        }
        if self.credential.token.is_empty() {
            errors.push(FieldError::TokenRequired);
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        let request = VisibilityRequest {
            username: self.credential.username.clone(),
            token: self.credential.token.clone(),
            repos: self.selection.to_vec(),
            make_private: self.make_private,
        };

        match self.relay.update_repos(&request).await {
            Ok(()) => Ok(Notice::Success(UPDATE_SUCCEEDED.to_string())),
            Err(e) => {
                tracing::error!(error = %e, "Failed to update repositories");
                Ok(Notice::Error(UPDATE_FAILED.to_string()))
            }
        }
    }
}
