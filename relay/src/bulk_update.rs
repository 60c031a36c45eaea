use crate::metrics_defs::{UPSTREAM_UPDATE_DURATION, UPSTREAM_UPDATES};
use crate::upstream::{GithubClient, UpstreamError};
use shared::protocol::VisibilityRequest;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};

#[derive(thiserror::Error, Debug)]
pub enum BulkUpdateError {
    /// First failure observed. Other updates of the batch may still be
    /// running or may already have been applied.
    #[error("{source}")]
    Upstream {
        repo: String,
        #[source]
        source: UpstreamError,
    },

    #[error("update task failed: {0}")]
    Task(#[from] JoinError),
}

/// Apply the requested visibility to every listed repository.
///
/// One upstream call per repository, all started at once. Returns as soon as
/// every call succeeded or on the first failure; in the failure case the
/// outstanding calls are detached, not cancelled, so they keep applying
/// their changes. Nothing is rolled back.
pub async fn update_visibility(
    client: &GithubClient,
    request: VisibilityRequest,
) -> Result<usize, BulkUpdateError> {
    let VisibilityRequest {
        username,
        token,
        repos,
        make_private,
    } = request;

    let owner: Arc<str> = username.into();
    let token = Arc::new(token);
    let mut join_set = JoinSet::new();

    for repo in repos {
        let client = client.clone();
        let owner = owner.clone();
        let token = token.clone();

        join_set.spawn(async move {
            let started = Instant::now();
            let result = client
                .set_visibility(&owner, &repo, &token, make_private)
                .await;
            histogram!(UPSTREAM_UPDATE_DURATION).record(started.elapsed().as_secs_f64());

            match &result {
                Ok(()) => {
                    counter!(UPSTREAM_UPDATES, "outcome" => "success").increment(1);
                    tracing::debug!(%owner, %repo, make_private, "visibility updated");
                }
                Err(e) => {
                    counter!(UPSTREAM_UPDATES, "outcome" => "failure").increment(1);
                    tracing::warn!(%owner, %repo, error = %e, "visibility update failed");
                }
            }

            (repo, result)
        });
    }

    let total = join_set.len();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((_, Ok(()))) => {}
            Ok((repo, Err(source))) => {
                join_set.detach_all();
                return Err(BulkUpdateError::Upstream { repo, source });
            }
            Err(e) => {
                join_set.detach_all();
                return Err(BulkUpdateError::Task(e));
            }
        }
    }

    Ok(total)
}
