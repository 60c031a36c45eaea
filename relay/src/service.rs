use crate::bulk_update::{BulkUpdateError, update_visibility};
use crate::config::Config;
use crate::cors::{self, CORS_REJECTED_MESSAGE, CorsPolicy, OriginCheck};
use crate::errors::RelayError;
use crate::metrics_defs::{CORS_REJECTED, REQUESTS};
use crate::rate_limit::{RATE_LIMIT_MESSAGE, RateLimitDecision, RateLimiter};
use crate::upstream::GithubClient;
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::header::HeaderValue;
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use shared::counter;
use shared::http::{PeerAddr, make_error_response, text_response};
use shared::protocol::VisibilityRequest;
use std::convert::Infallible;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub type RelayBody = BoxBody<Bytes, Infallible>;

pub const GREETING: &str = "Welcome to the GitHub Repo Manager API!";
pub const UPDATE_SUCCESS: &str = "Repositories updated successfully";
pub const INVALID_REQUEST: &str = "Invalid request";

const RATE_LIMIT_LIMIT: &str = "x-ratelimit-limit";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

struct Inner {
    github: GithubClient,
    cors: CorsPolicy,
    limiter: RateLimiter,
}

/// The relay's HTTP surface: `GET /` and `POST /update-repos`, behind the
/// rate ceiling and the origin allow-list.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<Inner>,
}

impl RelayService {
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        Ok(RelayService {
            inner: Arc::new(Inner {
                github: GithubClient::new(config.github_api_url.clone())?,
                cors: CorsPolicy::new(config.allowed_origins.iter().cloned()),
                limiter: RateLimiter::from_config(&config.rate_limit),
            }),
        })
    }

    /// Serve one request, logging it once it has a response.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: Body,
        B::Error: Display,
    {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        let response = self.process(req).await;

        let status = response.status();
        counter!(REQUESTS, "status" => status.as_str().to_string()).increment(1);
        tracing::info!(
            %method,
            %path,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "request"
        );

        response
    }

    async fn process<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: Body,
        B::Error: Display,
    {
        let limit = self.inner.limiter.max_requests();
        let remaining = match self.inner.limiter.check(&client_key(&req)) {
            RateLimitDecision::Allowed { remaining } => remaining,
            RateLimitDecision::Limited => {
                let mut response = text_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
                set_rate_limit_headers(&mut response, limit, 0);
                return response;
            }
        };

        let origin = self.inner.cors.check(req.headers());
        let mut response = match &origin {
            OriginCheck::Rejected(value) => {
                counter!(CORS_REJECTED).increment(1);
                tracing::warn!(origin = %value, "origin not allowed");
                text_response(StatusCode::FORBIDDEN, CORS_REJECTED_MESSAGE)
            }
            OriginCheck::Absent | OriginCheck::Allowed(_) => self.route(req).await,
        };

        cors::apply_response_headers(&origin, response.headers_mut());
        set_rate_limit_headers(&mut response, limit, remaining);
        response
    }

    async fn route<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: Body,
        B::Error: Display,
    {
        match (req.method(), req.uri().path()) {
            (&Method::OPTIONS, _) => {
                let mut response = text_response(StatusCode::NO_CONTENT, Bytes::new());
                cors::apply_preflight_headers(req.headers(), response.headers_mut());
                response
            }
            (&Method::GET, "/") => text_response(StatusCode::OK, GREETING),
            (&Method::POST, "/update-repos") => self.update_repos(req).await,
            _ => make_error_response(StatusCode::NOT_FOUND),
        }
    }

    async fn update_repos<B>(&self, req: Request<B>) -> Response<RelayBody>
    where
        B: Body,
        B::Error: Display,
    {
        let body = match req.into_body().collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::error!(error = %e, "Server error: failed to read request body");
                return make_error_response(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        let request = match VisibilityRequest::from_json(&body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting update request");
                return text_response(StatusCode::BAD_REQUEST, INVALID_REQUEST);
            }
        };

        let owner = request.username.clone();
        let make_private = request.make_private;

        match update_visibility(&self.inner.github, request).await {
            Ok(count) => {
                tracing::info!(%owner, repos = count, make_private, "repositories updated");
                text_response(StatusCode::OK, UPDATE_SUCCESS)
            }
            Err(BulkUpdateError::Upstream { repo, source }) => {
                let message = format!("Failed to update repositories: {source}");
                tracing::error!(%owner, %repo, "{message}");
                text_response(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Err(e @ BulkUpdateError::Task(_)) => {
                tracing::error!(error = %e, "Server error");
                make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

impl Service<Request<Incoming>> for RelayService {
    type Response = Response<RelayBody>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let relay = self.clone();
        Box::pin(async move { Ok(catch_panics(async move { relay.handle(req).await }).await) })
    }
}

/// Run `handling` on its own task so a panic becomes a 500 instead of a
/// dropped connection.
async fn catch_panics<F>(handling: F) -> Response<RelayBody>
where
    F: Future<Output = Response<RelayBody>> + Send + 'static,
{
    // A panic while handling surfaces here as a JoinError
    match tokio::spawn(handling).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Server error");
            make_error_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Rate limiting key: the peer IP, or a shared bucket when it is unknown.
fn client_key<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<PeerAddr>()
        .map(|PeerAddr(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_rate_limit_headers(response: &mut Response<RelayBody>, limit: u64, remaining: u64) {
    let headers = response.headers_mut();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
}
