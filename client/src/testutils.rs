use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use shared::protocol::VisibilityRequest;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

const VALID_AUTHORIZATION: &str = "Bearer abc";

#[derive(Default)]
struct MockState {
    repos: Mutex<Vec<String>>,
    authorizations: Mutex<Vec<String>>,
    updates: Mutex<Vec<VisibilityRequest>>,
    update_failure: Mutex<Option<String>>,
}

/// Serves both sides the client talks to: the upstream listing
/// (`GET /user/repos`, accepting only token `abc`) and the relay
/// (`POST /update-repos`).
pub struct MockUpstream {
    port: u16,
    state: Arc<MockState>,
}

impl MockUpstream {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(MockState::default());

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let state = server_state.clone();

                tokio::spawn(async move {
                    let svc = service_fn(move |req| handle(state.clone(), port, req));
                    if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        MockUpstream { port, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port)).unwrap()
    }

    pub fn set_repos(&self, repos: Vec<String>) {
        *self.state.repos.lock().unwrap() = repos;
    }

    /// Make every following update answer 500 with the given upstream message.
    pub fn fail_updates(&self, message: &str) {
        *self.state.update_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }

    pub fn update_requests(&self) -> Vec<VisibilityRequest> {
        self.state.updates.lock().unwrap().clone()
    }
}

async fn handle(
    state: Arc<MockState>,
    port: u16,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/user/repos") => list_repos(&state, port, &req),
        (&Method::POST, "/update-repos") => {
            let body = req.into_body().collect().await.unwrap().to_bytes();
            let request = VisibilityRequest::from_json(&body).unwrap();
            state.updates.lock().unwrap().push(request);

            match state.update_failure.lock().unwrap().as_ref() {
                Some(message) => text(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to update repositories: {message}"),
                ),
                None => text(StatusCode::OK, "Repositories updated successfully".into()),
            }
        }
        _ => text(StatusCode::NOT_FOUND, "Not Found".into()),
    };

    Ok(response)
}

fn list_repos(state: &MockState, port: u16, req: &Request<Incoming>) -> Response<Full<Bytes>> {
    let authorization = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state
        .authorizations
        .lock()
        .unwrap()
        .push(authorization.clone());

    if authorization != VALID_AUTHORIZATION {
        return json(
            StatusCode::UNAUTHORIZED,
            r#"{"message":"Bad credentials"}"#.into(),
            None,
        );
    }

    let query: HashMap<String, String> = Url::parse(&format!("http://localhost{}", req.uri()))
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect();
    let per_page: usize = query["per_page"].parse().unwrap();
    let page: usize = query["page"].parse().unwrap();

    let repos = state.repos.lock().unwrap();
    let last = repos.len().div_ceil(per_page).max(1);
    let names: Vec<&String> = repos.iter().skip((page - 1) * per_page).take(per_page).collect();
    let body = serde_json::to_string(
        &names
            .iter()
            .map(|name| serde_json::json!({ "name": name, "private": false }))
            .collect::<Vec<_>>(),
    )
    .unwrap();

    // Like GitHub, rel="last" is only sent when not on the last page
    let link = (page < last).then(|| {
        let base = format!("http://127.0.0.1:{port}/user/repos?per_page={per_page}");
        format!(
            r#"<{base}&page={}>; rel="next", <{base}&page={last}>; rel="last""#,
            page + 1
        )
    });

    json(StatusCode::OK, body, link)
}

fn json(status: StatusCode, body: String, link: Option<String>) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "application/json");
    if let Some(link) = link {
        builder = builder.header(hyper::header::LINK, link);
    }
    builder.body(Full::new(Bytes::from(body))).unwrap()
}

fn text(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
