use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

#[derive(Default)]
struct MockState {
    visibility: Mutex<HashMap<String, bool>>,
    failing: Mutex<HashSet<String>>,
    authorizations: Mutex<Vec<String>>,
    accept_headers: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

/// In-process stand-in for the upstream repository API.
///
/// `PATCH /repos/{owner}/{repo}` records the requested visibility, unless the
/// repo was registered with [`MockGithub::fail_repo`], in which case it
/// answers 404 `{"message":"Not Found"}`.
pub struct MockGithub {
    port: u16,
    state: Arc<MockState>,
}

impl MockGithub {
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
                    let svc = service_fn(move |req| handle(state.clone(), req));
                    if let Err(err) = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, svc)
                        .await
                    {
                        eprintln!("Error serving connection: {:?}", err);
                    }
                });
            }
        });

        MockGithub { port, state }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}", self.port)).unwrap()
    }

    pub fn fail_repo(&self, repo: &str) {
        self.state.failing.lock().unwrap().insert(repo.to_string());
    }

    /// Visibility recorded for `owner/repo`, `Some(true)` meaning private
    pub fn visibility(&self, full_name: &str) -> Option<bool> {
        self.state.visibility.lock().unwrap().get(full_name).copied()
    }

    pub fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub fn authorizations(&self) -> Vec<String> {
        self.state.authorizations.lock().unwrap().clone()
    }

    pub fn accept_headers(&self) -> Vec<String> {
        self.state.accept_headers.lock().unwrap().clone()
    }

    /// Wait until `full_name` has been updated or the deadline passes.
    pub async fn wait_for_visibility(&self, full_name: &str) -> Option<bool> {
        for _ in 0..50 {
            if let Some(private) = self.visibility(full_name) {
                return Some(private);
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        None
    }
}

async fn handle(
    state: Arc<MockState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    state.calls.fetch_add(1, Ordering::SeqCst);

    let header = |name: hyper::header::HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    state
        .authorizations
        .lock()
        .unwrap()
        .push(header(hyper::header::AUTHORIZATION));
    state
        .accept_headers
        .lock()
        .unwrap()
        .push(header(hyper::header::ACCEPT));

    let segments: Vec<String> = req
        .uri()
        .path()
        .trim_matches('/')
        .split('/')
        .map(String::from)
        .collect();

    let (owner, repo) = match (req.method(), segments.as_slice()) {
        (&Method::PATCH, [repos, owner, repo]) if repos == "repos" => (owner.clone(), repo.clone()),
        _ => return Ok(json_response(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#)),
    };

    if state.failing.lock().unwrap().contains(&repo) {
        return Ok(json_response(StatusCode::NOT_FOUND, r#"{"message":"Not Found"}"#));
    }

    let body = req.into_body().collect().await.unwrap().to_bytes();
    let patch: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let private = patch["private"].as_bool().unwrap();

    state
        .visibility
        .lock()
        .unwrap()
        .insert(format!("{owner}/{repo}"), private);

    Ok(json_response(
        StatusCode::OK,
        &format!(r#"{{"name":"{repo}","private":{private}}}"#),
    ))
}

fn json_response(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(hyper::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
