use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_REQUEST_HEADERS, HeaderMap, HeaderValue, ORIGIN, VARY,
};
use std::collections::HashSet;

pub const CORS_REJECTED_MESSAGE: &str = "Not allowed by CORS";

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Outcome of checking a request's `Origin` header against the allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginCheck {
    /// No origin header, e.g. a non-browser caller
    Absent,
    Allowed(HeaderValue),
    Rejected(String),
}

pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
}

impl CorsPolicy {
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CorsPolicy {
            allowed_origins: allowed_origins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn check(&self, headers: &HeaderMap) -> OriginCheck {
        let Some(origin) = headers.get(ORIGIN) else {
            return OriginCheck::Absent;
        };

        match origin.to_str() {
            Ok("") => OriginCheck::Absent,
            Ok(value) if self.allowed_origins.contains(value) => {
                OriginCheck::Allowed(origin.clone())
            }
            Ok(value) => OriginCheck::Rejected(value.to_string()),
            Err(_) => OriginCheck::Rejected(String::from_utf8_lossy(origin.as_bytes()).into()),
        }
    }
}

/// Headers added to every response for an allowed origin.
pub fn apply_response_headers(check: &OriginCheck, headers: &mut HeaderMap) {
    if let OriginCheck::Allowed(origin) = check {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.append(VARY, HeaderValue::from_static("Origin"));
    }
}

/// Headers for a preflight response. Requested headers are reflected back.
pub fn apply_preflight_headers(request_headers: &HeaderMap, headers: &mut HeaderMap) {
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );

    if let Some(requested) = request_headers.get(ACCESS_CONTROL_REQUEST_HEADERS) {
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
        headers.append(
            VARY,
            HeaderValue::from_static("Access-Control-Request-Headers"),
        );
    }
}
