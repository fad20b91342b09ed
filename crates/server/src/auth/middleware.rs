use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tower::{Layer, Service};

use super::{CredentialChecker, Credentials};

/// Value of the `WWW-Authenticate` header on 401 responses.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"cairn\"";

/// Tower layer that gates requests behind HTTP Basic authentication.
///
/// With no checker configured, requests pass through untouched.
#[derive(Clone)]
pub struct AuthLayer {
    checker: Option<Arc<dyn CredentialChecker>>,
}

impl AuthLayer {
    pub fn new(checker: Option<Arc<dyn CredentialChecker>>) -> Self {
        Self { checker }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            checker: self.checker.clone(),
        }
    }
}

/// Tower service that authenticates requests.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    checker: Option<Arc<dyn CredentialChecker>>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let checker = self.checker.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let Some(checker) = checker else {
                return inner.call(req).await;
            };

            let Some(credentials) = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_basic)
            else {
                return Ok(unauthorized("missing authentication credentials"));
            };

            if !checker.check(&credentials) {
                tracing::debug!(username = %credentials.username, "rejected credentials");
                return Ok(unauthorized("invalid credentials"));
            }

            inner.call(req).await
        })
    }
}

/// Parse an `Authorization: Basic <base64(user:pass)>` header value.
pub fn parse_basic(value: &str) -> Option<Credentials> {
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials::new(username, password))
}

fn unauthorized(message: &str) -> Response {
    let body = serde_json::json!({ "error": message });
    let mut response = (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(BASIC_CHALLENGE),
    );
    response
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn parses_basic_header() {
        // "admin:pa:ss" keeps everything after the first colon as password.
        let creds = parse_basic("Basic YWRtaW46cGE6c3M=").unwrap();
        assert_eq!(creds.username, "admin");
        assert_eq!(creds.password.expose_secret(), "pa:ss");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert!(parse_basic("basic YWRtaW46cHc=").is_some());
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(parse_basic("Bearer YWRtaW46cHc=").is_none());
        assert!(parse_basic("Basic !!!not-base64!!!").is_none());
        // "nocolon"
        assert!(parse_basic("Basic bm9jb2xvbg==").is_none());
        assert!(parse_basic("Basic").is_none());
    }
}
