//! Middleware for logging requests and responses.

use axum::{
    extract::Request,
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::Error;

/// Bodies longer than this many bytes are truncated in the `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Session cookies are redacted from the logged headers.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("could not read request body: {error}");
            return Error::InvalidRequest("could not read the request body".to_owned())
                .into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);

    tracing::info!(
        "Received request: {} {}\nheaders: {:#?}\nbody: {}",
        parts.method,
        parts.uri,
        redact_cookies(&parts.headers),
        truncate(&body_text)
    );
    if body_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full request body: {body_text:?}");
    }

    let request = Request::from_parts(parts, body_bytes.into());
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("could not read response body: {error}");
            return Error::ResponseBodyError(error.to_string()).into_response();
        }
    };
    let body_text = String::from_utf8_lossy(&body_bytes);

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}\nbody: {}",
        parts.status,
        redact_cookies(&parts.headers),
        truncate(&body_text)
    );
    if body_text.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full response body: {body_text:?}");
    }

    Response::from_parts(parts, body_bytes.into())
}

/// A copy of `headers` with the cookie values replaced.
fn redact_cookies(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    for name in [COOKIE, SET_COOKIE] {
        if headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static("********"));
        }
    }

    headers
}

fn truncate(body: &str) -> String {
    if body.len() <= LOG_BODY_LENGTH_LIMIT {
        return format!("{body:?}");
    }

    let mut end = LOG_BODY_LENGTH_LIMIT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }

    format!("{:?}...", &body[..end])
}
