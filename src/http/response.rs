//! Client-facing response construction.
//!
//! # Responsibilities
//! - Turn a storage response into the client response, streaming the body
//! - Drop hop-by-hop headers before the response policy runs
//! - Build preflight and HTTPS-upgrade responses
//!
//! # Design Decisions
//! - Bodies are never buffered whole; memory is bounded by chunk size
//! - HEAD responses keep the origin's headers with an empty body

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::TryStreamExt;
use url::Url;

use crate::cors::CorsGrant;
use crate::error::{ProxyError, ProxyResult};
use crate::policy::ResponsePolicy;
use crate::security::headers::strip_hop_by_hop;

/// Rewrite an upstream response under `policy` and stream it to the client.
pub fn into_client_response(
    upstream: reqwest::Response,
    policy: &ResponsePolicy,
    method: &Method,
) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_by_hop(&mut headers);
    policy.apply(&mut headers);

    let body = if *method == Method::HEAD {
        Body::empty()
    } else {
        let stream = upstream
            .bytes_stream()
            .inspect_err(|e| tracing::warn!(error = %e, "Storage body stream failed"));
        Body::from_stream(stream)
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

/// `204 No Content` answer to an `OPTIONS` request.
pub fn preflight_response(grant: Option<&CorsGrant>) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Some(grant) = grant {
        grant.apply(response.headers_mut());
    }
    response
}

/// `301` to the HTTPS form of `url`.
pub fn https_redirect(url: &Url) -> ProxyResult<Response> {
    let location = HeaderValue::from_str(url.as_str())
        .map_err(|e| ProxyError::Internal(format!("redirect location not a header value: {e}")))?;

    let mut response = StatusCode::MOVED_PERMANENTLY.into_response();
    response.headers_mut().insert(header::LOCATION, location);
    Ok(response)
}
