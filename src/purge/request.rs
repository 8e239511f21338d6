//! Purge request validation and payload construction.

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{ProxyError, ProxyResult};

/// A validated purge request.
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeRequest {
    /// Absolute URL to invalidate, parsed.
    pub url: Url,
    /// The URL as sent, trimmed. Forwarded to the CDN unchanged.
    pub raw_url: String,
    /// Extra headers the cached variant was keyed on.
    pub headers: Map<String, Value>,
}

/// Body of the CDN purge-by-file call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgePayload {
    pub files: Vec<PurgeFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgeFile {
    pub url: String,
    pub headers: Map<String, Value>,
}

/// Parse the raw request body into a JSON object.
pub fn parse_body(body: &[u8]) -> ProxyResult<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ProxyError::bad_request("Request body must be a JSON object")),
        Err(_) => Err(ProxyError::bad_request("Invalid JSON body")),
    }
}

/// The `token` field, if it is a string.
pub fn token_field(body: &Map<String, Value>) -> Option<&str> {
    body.get("token").and_then(Value::as_str)
}

/// Whether a caller may purge. With no secret configured every caller may;
/// otherwise the token must match exactly.
pub fn token_authorized(secret: Option<&str>, token: Option<&str>) -> bool {
    match secret {
        None => true,
        Some(secret) => token.is_some_and(|token| constant_time_eq(secret.as_bytes(), token.as_bytes())),
    }
}

/// Compare two byte strings in time independent of where they differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

impl PurgeRequest {
    /// Validate the `url` and `headers` fields of a parsed body.
    pub fn from_body(body: &Map<String, Value>) -> ProxyResult<Self> {
        let raw_url = match body.get("url") {
            Some(Value::String(url)) if !url.trim().is_empty() => url.trim(),
            _ => return Err(ProxyError::bad_request("Missing required field: url")),
        };

        let url = Url::parse(raw_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base() && url.host_str().is_some())
            .ok_or_else(|| ProxyError::bad_request(format!("Invalid url: {raw_url}")))?;

        let headers = match body.get("headers") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(headers)) => headers.clone(),
            Some(_) => return Err(ProxyError::bad_request("headers must be a JSON object")),
        };

        Ok(Self {
            url,
            raw_url: raw_url.to_string(),
            headers,
        })
    }

    /// `origin` for the cache key: the caller's `origin` header (any case)
    /// if it is a string, else the URL's own origin.
    pub fn derived_origin(&self) -> String {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("origin"))
            .and_then(|(_, value)| value.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| self.url.origin().ascii_serialization())
    }

    /// Build the outbound payload. Caller headers are merged as given;
    /// the result carries exactly one `origin` entry.
    pub fn payload(&self) -> PurgePayload {
        let mut headers = Map::new();
        headers.insert("origin".to_string(), Value::String(self.derived_origin()));
        for (name, value) in &self.headers {
            if !name.eq_ignore_ascii_case("origin") {
                headers.insert(name.clone(), value.clone());
            }
        }

        PurgePayload {
            files: vec![PurgeFile {
                url: self.raw_url.clone(),
                headers,
            }],
        }
    }
}
