//! Request signing for the object-storage origin.
//!
//! Canonical-request signing with an HMAC-SHA256 key-derivation chain, in
//! the form S3-compatible stores expect:
//!
//! ```text
//! body ─sha256─▶ content hash ─┐
//! method, path, query, canonical headers, signed headers ─▶ canonical request
//! secret ─hmac(date)─hmac(region)─hmac(service)─hmac(termination)─▶ signing key
//! algorithm, timestamp, scope, sha256(canonical request) ─▶ string to sign
//! hmac(signing key, string to sign) ─hex─▶ signature
//! ```
//!
//! The timestamp is captured once per call; all three emitted header values
//! refer to that same instant.

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::OriginConfig;
use crate::error::{ProxyError, ProxyResult};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const SERVICE: &str = "s3";
pub const TERMINATION: &str = "aws4_request";
pub const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";

pub const X_AMZ_DATE: HeaderName = HeaderName::from_static("x-amz-date");
pub const X_AMZ_CONTENT_SHA256: HeaderName = HeaderName::from_static("x-amz-content-sha256");

/// SHA-256 of the empty string.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// The three header values produced for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResult {
    /// `x-amz-date`, e.g. `20240101T000000Z`.
    pub amz_date: String,
    /// `x-amz-content-sha256`.
    pub content_sha256: String,
    /// `authorization`.
    pub authorization: String,
}

impl SigningResult {
    /// Insert the signing headers, overwriting any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) -> ProxyResult<()> {
        headers.insert(X_AMZ_DATE, header_value(&self.amz_date)?);
        headers.insert(X_AMZ_CONTENT_SHA256, header_value(&self.content_sha256)?);
        headers.insert(
            axum::http::header::AUTHORIZATION,
            header_value(&self.authorization)?,
        );
        Ok(())
    }
}

fn header_value(value: &str) -> ProxyResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ProxyError::Internal(format!("signing produced an invalid header value: {e}")))
}

/// `host[:port]` as it appears in the `Host` header for `url`.
/// Default ports are omitted.
pub fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}

/// Hex SHA-256 of the payload. GET and HEAD always hash the empty body.
pub fn payload_hash(method: &Method, body: &[u8]) -> String {
    if *method == Method::GET || *method == Method::HEAD || body.is_empty() {
        EMPTY_PAYLOAD_SHA256.to_string()
    } else {
        hex::encode(Sha256::digest(body))
    }
}

/// Canonical request string for the fixed signed-header set.
///
/// The URL path is used as already encoded and the query verbatim.
pub fn canonical_request(method: &Method, url: &Url, content_sha256: &str, amz_date: &str) -> String {
    let canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        host_header(url),
        content_sha256,
        amz_date
    );

    [
        method.as_str(),
        url.path(),
        url.query().unwrap_or(""),
        &canonical_headers,
        SIGNED_HEADERS,
        content_sha256,
    ]
    .join("\n")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the signing key. Each stage's output keys the next.
pub fn signing_key(secret: &str, date_stamp: &str, region: &str) -> Vec<u8> {
    let k_secret = format!("AWS4{secret}");
    let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
    hmac_sha256(&k_service, TERMINATION.as_bytes())
}

/// Sign a request at the given instant.
pub fn sign_at(
    method: &Method,
    url: &Url,
    body: &[u8],
    origin: &OriginConfig,
    now: DateTime<Utc>,
) -> SigningResult {
    let date_stamp = now.format("%Y%m%d").to_string();
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

    let content_sha256 = payload_hash(method, body);
    let canonical = canonical_request(method, url, &content_sha256, &amz_date);
    let canonical_hash = hex::encode(Sha256::digest(canonical.as_bytes()));

    let scope = format!("{date_stamp}/{}/{SERVICE}/{TERMINATION}", origin.region);
    let string_to_sign = format!("{ALGORITHM}\n{amz_date}\n{scope}\n{canonical_hash}");

    let key = signing_key(&origin.secret_access_key, &date_stamp, &origin.region);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    let authorization = format!(
        "{ALGORITHM} Credential={}/{scope}, SignedHeaders={SIGNED_HEADERS}, Signature={signature}",
        origin.access_key_id
    );

    SigningResult {
        amz_date,
        content_sha256,
        authorization,
    }
}

/// Sign a request at the current instant.
pub fn sign(method: &Method, url: &Url, body: &[u8], origin: &OriginConfig) -> SigningResult {
    sign_at(method, url, body, origin, Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::config::StorageConfig;

    fn origin() -> OriginConfig {
        OriginConfig::from_storage(&StorageConfig {
            bucket: "assets".into(),
            endpoint: "https://account.r2.example.com".into(),
            region: "auto".into(),
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
            virtual_hosted: false,
        })
        .unwrap()
    }

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn test_hmac_chain_matches_reference_derivation() {
        // Published derivation example (service "iam")
        let k_date = hmac_sha256(b"AWS4wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", b"20120215");
        assert_eq!(
            hex::encode(&k_date),
            "969fbb94feb542b71ede6f87fe4d5fa29c789342b0f407474670f0c2489e0a0d"
        );
        let k_region = hmac_sha256(&k_date, b"us-east-1");
        let k_service = hmac_sha256(&k_region, b"iam");
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        assert_eq!(
            hex::encode(k_signing),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_signing_key_chains_in_order() {
        let k_date = hmac_sha256(b"AWS4secret", b"20240102");
        let k_region = hmac_sha256(&k_date, b"auto");
        let k_service = hmac_sha256(&k_region, b"s3");
        let expected = hmac_sha256(&k_service, b"aws4_request");
        assert_eq!(signing_key("secret", "20240102", "auto"), expected);
    }

    #[test]
    fn test_canonical_request_layout() {
        let url = Url::parse("https://account.r2.example.com/assets/a%20b.txt?x-id=GetObject").unwrap();
        let canonical = canonical_request(&Method::GET, &url, EMPTY_PAYLOAD_SHA256, "20240102T030405Z");
        assert_eq!(
            canonical,
            "GET\n\
             /assets/a%20b.txt\n\
             x-id=GetObject\n\
             host:account.r2.example.com\n\
             x-amz-content-sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855\n\
             x-amz-date:20240102T030405Z\n\
             \n\
             host;x-amz-content-sha256;x-amz-date\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_host_header_keeps_non_default_port() {
        assert_eq!(host_header(&Url::parse("http://127.0.0.1:9000/x").unwrap()), "127.0.0.1:9000");
        assert_eq!(host_header(&Url::parse("https://s3.example:443/x").unwrap()), "s3.example");
    }

    #[test]
    fn test_sign_known_vector() {
        let url = Url::parse("https://account.r2.example.com/assets/video.mp4").unwrap();
        let result = sign_at(&Method::GET, &url, b"", &origin(), instant());

        assert_eq!(result.amz_date, "20240102T030405Z");
        assert_eq!(result.content_sha256, EMPTY_PAYLOAD_SHA256);
        assert_eq!(
            result.authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240102/auto/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, \
             Signature=39bb031d926e7b6a8008ad93e2bcead1d769535f655d39688e1c65a35cbf4403"
        );
    }

    #[test]
    fn test_signing_is_deterministic() {
        let url = Url::parse("https://account.r2.example.com/assets/upload.bin?partNumber=1").unwrap();
        let a = sign_at(&Method::PUT, &url, b"payload", &origin(), instant());
        let b = sign_at(&Method::PUT, &url, b"payload", &origin(), instant());
        assert_eq!(a, b);
    }

    #[test]
    fn test_body_byte_changes_hash_and_signature() {
        let url = Url::parse("https://account.r2.example.com/assets/upload.bin").unwrap();
        let a = sign_at(&Method::PUT, &url, b"payload", &origin(), instant());
        let b = sign_at(&Method::PUT, &url, b"paylOad", &origin(), instant());
        assert_ne!(a.content_sha256, b.content_sha256);
        assert_ne!(a.authorization, b.authorization);
        assert_eq!(
            a.content_sha256,
            "239f59ed55e737c77147cf55ad0c1b030b6d7ee748a7426952f9b852d5a935e5"
        );
    }

    #[test]
    fn test_get_ignores_body_for_hash() {
        assert_eq!(payload_hash(&Method::GET, b"ignored"), EMPTY_PAYLOAD_SHA256);
        assert_eq!(payload_hash(&Method::HEAD, b"ignored"), EMPTY_PAYLOAD_SHA256);
    }

    #[test]
    fn test_apply_inserts_three_headers() {
        let url = Url::parse("https://account.r2.example.com/assets/a.js").unwrap();
        let result = sign_at(&Method::GET, &url, b"", &origin(), instant());

        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static("Bearer client"));
        result.apply(&mut headers).unwrap();

        assert_eq!(headers[X_AMZ_DATE], "20240102T030405Z");
        assert_eq!(headers[X_AMZ_CONTENT_SHA256], EMPTY_PAYLOAD_SHA256);
        assert!(headers[axum::http::header::AUTHORIZATION]
            .to_str()
            .unwrap()
            .starts_with("AWS4-HMAC-SHA256 "));
    }
}
