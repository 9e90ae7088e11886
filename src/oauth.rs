//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Produces the `Authorization` header value for a single outgoing HTTP
//! request. The encoding table, nonce recipe, and header field order are wire
//! format shared with the servers this crate talks to; change nothing here
//! without a matching change on the other side.

use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;
use std::collections::BTreeMap;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";

/// Parameters carrying raw payload data (base64 media blobs) are transmitted
/// in the request body but must never enter the signature base string.
const RAW_PAYLOAD_PARAMS: &[&str] = &["media_data"];

/// Four-part OAuth 1.0a credential tuple.
///
/// The values are opaque; they are never logged (`Debug` redacts them) and
/// never persisted by this crate.
#[derive(Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Percent-encode a key, value, or URL for signing.
///
/// RFC 3986 unreserved characters (`ALPHA / DIGIT / - . _ ~`) stay literal,
/// everything else becomes uppercase `%XX`, and a `%20` produced by space
/// encoding is re-encoded to `%2520`. The double encoding is required by the
/// signing target; a literal `%20` in the input already encodes to `%2520`
/// and is left alone.
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).replace("%20", "%2520")
}

/// Generate a fresh nonce: 32 random bytes, base64-encoded, stripped to
/// `[A-Za-z0-9]`.
///
/// The strip shortens the nonce by however many `+`, `/`, and `=` the
/// encoding produced. That is a quirk of the existing signing scheme and is
/// kept for wire compatibility.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::STANDARD
        .encode(bytes)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Build the `&`-joined parameter string over the signed parameter set.
///
/// `BTreeMap` iteration gives the byte ordering over raw keys the base string
/// requires; raw-payload parameters are dropped here even if a caller slipped
/// one in.
fn parameter_string(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| !RAW_PAYLOAD_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA1 signature over the canonical base string, base64-encoded.
fn signature(
    method: &str,
    base_url: &str,
    params: &BTreeMap<String, String>,
    consumer_secret: &str,
    token_secret: &str,
) -> String {
    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url),
        percent_encode(&parameter_string(params))
    );

    let signing_key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .expect("HMAC-SHA1 accepts keys of any length");
    mac.update(base_string.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Generate an OAuth 1.0a `Authorization` header value.
///
/// `base_url` must carry no query string; everything to be signed (query and
/// body parameters alike) goes in `parameters`. The caller is responsible for
/// transmitting `parameters` exactly as signed; any mismatch fails
/// verification server-side, not here. A fresh nonce and timestamp are
/// sampled per call; nothing is cached between calls.
pub fn generate_auth_header(
    method: &str,
    base_url: &str,
    parameters: &BTreeMap<String, String>,
    credentials: &Credentials,
) -> String {
    generate_auth_header_at(
        method,
        base_url,
        parameters,
        credentials,
        &generate_nonce(),
        Utc::now().timestamp(),
    )
}

/// Deterministic core of [`generate_auth_header`] with pinned nonce and
/// timestamp.
pub(crate) fn generate_auth_header_at(
    method: &str,
    base_url: &str,
    parameters: &BTreeMap<String, String>,
    credentials: &Credentials,
    nonce: &str,
    timestamp: i64,
) -> String {
    let timestamp = timestamp.to_string();

    // Merge caller parameters (minus raw payload fields) with the per-call
    // OAuth set. Duplicated keys resolve in favor of the OAuth set.
    let mut signed_params: BTreeMap<String, String> = parameters
        .iter()
        .filter(|(k, _)| !RAW_PAYLOAD_PARAMS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    signed_params.insert(
        "oauth_consumer_key".into(),
        credentials.consumer_key.clone(),
    );
    signed_params.insert("oauth_nonce".into(), nonce.to_string());
    signed_params.insert("oauth_signature_method".into(), SIGNATURE_METHOD.into());
    signed_params.insert("oauth_timestamp".into(), timestamp.clone());
    signed_params.insert("oauth_token".into(), credentials.access_token.clone());
    signed_params.insert("oauth_version".into(), OAUTH_VERSION.into());

    let oauth_signature = signature(
        method,
        base_url,
        &signed_params,
        &credentials.consumer_secret,
        &credentials.access_token_secret,
    );

    // Fixed field order: some strict servers parse the header positionally.
    let header_params: [(&str, &str); 7] = [
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature", oauth_signature.as_str()),
        ("oauth_signature_method", SIGNATURE_METHOD),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", OAUTH_VERSION),
    ];

    let header = header_params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");

    format!("OAuth {header}")
}
