// src/authorizer/token.rs

//! Unverified inspection of the bearer credential: header parsing and the
//! algorithm gate. Nothing here checks a signature.

use crate::error::AuthError;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use sha2::{Digest, Sha256};

const BEARER_PREFIX: &str = "bearer ";

/// The decoded first segment of a JWT.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenHeader {
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

// `alg` is optional here so that a missing field is reported as a malformed
// token rather than a generic JSON error.
#[derive(Deserialize)]
struct RawHeader {
    alg: Option<String>,
    kid: Option<String>,
    typ: Option<String>,
}

/// Pulls the token out of a raw `Authorization` header value.
pub fn extract_token(raw_header: Option<&str>) -> Result<&str, AuthError> {
    let raw_header = match raw_header {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingHeader),
    };

    let has_prefix = raw_header
        .get(..BEARER_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BEARER_PREFIX));
    if !has_prefix {
        return Err(AuthError::MalformedHeader);
    }

    let token = &raw_header[BEARER_PREFIX.len()..];
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

/// Decodes the JWT header segment without verifying anything.
pub fn decode_header(token: &str) -> Result<TokenHeader, AuthError> {
    let mut segments = token.split('.');
    let (Some(header_segment), Some(_), Some(_), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::MalformedToken("expected three segments".to_string()));
    };

    let bytes = base64_url::decode(header_segment)
        .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {}", e)))?;
    let raw: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("header is not JSON: {}", e)))?;
    let alg = raw
        .alg
        .ok_or_else(|| AuthError::MalformedToken("header has no 'alg'".to_string()))?;

    Ok(TokenHeader {
        alg,
        kid: raw.kid,
        typ: raw.typ,
    })
}

/// Rejects every algorithm except the trusted one.
///
/// The comparison is on the exact name, so `none`, `HS256` and lower-cased
/// spellings never get through.
pub fn check_algorithm(header: &TokenHeader, trusted: Algorithm) -> Result<(), AuthError> {
    if header.alg == format!("{:?}", trusted) {
        Ok(())
    } else {
        Err(AuthError::UnsupportedAlgorithm(header.alg.clone()))
    }
}

/// Short, non-reversible identifier for a token in log lines.
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..6].iter().map(|b| format!("{:02x}", b)).collect()
}
