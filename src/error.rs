// src/error.rs

use thiserror::Error;

/// Reasons a bearer token was not accepted.
///
/// Every variant ends in a DENY decision. The message is only ever written to
/// the operational log, never returned to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The authorization header was absent or empty.
    #[error("No authentication header")]
    MissingHeader,

    /// The authorization header is not a `Bearer` credential.
    #[error("Invalid authentication header")]
    MalformedHeader,

    /// The token segments could not be decoded, or the header has no `alg`.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token header declares an algorithm other than the trusted one.
    #[error("JWT header declares an untrusted algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The signing key set could not be retrieved.
    #[error("Failed to fetch the signing key set: {0}")]
    NetworkError(String),

    /// The provider returned no keys at all.
    #[error("The JWKS endpoint did not contain any keys")]
    EmptyKeySet,

    /// The provider returned keys, but none usable for RSA signature checks.
    #[error("The JWKS endpoint did not contain any signature verification keys")]
    NoUsableKeys,

    /// No published key matches the token's `kid`.
    #[error("Unable to find a signing key that matches {0:?}")]
    NoMatchingKey(Option<String>),

    /// The signature does not verify against the selected key.
    #[error("Invalid token signature")]
    InvalidSignature,

    /// The `exp` claim is in the past.
    #[error("Token has expired")]
    Expired,

    /// A claim check other than expiry failed.
    #[error("Invalid token claims: {0}")]
    ClaimsInvalid(String),
}

impl AuthError {
    pub(crate) fn network(e: impl std::fmt::Display) -> Self {
        AuthError::NetworkError(e.to_string())
    }
}

/// Errors raised while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("A required configuration field is missing: {0}")]
    MissingConfiguration(String),

    /// A provided URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Errors from the todo item service and its collaborators.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Todo item {todo_id} not found")]
    NotFound { todo_id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The item store failed.
    #[error("Todo store error: {0}")]
    Store(String),

    /// The upload URL issuer failed.
    #[error("Attachment error: {0}")]
    Attachment(String),
}
