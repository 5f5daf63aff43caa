// src/authorizer/mod.rs

//! Bearer token authorizer.
//!
//! [`Authorizer::authorize`] turns a raw `Authorization` header into an
//! ALLOW or DENY policy. The steps are:
//!
//! 1. extract the token from the `Bearer` header,
//! 2. decode the (unverified) JWT header,
//! 3. refuse any algorithm but the trusted one,
//! 4. fetch the provider's signing keys,
//! 5. select the key named by `kid`,
//! 6. verify the signature, `exp` and `nbf`.
//!
//! Any failure yields DENY. Errors are logged, never returned.

pub mod client;
pub mod model;
pub mod policy;
pub mod token;
pub mod verify;

pub use client::JwksClient;
pub use policy::{AuthorizerResponse, Effect};
pub use verify::Claims;

use crate::config::AuthorizerConfig;
use crate::error::{AuthError, ConfigError};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// The event delivered to a token authorizer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub authorization_token: Option<String>,
    #[serde(default)]
    pub method_arn: Option<String>,
}

/// Validates bearer tokens against the provider's published keys.
///
/// Create it once and reuse it; it owns the HTTP client.
#[derive(Clone)]
pub struct Authorizer {
    config: AuthorizerConfig,
    jwks_client: JwksClient,
}

impl Authorizer {
    pub fn new(config: AuthorizerConfig) -> Result<Self, ConfigError> {
        let jwks_client = JwksClient::new(&config)?;
        Ok(Self { config, jwks_client })
    }

    /// Handles an authorizer event.
    pub async fn handle(&self, event: &AuthorizerEvent) -> AuthorizerResponse {
        self.authorize(event.authorization_token.as_deref()).await
    }

    /// Maps the outcome of [`Authorizer::verify_token`] to a policy.
    #[instrument(skip_all)]
    pub async fn authorize(&self, raw_header: Option<&str>) -> AuthorizerResponse {
        match self.verify_token(raw_header).await {
            Ok(claims) => {
                info!(principal = %claims.sub, "User was authorized");
                AuthorizerResponse::allow(claims.sub)
            }
            Err(e) => {
                let token = raw_header
                    .and_then(|header| token::extract_token(Some(header)).ok())
                    .map(token::fingerprint);
                warn!(error = %e, token = ?token, "User not authorized");
                AuthorizerResponse::deny()
            }
        }
    }

    /// Runs the full verification flow and returns the token's claims.
    pub async fn verify_token(&self, raw_header: Option<&str>) -> Result<Claims, AuthError> {
        let token = token::extract_token(raw_header)?;
        let header = token::decode_header(token)?;
        token::check_algorithm(&header, self.config.validation.algorithm)?;

        let keys = self.jwks_client.fetch_signing_keys().await?;
        let key = verify::select_key(&keys, &header)?;

        verify::verify_signature(token, key, &self.config.validation)
    }
}
