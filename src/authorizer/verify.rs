// src/authorizer/verify.rs

use super::model::SigningKey;
use super::token::TokenHeader;
use crate::config::ValidationDetails;
use crate::error::AuthError;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The claims decoded from a verified token.
///
/// `sub` becomes the principal of an ALLOW decision. Claims not listed here
/// are kept in `extra`.
///
/// The time claims are whole seconds. A fractional `exp`, `nbf` or `iat` is
/// rejected as [`AuthError::ClaimsInvalid`], the same way `jsonwebtoken`
/// treats it during validation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Picks the first key whose `kid` equals the token's.
pub fn select_key<'a>(
    keys: &'a [SigningKey],
    header: &TokenHeader,
) -> Result<&'a SigningKey, AuthError> {
    let kid = header.kid.as_deref();
    keys.iter()
        .find(|key| Some(key.kid.as_str()) == kid)
        .ok_or_else(|| AuthError::NoMatchingKey(header.kid.clone()))
}

/// Verifies the signature with `key` and checks `exp`, `nbf` and the
/// optional issuer/audience.
pub fn verify_signature(
    token: &str,
    key: &SigningKey,
    details: &ValidationDetails,
) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(details.algorithm);
    validation.leeway = details.leeway.as_secs();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    if let Some(issuer) = &details.issuer {
        validation.set_issuer(&[issuer]);
    }
    match &details.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    decode::<Claims>(token, &key.decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| map_jwt_error(e.into_kind()))
}

fn map_jwt_error(kind: ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidRsaKey(_) | ErrorKind::Crypto(_) => {
            AuthError::InvalidSignature
        }
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::InvalidAlgorithm => {
            AuthError::UnsupportedAlgorithm("algorithm does not match the signing key".to_string())
        }
        ErrorKind::ImmatureSignature => {
            AuthError::ClaimsInvalid("token not yet valid (nbf)".to_string())
        }
        ErrorKind::InvalidIssuer => AuthError::ClaimsInvalid("unexpected issuer".to_string()),
        ErrorKind::InvalidAudience => AuthError::ClaimsInvalid("unexpected audience".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::ClaimsInvalid(format!("missing required claim '{}'", claim))
        }
        ErrorKind::Json(e) => AuthError::ClaimsInvalid(format!("claims do not match: {}", e)),
        ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
            AuthError::MalformedToken("token segments could not be decoded".to_string())
        }
        other => AuthError::ClaimsInvalid(format!("{:?}", other)),
    }
}
