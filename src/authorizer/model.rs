// src/authorizer/model.rs

use base64::engine::{general_purpose::STANDARD, Engine};
use jsonwebtoken::DecodingKey;
use pem::{EncodeConfig, LineEnding, Pem};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use x509_parser::public_key::PublicKey;

/// A single JSON Web Key (RFC 7517) as published by the provider.
///
/// Every member is optional so that one odd record does not make the whole
/// set unreadable; usability is decided by [`Jwk::is_usable`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Jwk {
    pub kid: Option<String>,
    pub kty: Option<String>,
    #[serde(rename = "use")]
    pub use_purpose: Option<String>,
    pub alg: Option<String>,
    pub x5c: Option<Vec<String>>,
    pub n: Option<String>,
    pub e: Option<String>,
}

/// A JSON Web Key Set.
///
/// Records are kept as raw JSON and decoded one by one with
/// [`Jwk::from_record`], so a record with an unexpected member type only
/// costs that record.
#[derive(Debug, Deserialize)]
pub struct JsonWebKeySet {
    #[serde(default)]
    pub keys: Vec<Value>,
}

impl Jwk {
    /// Decodes one record of a key set.
    pub fn from_record(record: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(record)
    }

    /// Signature-use RSA keys with a `kid` and some public key material.
    pub fn is_usable(&self) -> bool {
        self.use_purpose.as_deref() == Some("sig")
            && self.kty.as_deref() == Some("RSA")
            && self.kid.as_deref().is_some_and(|kid| !kid.is_empty())
            && (self.first_certificate().is_some() || (self.n.is_some() && self.e.is_some()))
    }

    /// The leaf certificate of the `x5c` chain.
    pub fn first_certificate(&self) -> Option<&str> {
        self.x5c.as_deref().and_then(<[String]>::first).map(String::as_str)
    }
}

/// Where a signing key's public half came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeySource {
    /// PEM text of the first `x5c` certificate.
    Certificate(String),
    /// Base64url modulus and exponent.
    Components { n: String, e: String },
}

/// A verification key taken from the key set.
#[derive(Clone)]
pub struct SigningKey {
    pub kid: String,
    pub source: PublicKeySource,
    pub(crate) decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl TryFrom<&Jwk> for SigningKey {
    type Error = String;

    fn try_from(jwk: &Jwk) -> Result<Self, Self::Error> {
        if !jwk.is_usable() {
            return Err("not a usable RSA signature key".to_string());
        }
        let kid = jwk.kid.clone().unwrap_or_default();

        if let Some(cert) = jwk.first_certificate() {
            let pem = certificate_to_pem(cert)?;
            let decoding_key = rsa_key_from_certificate_pem(&pem)?;
            return Ok(SigningKey {
                kid,
                source: PublicKeySource::Certificate(pem),
                decoding_key,
            });
        }

        match (jwk.n.as_deref(), jwk.e.as_deref()) {
            (Some(n), Some(e)) => {
                let decoding_key = DecodingKey::from_rsa_components(n, e)
                    .map_err(|e| format!("invalid RSA components: {}", e))?;
                Ok(SigningKey {
                    kid,
                    source: PublicKeySource::Components {
                        n: n.to_string(),
                        e: e.to_string(),
                    },
                    decoding_key,
                })
            }
            _ => Err("RSA key has neither 'x5c' nor 'n'/'e'".to_string()),
        }
    }
}

/// Wraps a base64 DER certificate from `x5c` in PEM boundaries, 64 characters
/// per line.
pub fn certificate_to_pem(x5c_entry: &str) -> Result<String, String> {
    let der = STANDARD
        .decode(x5c_entry.trim())
        .map_err(|e| format!("x5c certificate is not base64: {}", e))?;
    let pem = Pem::new("CERTIFICATE", der);
    Ok(pem::encode_config(
        &pem,
        EncodeConfig::new().set_line_ending(LineEnding::LF),
    ))
}

/// Extracts the RSA public key from a PEM certificate.
fn rsa_key_from_certificate_pem(pem_text: &str) -> Result<DecodingKey, String> {
    let pem = pem::parse(pem_text).map_err(|e| format!("invalid certificate PEM: {}", e))?;
    let (_, cert) = x509_parser::parse_x509_certificate(pem.contents())
        .map_err(|e| format!("invalid x509 certificate: {}", e))?;

    let spki = cert.public_key();
    match spki.parsed() {
        Ok(PublicKey::RSA(_)) => {}
        _ => return Err("certificate does not carry an RSA public key".to_string()),
    }
    // For rsaEncryption the subjectPublicKey bit string is the PKCS#1 RSAPublicKey.
    Ok(DecodingKey::from_rsa_der(spki.subject_public_key.data.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT_X5C: &str = include_str!("../../tests/fixtures/signing_cert.x5c");
    const CERT_PEM: &str = include_str!("../../tests/fixtures/signing_cert.pem");

    fn rsa_jwk() -> Jwk {
        Jwk {
            kid: Some("key-1".to_string()),
            kty: Some("RSA".to_string()),
            use_purpose: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            x5c: Some(vec![CERT_X5C.to_string()]),
            n: None,
            e: None,
        }
    }

    #[test]
    fn certificate_to_pem_matches_openssl_layout() {
        let pem = certificate_to_pem(CERT_X5C).unwrap();
        assert_eq!(pem, CERT_PEM);
        assert!(pem.lines().all(|line| line.len() <= 64));
    }

    #[test]
    fn certificate_to_pem_rejects_garbage() {
        assert!(certificate_to_pem("not base64 at all!").is_err());
    }

    #[test]
    fn usability_filter() {
        assert!(rsa_jwk().is_usable());

        let with_components = Jwk {
            x5c: None,
            n: Some("AQAB".to_string()),
            e: Some("AQAB".to_string()),
            ..rsa_jwk()
        };
        assert!(with_components.is_usable());

        let unusable = [
            Jwk { use_purpose: Some("enc".to_string()), ..rsa_jwk() },
            Jwk { use_purpose: None, ..rsa_jwk() },
            Jwk { kty: Some("EC".to_string()), ..rsa_jwk() },
            Jwk { kid: None, ..rsa_jwk() },
            Jwk { kid: Some(String::new()), ..rsa_jwk() },
            Jwk { x5c: None, ..rsa_jwk() },
            Jwk { x5c: Some(vec![]), ..rsa_jwk() },
            Jwk { x5c: None, n: Some("AQAB".to_string()), ..rsa_jwk() },
        ];
        for jwk in unusable {
            assert!(!jwk.is_usable(), "{:?}", jwk);
        }
    }

    #[test]
    fn signing_key_from_certificate() {
        let key = SigningKey::try_from(&rsa_jwk()).unwrap();
        assert_eq!(key.kid, "key-1");
        assert_eq!(key.source, PublicKeySource::Certificate(CERT_PEM.to_string()));
    }

    #[test]
    fn signing_key_rejects_broken_certificate() {
        let jwk = Jwk { x5c: Some(vec!["AAAA".to_string()]), ..rsa_jwk() };
        assert!(SigningKey::try_from(&jwk).is_err());
    }

    #[test]
    fn key_set_tolerates_foreign_records() {
        let body = r#"{"keys":[
            {"kty":"EC","crv":"P-256","x":"abc","y":"def","kid":"ec-1","use":"sig"},
            {"kty":"RSA","kid":"rsa-1","use":"sig","n":"AQAB","e":"AQAB"}
        ]}"#;
        let set: JsonWebKeySet = serde_json::from_str(body).unwrap();
        let keys: Vec<Jwk> = set.keys.into_iter().map(|r| Jwk::from_record(r).unwrap()).collect();
        assert_eq!(keys.len(), 2);
        assert!(!keys[0].is_usable());
        assert!(keys[1].is_usable());

        let empty: JsonWebKeySet = serde_json::from_str("{}").unwrap();
        assert!(empty.keys.is_empty());
    }

    #[test]
    fn record_with_wrong_member_types_is_rejected_alone() {
        let set: JsonWebKeySet = serde_json::from_str(
            r#"{"keys":[
                {"kty":"RSA","use":"sig","kid":123,"n":"AQAB","e":"AQAB"},
                {"kty":"RSA","use":"enc","kid":"x","x5c":"notarray"},
                {"kty":"RSA","use":"sig","kid":"rsa-1","n":"AQAB","e":"AQAB"}
            ]}"#,
        )
        .unwrap();
        let decoded: Vec<_> = set.keys.into_iter().map(Jwk::from_record).collect();
        assert!(decoded[0].is_err());
        assert!(decoded[1].is_err());
        assert_eq!(decoded[2].as_ref().unwrap().kid.as_deref(), Some("rsa-1"));
    }
}
