// src/authorizer/client.rs

use super::model::{JsonWebKeySet, Jwk, SigningKey};
use crate::config::AuthorizerConfig;
use crate::error::{AuthError, ConfigError};
use moka::future::Cache;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use url::Url;

/// Fetches the provider's signing keys.
///
/// Without a cache TTL every call goes to the network. With one, the last
/// successful key set is reused until it expires; failed fetches are never
/// stored.
#[derive(Clone)]
pub struct JwksClient {
    // The client is internally ref-counted to allow for cheap cloning.
    inner: Arc<Inner>,
}

struct Inner {
    http_client: reqwest::Client,
    jwks_uri: Url,
    // Keyed by the JWKS URL; holds at most one entry.
    key_cache: Option<Cache<String, Arc<[SigningKey]>>>,
}

impl JwksClient {
    /// Creates a new `JwksClient` for the configured key set URL.
    pub fn new(config: &AuthorizerConfig) -> Result<Self, ConfigError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        let key_cache = config.jwks_cache_ttl.map(|ttl| {
            Cache::builder()
                .max_capacity(1)
                .time_to_live(ttl)
                .build()
        });

        Ok(Self {
            inner: Arc::new(Inner {
                http_client,
                jwks_uri: config.jwks_uri.clone(),
                key_cache,
            }),
        })
    }

    /// Returns the usable signing keys, from the cache when enabled and warm.
    #[instrument(skip(self), fields(jwks_uri = %self.inner.jwks_uri), err)]
    pub async fn fetch_signing_keys(&self) -> Result<Arc<[SigningKey]>, AuthError> {
        let Some(cache) = &self.inner.key_cache else {
            return self.fetch_from_provider().await;
        };

        let cache_key = self.inner.jwks_uri.to_string();
        if let Some(keys) = cache.get(&cache_key).await {
            debug!("JWKS cache hit");
            return Ok(keys);
        }

        debug!("JWKS cache miss. Fetching from provider.");
        let keys = self.fetch_from_provider().await?;
        cache.insert(cache_key, keys.clone()).await;
        Ok(keys)
    }

    async fn fetch_from_provider(&self) -> Result<Arc<[SigningKey]>, AuthError> {
        let response = self
            .inner
            .http_client
            .get(self.inner.jwks_uri.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(AuthError::network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::NetworkError(format!(
                "HTTP {} from JWKS endpoint",
                status
            )));
        }

        let jwks: JsonWebKeySet = response.json().await.map_err(AuthError::network)?;
        usable_signing_keys(jwks)
    }
}

/// Decodes each record, applies the usability filter and derives a
/// verification key for each surviving record.
///
/// Records that cannot be decoded or converted are logged and skipped.
pub(crate) fn usable_signing_keys(jwks: JsonWebKeySet) -> Result<Arc<[SigningKey]>, AuthError> {
    if jwks.keys.is_empty() {
        warn!("JWKS endpoint returned no keys");
        return Err(AuthError::EmptyKeySet);
    }

    let total = jwks.keys.len();
    let records: Vec<Jwk> = jwks
        .keys
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match Jwk::from_record(record) {
            Ok(jwk) => Some(jwk),
            Err(e) => {
                warn!(index, error = %e, "Skipping malformed key record");
                None
            }
        })
        .collect();

    let keys: Vec<SigningKey> = records
        .iter()
        .filter(|jwk| jwk.is_usable())
        .filter_map(|jwk| match SigningKey::try_from(jwk) {
            Ok(key) => Some(key),
            Err(reason) => {
                warn!(kid = ?jwk.kid, %reason, "Skipping signing key");
                None
            }
        })
        .collect();

    if keys.is_empty() {
        warn!(total, "JWKS endpoint returned no usable signing keys");
        return Err(AuthError::NoUsableKeys);
    }

    debug!(total, usable = keys.len(), "Fetched signing keys");
    Ok(keys.into())
}
