// src/config.rs

use crate::error::ConfigError;
use jsonwebtoken::Algorithm;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Default timeout for the JWKS request.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a presigned attachment upload URL.
pub const DEFAULT_SIGNED_URL_EXPIRATION: Duration = Duration::from_secs(300);

/// Contains the validation settings applied to a bearer token.
#[derive(Clone, Debug)]
pub struct ValidationDetails {
    /// The single signing algorithm this authorizer trusts.
    /// Tokens declaring any other algorithm are rejected before any key lookup.
    pub algorithm: Algorithm,
    /// The tolerance for clock skew when validating `exp` and `nbf`.
    pub leeway: Duration,
    /// Expected `iss` claim. Not checked when `None`.
    pub issuer: Option<String>,
    /// Expected `aud` claim. Not checked when `None`.
    pub audience: Option<String>,
}

impl Default for ValidationDetails {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::RS256,
            leeway: Duration::ZERO,
            issuer: None,
            audience: None,
        }
    }
}

/// The configuration for the bearer token authorizer.
///
/// Construct it with [`ConfigBuilder`].
#[derive(Clone, Debug)]
pub struct AuthorizerConfig {
    /// The identity provider's published key set, e.g.
    /// `https://tenant.auth0.com/.well-known/jwks.json`.
    pub jwks_uri: Url,
    /// Timeout for the key set request.
    pub http_timeout: Duration,
    /// When set, a successfully fetched key set is reused for this long.
    /// When `None` every authorization fetches the key set again.
    pub jwks_cache_ttl: Option<Duration>,
    /// The checks performed on the token.
    pub validation: ValidationDetails,
}

/// A builder for creating an [`AuthorizerConfig`].
#[derive(Default)]
pub struct ConfigBuilder {
    jwks_uri: Option<Url>,
    http_timeout: Option<Duration>,
    jwks_cache_ttl: Option<Duration>,
    validation: ValidationDetails,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from the process environment.
    ///
    /// | Variable | Meaning |
    /// |---|---|
    /// | `JWKS_URL` | key set URL (required by `build`) |
    /// | `JWT_ALGORITHM` | trusted algorithm, default `RS256` |
    /// | `JWT_LEEWAY_SECONDS` | clock skew tolerance |
    /// | `JWKS_TIMEOUT_SECONDS` | key set request timeout |
    /// | `JWKS_CACHE_TTL_SECONDS` | enables key set caching |
    /// | `JWT_ISSUER` / `JWT_AUDIENCE` | optional claim checks |
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::new();
        if let Some(url) = env_var("JWKS_URL") {
            builder = builder.jwks_uri(&url)?;
        }
        if let Some(alg) = env_var("JWT_ALGORITHM") {
            let alg = Algorithm::from_str(&alg).map_err(|_| {
                ConfigError::InvalidConfiguration(format!("unknown JWT_ALGORITHM '{}'", alg))
            })?;
            builder = builder.trusted_algorithm(alg)?;
        }
        if let Some(secs) = env_seconds("JWT_LEEWAY_SECONDS")? {
            builder = builder.leeway(secs);
        }
        if let Some(secs) = env_seconds("JWKS_TIMEOUT_SECONDS")? {
            builder = builder.http_timeout(secs);
        }
        if let Some(secs) = env_seconds("JWKS_CACHE_TTL_SECONDS")? {
            builder = builder.jwks_cache_ttl(secs);
        }
        if let Some(issuer) = env_var("JWT_ISSUER") {
            builder = builder.issuer(issuer);
        }
        if let Some(audience) = env_var("JWT_AUDIENCE") {
            builder = builder.audience(audience);
        }
        Ok(builder)
    }

    /// Sets the key set URL. This is a required field.
    pub fn jwks_uri(mut self, url: &str) -> Result<Self, ConfigError> {
        let parsed_url = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;
        self.jwks_uri = Some(parsed_url);
        Ok(self)
    }

    /// Sets the trusted signing algorithm. Defaults to `RS256`.
    ///
    /// Only RSA algorithms are accepted since only RSA keys are taken from
    /// the key set.
    pub fn trusted_algorithm(mut self, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if !is_rsa_algorithm(algorithm) {
            return Err(ConfigError::InvalidConfiguration(format!(
                "{:?} is not an RSA signing algorithm",
                algorithm
            )));
        }
        self.validation.algorithm = algorithm;
        Ok(self)
    }

    /// Sets the clock skew tolerance. Defaults to zero.
    pub fn leeway(mut self, leeway: Duration) -> Self {
        self.validation.leeway = leeway;
        self
    }

    /// Sets the key set request timeout. Defaults to 10 seconds.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Enables key set caching for `ttl`.
    pub fn jwks_cache_ttl(mut self, ttl: Duration) -> Self {
        self.jwks_cache_ttl = Some(ttl);
        self
    }

    /// Requires the `iss` claim to equal `issuer`.
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.validation.issuer = Some(issuer.into());
        self
    }

    /// Requires the `aud` claim to contain `audience`.
    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.validation.audience = Some(audience.into());
        self
    }

    /// Consumes the builder and returns an `AuthorizerConfig`.
    ///
    /// # Errors
    ///
    /// Returns an error if `jwks_uri` is missing or a duration is zero where
    /// that makes no sense.
    pub fn build(self) -> Result<AuthorizerConfig, ConfigError> {
        let jwks_uri = self
            .jwks_uri
            .ok_or_else(|| ConfigError::MissingConfiguration("jwks_uri".to_string()))?;

        let http_timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
        if http_timeout.is_zero() {
            return Err(ConfigError::InvalidConfiguration(
                "http_timeout must be greater than zero".to_string(),
            ));
        }
        if self.jwks_cache_ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(ConfigError::InvalidConfiguration(
                "jwks_cache_ttl must be greater than zero".to_string(),
            ));
        }

        Ok(AuthorizerConfig {
            jwks_uri,
            http_timeout,
            jwks_cache_ttl: self.jwks_cache_ttl,
            validation: self.validation,
        })
    }
}

/// Where attachments live and how long upload URLs stay valid.
#[derive(Clone, Debug)]
pub struct AttachmentConfig {
    pub bucket: String,
    pub url_expiration: Duration,
}

impl AttachmentConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            url_expiration: DEFAULT_SIGNED_URL_EXPIRATION,
        }
    }

    /// Reads `ATTACHMENT_S3_BUCKET` (required) and `SIGNED_URL_EXPIRATION`
    /// (seconds, optional).
    pub fn from_env() -> Result<Self, ConfigError> {
        let bucket = env_var("ATTACHMENT_S3_BUCKET")
            .ok_or_else(|| ConfigError::MissingConfiguration("ATTACHMENT_S3_BUCKET".to_string()))?;
        let mut config = Self::new(bucket);
        if let Some(expiration) = env_seconds("SIGNED_URL_EXPIRATION")? {
            config.url_expiration = expiration;
        }
        Ok(config)
    }

    /// The public URL an attachment stored under `key` is served from.
    pub fn object_url(&self, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
    }
}

fn is_rsa_algorithm(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_seconds(name: &str) -> Result<Option<Duration>, ConfigError> {
    env_var(name)
        .map(|raw| {
            raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| {
                ConfigError::InvalidConfiguration(format!("{} must be a number of seconds", name))
            })
        })
        .transpose()
}

/// Serialises tests that touch the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const AUTHORIZER_VARS: [&str; 7] = [
        "JWKS_URL",
        "JWT_ALGORITHM",
        "JWT_LEEWAY_SECONDS",
        "JWKS_TIMEOUT_SECONDS",
        "JWKS_CACHE_TTL_SECONDS",
        "JWT_ISSUER",
        "JWT_AUDIENCE",
    ];

    /// Runs `f` with exactly `vars` set among `names`, then clears them.
    fn with_env<T>(names: &[&str], vars: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        for name in names {
            env::remove_var(name);
        }
        for (name, value) in vars {
            env::set_var(name, value);
        }
        let result = f();
        for name in names {
            env::remove_var(name);
        }
        result
    }

    fn builder_from_env(vars: &[(&str, &str)]) -> Result<ConfigBuilder, ConfigError> {
        with_env(&AUTHORIZER_VARS, vars, ConfigBuilder::from_env)
    }

    fn attachments_from_env(vars: &[(&str, &str)]) -> Result<AttachmentConfig, ConfigError> {
        with_env(
            &["ATTACHMENT_S3_BUCKET", "SIGNED_URL_EXPIRATION"],
            vars,
            AttachmentConfig::from_env,
        )
    }

    #[test]
    fn from_env_reads_every_authorizer_setting() {
        let config = builder_from_env(&[
            ("JWKS_URL", "https://tenant.example.com/.well-known/jwks.json"),
            ("JWT_ALGORITHM", "PS256"),
            ("JWT_LEEWAY_SECONDS", " 5 "),
            ("JWKS_TIMEOUT_SECONDS", "3"),
            ("JWKS_CACHE_TTL_SECONDS", "600"),
            ("JWT_ISSUER", "https://tenant.example.com/"),
            ("JWT_AUDIENCE", "todo-api"),
        ])
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(config.jwks_uri.path(), "/.well-known/jwks.json");
        assert_eq!(config.validation.algorithm, Algorithm::PS256);
        assert_eq!(config.validation.leeway, Duration::from_secs(5));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.jwks_cache_ttl, Some(Duration::from_secs(600)));
        assert_eq!(config.validation.issuer.as_deref(), Some("https://tenant.example.com/"));
        assert_eq!(config.validation.audience.as_deref(), Some("todo-api"));
    }

    #[test]
    fn from_env_without_variables_needs_a_url() {
        let builder = builder_from_env(&[("JWT_ISSUER", "   ")]).unwrap();
        assert!(matches!(builder.build(), Err(ConfigError::MissingConfiguration(_))));
    }

    #[test]
    fn from_env_rejects_bad_values() {
        let bad = [
            ("JWKS_URL", "not a url"),
            ("JWT_ALGORITHM", "XX999"),
            ("JWT_ALGORITHM", "HS256"),
            ("JWT_LEEWAY_SECONDS", "abc"),
            ("JWKS_TIMEOUT_SECONDS", "-1"),
            ("JWKS_CACHE_TTL_SECONDS", "1.5"),
        ];
        for (name, value) in bad {
            let result = builder_from_env(&[(name, value)]);
            assert!(result.is_err(), "{}={}", name, value);
        }

        let leeway = builder_from_env(&[("JWT_LEEWAY_SECONDS", "abc")]);
        assert!(matches!(
            leeway,
            Err(ConfigError::InvalidConfiguration(msg)) if msg.contains("JWT_LEEWAY_SECONDS")
        ));
        let unknown = builder_from_env(&[("JWT_ALGORITHM", "XX999")]);
        assert!(matches!(
            unknown,
            Err(ConfigError::InvalidConfiguration(msg)) if msg.contains("unknown JWT_ALGORITHM")
        ));
        let symmetric = builder_from_env(&[("JWT_ALGORITHM", "HS256")]);
        assert!(matches!(symmetric, Err(ConfigError::InvalidConfiguration(_))));
    }

    #[test]
    fn attachment_config_from_env() {
        let config = attachments_from_env(&[
            ("ATTACHMENT_S3_BUCKET", "todo-attachments"),
            ("SIGNED_URL_EXPIRATION", "900"),
        ])
        .unwrap();
        assert_eq!(config.bucket, "todo-attachments");
        assert_eq!(config.url_expiration, Duration::from_secs(900));

        let defaulted = attachments_from_env(&[("ATTACHMENT_S3_BUCKET", "b")]).unwrap();
        assert_eq!(defaulted.url_expiration, DEFAULT_SIGNED_URL_EXPIRATION);

        let missing = attachments_from_env(&[("SIGNED_URL_EXPIRATION", "900")]);
        assert!(matches!(
            missing,
            Err(ConfigError::MissingConfiguration(name)) if name == "ATTACHMENT_S3_BUCKET"
        ));
        let bad_expiration = attachments_from_env(&[
            ("ATTACHMENT_S3_BUCKET", "b"),
            ("SIGNED_URL_EXPIRATION", "five minutes"),
        ]);
        assert!(matches!(bad_expiration, Err(ConfigError::InvalidConfiguration(_))));
    }

    #[test]
    fn build_requires_jwks_uri() {
        let result = ConfigBuilder::new().build();
        assert!(matches!(
            result,
            Err(ConfigError::MissingConfiguration(field)) if field == "jwks_uri"
        ));
    }

    #[test]
    fn defaults_match_fetch_per_call_rs256() {
        let config = ConfigBuilder::new()
            .jwks_uri("https://tenant.example.com/.well-known/jwks.json")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.validation.algorithm, Algorithm::RS256);
        assert_eq!(config.validation.leeway, Duration::ZERO);
        assert_eq!(config.http_timeout, DEFAULT_HTTP_TIMEOUT);
        assert!(config.jwks_cache_ttl.is_none());
        assert!(config.validation.issuer.is_none());
    }

    #[test]
    fn rejects_non_rsa_trusted_algorithms() {
        for alg in [Algorithm::HS256, Algorithm::ES256, Algorithm::EdDSA] {
            let result = ConfigBuilder::new().trusted_algorithm(alg);
            assert!(matches!(result, Err(ConfigError::InvalidConfiguration(_))), "{:?}", alg);
        }
        assert!(ConfigBuilder::new().trusted_algorithm(Algorithm::PS256).is_ok());
    }

    #[test]
    fn rejects_bad_url_and_zero_durations() {
        assert!(matches!(
            ConfigBuilder::new().jwks_uri("not a url"),
            Err(ConfigError::InvalidUrl(_))
        ));

        let zero_ttl = ConfigBuilder::new()
            .jwks_uri("https://tenant.example.com/jwks.json")
            .unwrap()
            .jwks_cache_ttl(Duration::ZERO)
            .build();
        assert!(matches!(zero_ttl, Err(ConfigError::InvalidConfiguration(_))));
    }

    #[test]
    fn attachment_object_url() {
        let config = AttachmentConfig::new("todo-attachments");
        assert_eq!(
            config.object_url("abc.jpg"),
            "https://todo-attachments.s3.amazonaws.com/abc.jpg"
        );
        assert_eq!(config.url_expiration, DEFAULT_SIGNED_URL_EXPIRATION);
    }
}
