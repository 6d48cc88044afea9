use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_CREDENTIAL_KEY: &str = "token";
const DEFAULT_LOGIN_PATH: &str = "/login";

/// Storefront client configuration.
///
/// Every field but the base URL has a default; override with the `with_*`
/// methods. [`from_env()`](ClientConfig::from_env) also falls back to a
/// local gateway for the base URL.
///
/// ```rust,ignore
/// use storefront_session::ClientConfig;
///
/// let config = ClientConfig::new("https://shop.example.com/api".parse()?)
///     .with_login_path("/entrar");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) timeout: Duration,
    pub(crate) credential_key: String,
    pub(crate) login_path: String,
}

impl ClientConfig {
    /// Create a configuration pointing at the given API gateway.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            credential_key: DEFAULT_CREDENTIAL_KEY.into(),
            login_path: DEFAULT_LOGIN_PATH.into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `STOREFRONT_API_URL`: API gateway base URL (default
    ///   `http://localhost:8000/api`)
    /// - `STOREFRONT_TIMEOUT_SECS`: per-call timeout in whole seconds
    /// - `STOREFRONT_CREDENTIAL_KEY`: storage key of the bearer credential
    /// - `STOREFRONT_LOGIN_PATH`: login entry point for forced navigation
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set but invalid.
    pub fn from_env() -> Result<Self, Error> {
        let url_str =
            std::env::var("STOREFRONT_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());
        let url: Url = url_str
            .parse()
            .map_err(|e| Error::Config(format!("STOREFRONT_API_URL: {e}")))?;
        let mut config = Self::new(url);

        if let Ok(secs) = std::env::var("STOREFRONT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("STOREFRONT_TIMEOUT_SECS: {e}")))?;
            if secs == 0 {
                return Err(Error::Config(
                    "STOREFRONT_TIMEOUT_SECS must be greater than zero".into(),
                ));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Ok(key) = std::env::var("STOREFRONT_CREDENTIAL_KEY") {
            if key.trim().is_empty() {
                return Err(Error::Config("STOREFRONT_CREDENTIAL_KEY is empty".into()));
            }
            config = config.with_credential_key(key);
        }
        if let Ok(path) = std::env::var("STOREFRONT_LOGIN_PATH") {
            config = config.with_login_path(path);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = url;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_credential_key(mut self, key: impl Into<String>) -> Self {
        self.credential_key = key.into();
        self
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn credential_key(&self) -> &str {
        &self.credential_key
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Absolute URL for a service-relative route.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_env().unwrap();

        assert_eq!(config.base_url().as_str(), "http://localhost:8000/api");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.credential_key(), "token");
        assert_eq!(config.login_path(), "/login");
    }

    #[test]
    fn test_with_overrides() {
        let config = ClientConfig::new("https://shop.example.com/api/".parse().unwrap())
            .with_timeout(Duration::from_secs(3))
            .with_credential_key("session")
            .with_login_path("/entrar");

        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.credential_key(), "session");
        assert_eq!(config.login_path(), "/entrar");
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = ClientConfig::new("https://shop.example.com/api/".parse().unwrap());

        assert_eq!(
            config.endpoint("/auth/login"),
            "https://shop.example.com/api/auth/login"
        );
        assert_eq!(
            config.endpoint("products"),
            "https://shop.example.com/api/products"
        );
    }
}
