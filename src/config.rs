use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::Method;
use url::Url;

use crate::error::{Error, Result};
use crate::request::RequestBuilder;
use crate::response::DecodeOptions;

/// Supplies the current value of the `Authorization` header
pub type AuthTokenProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Settings shared by every request built for one API
///
/// # Examples
///
/// ```rust
/// use restkit::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("http://api.com/")
///     .default_header("Accept", "application/json")
///     .auth_token_provider(|| "access_token".to_string())
///     .build()
///     .unwrap();
///
/// assert_eq!(config.authorization().as_deref(), Some("access_token"));
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    default_headers: BTreeMap<String, String>,
    auth_token_provider: Option<AuthTokenProvider>,
    timeout: Option<Duration>,
    decode_options: DecodeOptions,
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Get the base URL every request path is appended to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the headers seeded into every builder
    pub fn default_headers(&self) -> &BTreeMap<String, String> {
        &self.default_headers
    }

    /// Get the transport timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Get the body decoding options
    pub fn decode_options(&self) -> DecodeOptions {
        self.decode_options
    }

    /// Ask the token provider for the current authorization value
    pub fn authorization(&self) -> Option<String> {
        self.auth_token_provider.as_ref().map(|provider| provider())
    }

    /// Start a request for `path`, relative to the base URL
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder {
        RequestBuilder::new(method, &self.base_url, path).set_headers(self.default_headers.clone())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("auth_token_provider", &self.auth_token_provider.is_some())
            .field("timeout", &self.timeout)
            .field("decode_options", &self.decode_options)
            .finish()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    default_headers: BTreeMap<String, String>,
    auth_token_provider: Option<AuthTokenProvider>,
    timeout: Option<Duration>,
    decode_options: DecodeOptions,
}

impl ClientConfigBuilder {
    /// Create a new config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for all requests
    ///
    /// Paths are appended verbatim, so this normally ends with `/`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set a default header for all requests
    ///
    /// Names are stored lowercase, so a later `Accept` replaces `accept`.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Set the source of the `Authorization` header
    pub fn auth_token_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.auth_token_provider = Some(Arc::new(provider));
        self
    }

    /// Set the transport timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Strip one character from each end of text responses (on by default)
    pub fn unquote_text_responses(mut self, unquote: bool) -> Self {
        self.decode_options.unquote_text_responses = unquote;
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ClientConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::config("a base URL is required"))?;

        let parsed = Url::parse(&base_url).map_err(|e| Error::config(format!("invalid base URL {base_url:?}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(Error::config(format!("base URL {base_url:?} cannot be a base")));
        }

        Ok(ClientConfig {
            base_url,
            default_headers: self.default_headers,
            auth_token_provider: self.auth_token_provider,
            timeout: self.timeout,
            decode_options: self.decode_options,
        })
    }
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_missing_base_url() {
        let err = ClientConfig::builder().build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ClientConfig::builder().base_url("api.com").build().is_err());
        assert!(ClientConfig::builder().base_url("mailto:ops@api.com").build().is_err());
    }

    #[test]
    fn test_request_uses_base_url_and_default_headers() {
        let config = ClientConfig::builder()
            .base_url("http://api.com/")
            .default_header("Accept", "application/json")
            .default_header("X-Client", "restkit")
            .build()
            .unwrap();

        let request = config
            .request(Method::GET, "api/get")
            .add_header("X-Client", "override")
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), "http://api.com/api/get");
        assert_eq!(request.headers().get("accept").unwrap(), "application/json");
        assert_eq!(request.headers().get("x-client").unwrap(), "override");
    }

    #[test]
    fn test_default_header_names_ignore_case() {
        let config = ClientConfig::builder()
            .base_url("http://api.com/")
            .default_header("accept", "text/plain")
            .default_header("Accept", "application/json")
            .build()
            .unwrap();

        assert_eq!(config.default_headers().len(), 1);
        assert_eq!(config.default_headers()["accept"], "application/json");
    }

    #[test]
    fn test_token_provider_is_called_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = ClientConfig::builder()
            .base_url("http://api.com/")
            .auth_token_provider(move || format!("token-{}", counter.fetch_add(1, Ordering::SeqCst)))
            .build()
            .unwrap();

        assert_eq!(config.authorization().as_deref(), Some("token-0"));
        assert_eq!(config.authorization().as_deref(), Some("token-1"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder().base_url("http://api.com/").build().unwrap();
        assert!(config.authorization().is_none());
        assert!(config.timeout().is_none());
        assert!(config.decode_options().unquote_text_responses);

        let config = ClientConfig::builder()
            .base_url("http://api.com/")
            .timeout(Duration::from_secs(30))
            .unquote_text_responses(false)
            .build()
            .unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(!config.decode_options().unquote_text_responses);
    }
}
