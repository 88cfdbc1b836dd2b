use http::{HeaderMap, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::RestClientError;

/// HTTP response as delivered by a [`Transport`](crate::Transport)
///
/// The whole body is read before the response is handed back.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: url::Url,
    body: Vec<u8>,
}

impl Response {
    /// Create a response from its parts
    pub fn new(status: StatusCode, headers: HeaderMap, url: url::Url, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    /// Read a reqwest response to the end
    pub async fn from_reqwest_response(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?.to_vec();

        Ok(Self::new(status, headers, url, body))
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Get the URL that was requested
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the response body
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Get the response body as lossily decoded text
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Take the response body
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Options controlling how response bodies are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Strip exactly one leading and one trailing character from text
    /// responses, turning `"value"` into `value`
    pub unquote_text_responses: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            unquote_text_responses: true,
        }
    }
}

/// Types a successful response body can be decoded into
///
/// Implemented for raw bytes (`Vec<u8>`), text (`String`) and any
/// deserializable type wrapped in [`Json`].
pub trait FromResponse: Sized + Send + 'static {
    /// Decode a non-empty body received with `status`
    fn from_response(body: Vec<u8>, status: u16, options: &DecodeOptions) -> Result<Self, RestClientError>;
}

impl FromResponse for Vec<u8> {
    fn from_response(body: Vec<u8>, _status: u16, _options: &DecodeOptions) -> Result<Self, RestClientError> {
        Ok(body)
    }
}

impl FromResponse for String {
    fn from_response(body: Vec<u8>, status: u16, options: &DecodeOptions) -> Result<Self, RestClientError> {
        let text = String::from_utf8(body).map_err(|e| RestClientError::json_parsing(status, e.to_string()))?;
        if options.unquote_text_responses {
            Ok(unquote(&text).to_string())
        } else {
            Ok(text)
        }
    }
}

/// A response body decoded as JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the decoded value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> FromResponse for Json<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn from_response(body: Vec<u8>, status: u16, _options: &DecodeOptions) -> Result<Self, RestClientError> {
        serde_json::from_slice(&body)
            .map(Json)
            .map_err(|e| RestClientError::json_parsing(status, e.to_string()))
    }
}

// Drops one character from each end, whatever they are.
fn unquote(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}
