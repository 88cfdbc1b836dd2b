use std::collections::BTreeMap;
use std::fmt::Display;

use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde::Serialize;
use url::Url;

use crate::error::{Error, Result};
use crate::multipart::{Media, MultipartData};

/// HTTP request ready for dispatch
///
/// Produced by [`RequestBuilder::build`]. A `Request` cannot be modified; it
/// can only be inspected or handed to a [`Dispatcher`](crate::Dispatcher).
#[derive(Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Request {
    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Convert to a reqwest request
    pub fn to_reqwest_request(&self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method.clone(), self.url.clone());
        *request.headers_mut() = self.headers.clone();
        if let Some(body) = &self.body {
            *request.body_mut() = Some(body.clone().into());
        }
        request
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|b| format!("{} bytes", b.len())))
            .finish()
    }
}

/// The single body slot of a builder; the last setter wins
#[derive(Debug, Clone)]
enum Payload {
    Empty,
    Form(Vec<(String, String)>),
    Json(Vec<u8>),
    InvalidJson(String),
    Multipart(MultipartData),
}

/// Builder for creating HTTP requests
///
/// Collects the URL template, headers, parameters and one kind of body, then
/// assembles them in [`build`](RequestBuilder::build).
///
/// Query and path parameters are only applied to `GET` requests, and only
/// `POST` and `PUT` requests carry a body.
///
/// # Examples
///
/// ```rust
/// use restkit::{Method, RequestBuilder};
///
/// let request = RequestBuilder::new(Method::GET, "http://api.com/", "api/issue/{id}")
///     .add_header("Accept", "application/json")
///     .add_path("id", 42)
///     .add_query("verbose", true)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.url().as_str(), "http://api.com/api/issue/42?verbose=true");
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url_template: String,
    headers: BTreeMap<String, String>,
    query: BTreeMap<String, String>,
    path: BTreeMap<String, String>,
    payload: Payload,
}

impl RequestBuilder {
    /// Create a new request builder for `base_url` followed by `path`
    ///
    /// `path` may contain `{name}` placeholders filled by
    /// [`add_path`](Self::add_path).
    pub fn new(method: Method, base_url: impl AsRef<str>, path: impl AsRef<str>) -> Self {
        Self {
            method,
            url_template: format!("{}{}", base_url.as_ref(), path.as_ref()),
            headers: BTreeMap::new(),
            query: BTreeMap::new(),
            path: BTreeMap::new(),
            payload: Payload::Empty,
        }
    }

    /// Get the HTTP method
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Merge headers, overwriting existing values of the same name
    ///
    /// Header names are case-insensitive: `Accept` replaces `accept`.
    pub fn set_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.insert_header(name.into(), value.into());
        }
        self
    }

    /// Set a header
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_header(name.into(), value.into());
        self
    }

    fn insert_header(&mut self, mut name: String, value: String) {
        // HeaderName is lowercase, so the map has to be as well
        name.make_ascii_lowercase();
        self.headers.insert(name, value);
    }

    /// Record a query parameter
    pub fn add_query(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.query.insert(name.into(), value.to_string());
        self
    }

    /// Record a value for the `{name}` placeholder
    pub fn add_path(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.path.insert(name.into(), value.to_string());
        self
    }

    /// Append a URL-encoded form field, discarding any JSON or multipart body
    pub fn add_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let field = (name.into(), value.into());
        match &mut self.payload {
            Payload::Form(fields) => fields.push(field),
            payload => *payload = Payload::Form(vec![field]),
        }
        self
    }

    /// Serialize `body` as the JSON body, discarding form fields and
    /// multipart data
    ///
    /// A serialization failure surfaces from [`build`](Self::build).
    pub fn set_body<T>(mut self, body: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        self.payload = match serde_json::to_vec(body) {
            Ok(bytes) => Payload::Json(bytes),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize request body");
                Payload::InvalidJson(e.to_string())
            }
        };
        self
    }

    /// Send the body as `multipart/form-data`, discarding form fields and
    /// any JSON body
    pub fn set_multipart_data(
        mut self,
        parameters: Option<BTreeMap<String, String>>,
        media: Option<Vec<Media>>,
    ) -> Self {
        self.payload = Payload::Multipart(MultipartData::new(parameters, media));
        self
    }

    /// Build the request
    ///
    /// Building does not consume the builder; building twice without
    /// changes yields the same URL, headers and body.
    ///
    /// Query and path values are inserted as given. The assembled string is
    /// then parsed as a [`Url`], which percent-encodes characters a URL cannot
    /// carry (`a b` is sent as `a%20b`). A path value of `.` or `..` would be
    /// resolved away by that parse and is rejected instead.
    pub fn build(&self) -> Result<Request> {
        if self.method == Method::GET {
            if let Some((name, _)) = self.path.iter().find(|(name, value)| {
                matches!(value.as_str(), "." | "..") && self.url_template.contains(&format!("{{{name}}}"))
            }) {
                return Err(Error::invalid_request(format!(
                    "path parameter `{name}` is a dot segment"
                )));
            }
        }

        let url = Url::parse(&self.expand_url())?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = name.parse::<HeaderName>()?;
            let value = value.parse::<HeaderValue>()?;
            headers.insert(name, value);
        }

        let body = if self.method == Method::POST || self.method == Method::PUT {
            match &self.payload {
                Payload::Empty => None,
                Payload::Form(fields) => Some(encode_fields(fields)),
                Payload::Json(bytes) => Some(bytes.clone()),
                Payload::InvalidJson(message) => return Err(Error::serialization(message.clone())),
                Payload::Multipart(data) => {
                    headers.insert(CONTENT_TYPE, data.content_type().parse::<HeaderValue>()?);
                    Some(data.encode())
                }
            }
        } else {
            None
        };

        Ok(Request {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }

    fn expand_url(&self) -> String {
        let mut url = self.url_template.clone();
        if self.method != Method::GET {
            return url;
        }

        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&query);
        }

        for (name, value) in &self.path {
            url = url.replace(&format!("{{{name}}}"), value);
        }
        url
    }
}

fn encode_fields(fields: &[(String, String)]) -> Vec<u8> {
    fields
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&")
        .into_bytes()
}
