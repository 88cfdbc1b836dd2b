use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;

use crate::error::{Error, Result};
use crate::request::Request;
use crate::response::Response;

/// Transport trait for HTTP operations
///
/// A transport performs the actual exchange: connection handling, TLS,
/// redirects and timeouts all live behind this trait. An `Err` means no
/// response was received at all.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the complete response
    async fn send(&self, request: &Request) -> Result<Response>;

    /// Get the transport name/type
    fn name(&self) -> &str;
}

/// Default HTTP transport implementation using reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Arc<ReqwestClient>,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(client: Arc<ReqwestClient>, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    /// Get the underlying reqwest client
    pub fn client(&self) -> &ReqwestClient {
        &self.client
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn exchange(&self, request: &Request) -> reqwest::Result<Response> {
        let response = self.client.execute(request.to_reqwest_request()).await?;
        Response::from_reqwest_response(response).await
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Arc::new(ReqwestClient::new()), None)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> Result<Response> {
        let exchange = self.exchange(request);

        if let Some(timeout) = self.timeout {
            tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| Error::timeout(timeout))?
                .map_err(Error::Network)
        } else {
            exchange.await.map_err(Error::Network)
        }
    }

    fn name(&self) -> &str {
        "HTTP/1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_transport() {
        let transport = HttpTransport::new(Arc::new(ReqwestClient::new()), Some(Duration::from_secs(5)));

        assert_eq!(transport.name(), "HTTP/1.1");
        assert_eq!(transport.timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let transport = HttpTransport::default();
        // nothing listens on the discard port
        let request = crate::RequestBuilder::new(http::Method::GET, "http://127.0.0.1:9/", "nothing")
            .build()
            .unwrap();

        let err = transport.send(&request).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
