use std::sync::Arc;

use http::Method;
use reqwest::Client as ReqwestClient;

use crate::api::Api;
use crate::config::ClientConfig;
use crate::dispatcher::{Dispatcher, ResponseHandling};
use crate::error::RestClientError;
use crate::executor::Executor;
use crate::request::{Request, RequestBuilder};
use crate::response::FromResponse;
use crate::transport::{HttpTransport, Transport};

/// Main entry point: a config plus the dispatcher that runs its requests
///
/// # Examples
///
/// ```rust,no_run
/// use restkit::{Client, ClientConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ClientConfig::builder().base_url("https://httpbin.org/").build()?;
///     let client = Client::new(config);
///
///     let request = client.get("get").add_query("page", 1).build()?;
///     let body: String = client.dispatcher().fetch(&request).await?;
///     println!("{}", body);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    dispatcher: Dispatcher,
}

impl Client {
    /// Create a client over reqwest, delivering callbacks on the background
    /// context
    pub fn new(config: ClientConfig) -> Self {
        Self::builder(config).build()
    }

    /// Create a new client builder
    pub fn builder(config: ClientConfig) -> ClientBuilder {
        ClientBuilder::new(config)
    }

    /// Create a GET request
    pub fn get(&self, path: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    /// Create a POST request
    pub fn post(&self, path: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    /// Create a PUT request
    pub fn put(&self, path: impl AsRef<str>) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    /// Create a request with a custom method
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> RequestBuilder {
        self.config.request(method, path)
    }

    /// Get the endpoint catalog
    pub fn api(&self) -> Api {
        Api::new(self.config.clone())
    }

    /// Get the config
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the dispatcher
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Dispatch `request`, ignoring the body on success
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn execute<S, F>(&self, request: Request, on_success: S, on_failure: F) -> tokio::task::JoinHandle<()>
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(RestClientError) + Send + 'static,
    {
        self.dispatcher.execute(request, on_success, on_failure)
    }

    /// Dispatch `request` and decode a successful body as `T`
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn execute_decoded<T, S, F>(&self, request: Request, on_success: S, on_failure: F) -> tokio::task::JoinHandle<()>
    where
        T: FromResponse,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(RestClientError) + Send + 'static,
    {
        self.dispatcher.execute_decoded(request, on_success, on_failure)
    }
}

/// Builder for creating clients with a custom transport or delivery context
pub struct ClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    handling: ResponseHandling,
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
            handling: ResponseHandling::default(),
        }
    }

    /// Use `transport` instead of reqwest
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Deliver callbacks through `executor`
    pub fn calling_context<E>(mut self, executor: E) -> Self
    where
        E: Executor + 'static,
    {
        self.handling = ResponseHandling::on_calling_context(executor);
        self
    }

    /// Set where callbacks run
    pub fn response_handling(mut self, handling: ResponseHandling) -> Self {
        self.handling = handling;
        self
    }

    /// Build the client
    pub fn build(self) -> Client {
        let transport = self.transport.unwrap_or_else(|| {
            Arc::new(HttpTransport::new(Arc::new(ReqwestClient::new()), self.config.timeout()))
        });

        let dispatcher = Dispatcher::new(transport)
            .response_handling(self.handling)
            .decode_options(self.config.decode_options());

        Client {
            config: Arc::new(self.config),
            dispatcher,
        }
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("transport", &self.transport.as_ref().map(|t| t.name().to_string()))
            .field("handling", &self.handling)
            .finish()
    }
}
