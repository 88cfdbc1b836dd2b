use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use tokio::task::JoinHandle;

use crate::error::RestClientError;
use crate::executor::Executor;
use crate::request::Request;
use crate::response::{DecodeOptions, FromResponse, Response};
use crate::transport::Transport;

/// Where dispatch callbacks run
#[derive(Clone)]
pub enum ResponseHandling {
    /// Hand callbacks to the executor representing the caller's context,
    /// whichever thread the transport completed on
    OnCallingContext(Arc<dyn Executor>),
    /// Run callbacks directly on the task that saw the transport complete
    OnBackgroundContext,
}

impl ResponseHandling {
    /// Deliver through `executor`
    pub fn on_calling_context<E>(executor: E) -> Self
    where
        E: Executor + 'static,
    {
        ResponseHandling::OnCallingContext(Arc::new(executor))
    }
}

impl Default for ResponseHandling {
    fn default() -> Self {
        ResponseHandling::OnBackgroundContext
    }
}

impl fmt::Debug for ResponseHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseHandling::OnCallingContext(_) => f.write_str("OnCallingContext"),
            ResponseHandling::OnBackgroundContext => f.write_str("OnBackgroundContext"),
        }
    }
}

/// Executes requests and reports the outcome
///
/// Only a `200 OK` counts as success. Any other status becomes an
/// [`HttpError`](crate::ErrorKind::HttpError) carrying the body as its
/// message, and a transport failure becomes
/// [`RequestTimedOut`](crate::ErrorKind::RequestTimedOut) with status `0`.
///
/// The callback operations spawn onto the current tokio runtime and must be
/// called from within one. Once started, a dispatch runs to completion.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use restkit::{Dispatcher, HttpTransport, Json, Method, RequestBuilder};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let dispatcher = Dispatcher::new(Arc::new(HttpTransport::default()));
///     let request = RequestBuilder::new(Method::GET, "https://httpbin.org/", "json").build()?;
///
///     let Json(body) = dispatcher.fetch::<Json<serde_json::Value>>(&request).await?;
///     println!("{}", body);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    handling: ResponseHandling,
    options: DecodeOptions,
}

impl Dispatcher {
    /// Create a dispatcher that delivers on the background context
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            handling: ResponseHandling::default(),
            options: DecodeOptions::default(),
        }
    }

    /// Set where callbacks run
    pub fn response_handling(mut self, handling: ResponseHandling) -> Self {
        self.handling = handling;
        self
    }

    /// Set the body decoding options
    pub fn decode_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Get the transport
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Get where callbacks run
    pub fn handling(&self) -> &ResponseHandling {
        &self.handling
    }

    /// Get the body decoding options
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Send a request and classify the outcome
    pub async fn send(&self, request: &Request) -> Result<Response, RestClientError> {
        log_request(request);

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %request.url(), error = %e, "request failed without a response");
                return Err(RestClientError::timed_out(e.to_string()));
            }
        };

        let status = response.status();
        tracing::debug!("{}#{} : {}", response.url(), status.as_u16(), response.text_lossy());

        if status == StatusCode::OK {
            Ok(response)
        } else {
            Err(RestClientError::http(status.as_u16(), response.text_lossy()))
        }
    }

    /// Send a request and decode a successful body as `T`
    pub async fn fetch<T>(&self, request: &Request) -> Result<T, RestClientError>
    where
        T: FromResponse,
    {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let body = response.into_body();

        if body.is_empty() {
            tracing::warn!(url = %request.url(), "response body is empty");
            return Err(RestClientError::json_parsing(status, ""));
        }

        T::from_response(body, status, &self.options).map_err(|e| {
            tracing::warn!(url = %request.url(), error = %e, "failed to decode response body");
            e
        })
    }

    /// Dispatch `request`, ignoring the body on success
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, as [`tokio::spawn`] does.
    pub fn execute<S, F>(&self, request: Request, on_success: S, on_failure: F) -> JoinHandle<()>
    where
        S: FnOnce() + Send + 'static,
        F: FnOnce(RestClientError) + Send + 'static,
    {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.send(&request).await;
            dispatcher.deliver(move || match outcome {
                Ok(_) => on_success(),
                Err(e) => on_failure(e),
            });
        })
    }

    /// Dispatch `request` and decode a successful body as `T`
    ///
    /// `T` is `Vec<u8>` for the raw body, `String` for text, or
    /// [`Json<T>`](crate::Json) for a JSON document.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime, as [`tokio::spawn`] does.
    pub fn execute_decoded<T, S, F>(&self, request: Request, on_success: S, on_failure: F) -> JoinHandle<()>
    where
        T: FromResponse,
        S: FnOnce(T) + Send + 'static,
        F: FnOnce(RestClientError) + Send + 'static,
    {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.fetch::<T>(&request).await;
            dispatcher.deliver(move || match outcome {
                Ok(value) => on_success(value),
                Err(e) => on_failure(e),
            });
        })
    }

    fn deliver<C>(&self, callback: C)
    where
        C: FnOnce() + Send + 'static,
    {
        match &self.handling {
            ResponseHandling::OnCallingContext(executor) => executor.run(Box::new(callback)),
            ResponseHandling::OnBackgroundContext => callback(),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport.name())
            .field("handling", &self.handling)
            .field("options", &self.options)
            .finish()
    }
}

fn log_request(request: &Request) {
    tracing::debug!("{} {}", request.method(), request.url());
    tracing::debug!("Headers: {:?}", request.headers());
    if let Some(body) = request.body() {
        tracing::debug!("HttpBody: {}", String::from_utf8_lossy(body));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::executor::{InlineExecutor, TaskQueue};
    use crate::response::Json;
    use crate::RequestBuilder;
    use async_trait::async_trait;
    use http::{HeaderMap, Method};
    use serde::Deserialize;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    /// Answers every request the same way and remembers what it saw
    struct StubTransport {
        reply: Option<(u16, Vec<u8>)>,
        seen: Mutex<Vec<Request>>,
    }

    impl StubTransport {
        fn respond(status: u16, body: impl Into<Vec<u8>>) -> Arc<Self> {
            Arc::new(Self {
                reply: Some((status, body.into())),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn send(&self, request: &Request) -> crate::Result<Response> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Some((status, body)) => Ok(Response::new(
                    StatusCode::from_u16(*status).unwrap(),
                    HeaderMap::new(),
                    request.url().clone(),
                    body.clone(),
                )),
                None => Err(Error::invalid_request("The network connection was lost.")),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        name: String,
        age: u8,
    }

    fn get_request() -> Request {
        RequestBuilder::new(Method::GET, "http://api.com/", "api/user/{id}")
            .add_path("id", 1)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_json_success_on_calling_context() {
        let transport = StubTransport::respond(200, r#"{"name":"ada","age":36}"#);
        let mut queue = TaskQueue::new();
        let dispatcher = Dispatcher::new(transport.clone())
            .response_handling(ResponseHandling::on_calling_context(queue.executor()));

        let result = Arc::new(Mutex::new(None));
        let sink = result.clone();
        dispatcher
            .execute_decoded::<Json<User>, _, _>(
                get_request(),
                move |Json(user)| *sink.lock().unwrap() = Some(Ok(user)),
                {
                    let sink = result.clone();
                    move |e| *sink.lock().unwrap() = Some(Err(e))
                },
            )
            .await
            .unwrap();

        assert!(result.lock().unwrap().is_none());
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(
            result.lock().unwrap().take(),
            Some(Ok(User {
                name: "ada".to_string(),
                age: 36
            }))
        );
        assert_eq!(
            transport.seen.lock().unwrap()[0].url().as_str(),
            "http://api.com/api/user/1"
        );
    }

    #[tokio::test]
    async fn test_background_delivery_runs_on_completion() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, "ok"));
        let (tx, rx) = oneshot::channel();

        dispatcher.execute(get_request(), move || tx.send(()).unwrap(), |e| panic!("{}", e));

        rx.await.unwrap();
    }

    #[tokio::test]
    async fn test_not_found_is_http_error() {
        let dispatcher = Dispatcher::new(StubTransport::respond(404, "no such user"))
            .response_handling(ResponseHandling::on_calling_context(InlineExecutor));
        let (tx, rx) = oneshot::channel();

        dispatcher.execute_decoded::<Json<User>, _, _>(
            get_request(),
            |_| panic!("unexpected success"),
            move |e| tx.send(e).unwrap(),
        );

        let err = rx.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::HttpError);
        assert_eq!(err.status(), 404);
        assert_eq!(err.message(), "no such user");
    }

    #[tokio::test]
    async fn test_non_200_success_codes_are_errors() {
        let dispatcher = Dispatcher::new(StubTransport::respond(201, "created"));
        let err = dispatcher.send(&get_request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HttpError);
        assert_eq!(err.status(), 201);
    }

    #[tokio::test]
    async fn test_transport_failure_is_timed_out() {
        let dispatcher = Dispatcher::new(StubTransport::unreachable());
        let (tx, rx) = oneshot::channel();

        dispatcher.execute(get_request(), || panic!("unexpected success"), move |e| tx.send(e).unwrap());

        let err = rx.await.unwrap();
        assert_eq!(err.kind(), ErrorKind::RequestTimedOut);
        assert_eq!(err.status(), 0);
        assert!(err.message().contains("network connection was lost"));
    }

    #[tokio::test]
    async fn test_empty_body_is_parsing_error() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, ""));
        let err = dispatcher.fetch::<Vec<u8>>(&get_request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JsonParsingError);
        assert_eq!(err.status(), 200);
        assert_eq!(err.message(), "");
    }

    #[tokio::test]
    async fn test_unit_execute_ignores_empty_body() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, ""));
        let (tx, rx) = oneshot::channel();

        dispatcher.execute(get_request(), move || tx.send(true).unwrap(), |e| panic!("{}", e));

        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_json_is_parsing_error() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, "{not json"));
        let err = dispatcher.fetch::<Json<User>>(&get_request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JsonParsingError);
        assert_eq!(err.status(), 200);
        assert!(!err.message().is_empty());
    }

    #[tokio::test]
    async fn test_text_and_bytes_decoding() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, r#""token-123""#));
        let request = get_request();

        let text: String = dispatcher.fetch(&request).await.unwrap();
        assert_eq!(text, "token-123");

        let raw: Vec<u8> = dispatcher.fetch(&request).await.unwrap();
        assert_eq!(raw, br#""token-123""#.to_vec());

        let verbatim = dispatcher.clone().decode_options(DecodeOptions {
            unquote_text_responses: false,
        });
        let text: String = verbatim.fetch(&request).await.unwrap();
        assert_eq!(text, r#""token-123""#);
    }

    #[tokio::test]
    async fn test_post_body_reaches_transport() {
        let transport = StubTransport::respond(200, "{}");
        let dispatcher = Dispatcher::new(transport.clone());
        let request = RequestBuilder::new(Method::POST, "http://api.com/", "token")
            .add_field("username", "bob")
            .build()
            .unwrap();

        dispatcher.send(&request).await.unwrap();

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].method(), &Method::POST);
        assert_eq!(seen[0].body(), Some(&b"username=bob"[..]));
    }

    #[test]
    #[should_panic]
    fn test_execute_requires_a_runtime() {
        let dispatcher = Dispatcher::new(StubTransport::respond(200, "ok"));
        dispatcher.execute(get_request(), || {}, |_| {});
    }

    #[test]
    fn test_debug_output() {
        let dispatcher = Dispatcher::new(StubTransport::unreachable());
        let debug = format!("{:?}", dispatcher);
        assert!(debug.contains("stub"));
        assert!(debug.contains("OnBackgroundContext"));
    }
}
