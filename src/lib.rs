//! restkit - a fluent REST request builder and callback-based dispatcher
//!
//! Requests are assembled with a [`RequestBuilder`], frozen into an immutable
//! [`Request`], and run by a [`Dispatcher`] that classifies the outcome,
//! decodes the body and calls back on the execution context you chose.
//!
//! ## Features
//!
//! - **Fluent builder** for headers, query and path parameters
//! - **Form, JSON and multipart** request bodies
//! - **Typed decoding** of raw bytes, text or JSON responses
//! - **Explicit execution contexts** for success and failure callbacks
//! - **Pluggable transport**, reqwest by default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use restkit::{Client, ClientConfig, Json, TaskQueue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .base_url("https://httpbin.org/")
//!         .default_header("Accept", "application/json")
//!         .build()?;
//!
//!     let mut queue = TaskQueue::new();
//!     let client = Client::builder(config).calling_context(queue.executor()).build();
//!
//!     let request = client.get("anything/{id}").add_path("id", 7).build()?;
//!     client.execute_decoded::<Json<serde_json::Value>, _, _>(
//!         request,
//!         |Json(body)| println!("{}", body),
//!         |err| eprintln!("{}", err),
//!     );
//!
//!     queue.run_next().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod multipart;
pub mod request;
pub mod response;
pub mod transport;

// Re-export main types for convenience
pub use api::Api;
pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dispatcher::{Dispatcher, ResponseHandling};
pub use error::{Error, ErrorKind, RestClientError, Result};
pub use executor::{Executor, InlineExecutor, QueueExecutor, RuntimeExecutor, TaskQueue};
pub use multipart::Media;
pub use request::{Request, RequestBuilder};
pub use response::{DecodeOptions, FromResponse, Json, Response};
pub use transport::{HttpTransport, Transport};

// Re-export common HTTP types
pub use http::{HeaderMap, Method, StatusCode};

// Re-export URL types
pub use url::Url;
