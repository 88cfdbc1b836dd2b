//! Endpoint catalog
//!
//! Each method fixes the method, path, headers and parameters of one
//! endpoint and returns the builder, ready to [`build`](RequestBuilder::build).

use std::collections::BTreeMap;
use std::sync::Arc;

use http::Method;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::multipart::Media;
use crate::request::RequestBuilder;

const JSON_HEADERS: [(&str, &str); 2] = [("Content-Type", "application/json"), ("Accept", "application/json")];

/// The endpoints of the API
#[derive(Debug, Clone)]
pub struct Api {
    config: Arc<ClientConfig>,
}

impl Api {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self { config }
    }

    /// `GET api/get?skip=..&take=..`
    pub fn get_query(&self, skip: u32, take: u32) -> RequestBuilder {
        self.authorized(Method::GET, "api/get")
            .add_query("skip", skip)
            .add_query("take", take)
    }

    /// `GET api/issue/{id}`
    pub fn get_path(&self, id: u64) -> RequestBuilder {
        self.authorized(Method::GET, "api/issue/{id}").add_path("id", id)
    }

    /// `POST token` with a password grant as form fields
    pub fn post_fields(&self, username: &str, password: &str) -> RequestBuilder {
        self.config
            .request(Method::POST, "token")
            .add_header("Content-Type", "application/x-www-form-urlencoded")
            .add_field("username", username)
            .add_field("password", password)
            .add_field("grant_type", "password")
    }

    /// `POST api/user` with `model` as the JSON body
    pub fn post_model<T>(&self, model: &T) -> RequestBuilder
    where
        T: Serialize + ?Sized,
    {
        self.authorized(Method::POST, "api/user").set_body(model)
    }

    /// `POST tempfiles` as a multipart upload
    pub fn upload_file(&self, params: Option<BTreeMap<String, String>>, media: Option<Vec<Media>>) -> RequestBuilder {
        self.config
            .request(Method::POST, "tempfiles")
            .set_multipart_data(params, media)
    }

    fn authorized(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.config.request(method, path).set_headers(JSON_HEADERS);
        match self.config.authorization() {
            Some(token) => builder.add_header("Authorization", token),
            None => builder,
        }
    }
}
