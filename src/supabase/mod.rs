//! Client for the managed backend: PostgREST rows, GoTrue auth, and object storage.
//!
//! All durable state lives behind this client. Requests use the service-role
//! key; owner scoping is applied explicitly by the query layer.

mod auth;
mod rest;
mod storage;

pub use auth::*;
pub use rest::*;

use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response};

use crate::error::{AppError, Result};

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    pub jwt_secret: String,
    pub storage_bucket: String,
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    config: Arc<SupabaseConfig>,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self {
            http: Client::new(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.url, path)
    }

    /// Request authorized with the service-role key.
    fn privileged(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.service_role_key)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.service_role_key),
            )
    }

    /// Request made on behalf of a signed-in user.
    fn as_user(&self, method: reqwest::Method, path: &str, access_token: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
    }

    /// Request with only the public key (auth flows that precede a session).
    fn public(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.config.anon_key)
    }
}

/// Turn a non-2xx response into an upstream error carrying the body text.
async fn check_status(response: Response, what: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Upstream(format!("{} failed: {} - {}", what, status, body)))
}
