//! Remote call collaborator.
//!
//! Every accessor reaches the device through [`Transport`]. [`RestTransport`]
//! talks to the RouterOS REST API; [`fake::FakeTransport`] is the test double.

pub mod fake;

use crate::config::Config;
use crate::error::{preview_bytes, preview_chars, ClientError, DECODE_PREVIEW, ERROR_DETAIL_PREVIEW};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Wire request body: a JSON object keyed by wire names.
pub type RequestBody = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Body goes out as query parameters, see [`query_pairs`].
    Get,
    /// Body goes out as JSON.
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// Single `invoke` capability injected into every accessor.
///
/// Object-safe so it can be shared as `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    fn invoke<'a>(
        &'a self,
        method: Method,
        endpoint: &'a str,
        body: RequestBody,
    ) -> BoxFuture<'a, Result<Value, ClientError>>;
}

/// RouterOS REST transport backed by `reqwest`, using HTTP basic auth.
pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl RestTransport {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Posts an empty body to a cheap endpoint and reports whether it answered.
    pub async fn test_connection(&self) -> bool {
        match self
            .invoke(Method::Post, "/system/resource/print", RequestBody::new())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                error!("Connection test failed: {}", e);
                false
            }
        }
    }

    /// `.json` sets `Content-Type` itself, so no header is added here.
    fn request(&self, method: Method, endpoint: &str, body: &RequestBody) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let request = match method {
            Method::Get => self.client.get(&url).query(&query_pairs(body)),
            Method::Post => self.client.post(&url).json(body),
        };
        request.basic_auth(&self.username, Some(&self.password))
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> Result<Value, ClientError> {
        info!("Request: {} {}", method, endpoint);

        let response = self
            .request(method, endpoint, &body)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let detail = match response.bytes().await {
                Ok(bytes) => {
                    preview_chars(&String::from_utf8_lossy(&bytes), ERROR_DETAIL_PREVIEW)
                }
                Err(_) => String::new(),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                detail,
            });
        }

        info!(
            "Response: {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        );

        let bytes = response.bytes().await.map_err(classify)?;
        decode_body(&bytes)
    }
}

impl Transport for RestTransport {
    fn invoke<'a>(
        &'a self,
        method: Method,
        endpoint: &'a str,
        body: RequestBody,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        Box::pin(async move {
            let result = self.send(method, endpoint, body).await;
            if let Err(ref e) = result {
                error!("{} {} failed: {}", method, endpoint, e);
            }
            result
        })
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(err.to_string())
    } else if err.is_connect() {
        ClientError::Connection(err.to_string())
    } else {
        ClientError::Request(err)
    }
}

/// Flattens a body into query parameters for `GET`.
///
/// Strings are sent as-is, lists are comma-joined (the form `proplist` takes
/// on the device) and other values use their JSON text. Nulls are skipped.
pub fn query_pairs(body: &RequestBody) -> Vec<(String, String)> {
    body.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::Array(items) => items
                    .iter()
                    .map(query_text)
                    .collect::<Vec<_>>()
                    .join(","),
                other => query_text(other),
            };
            Some((key.clone(), text))
        })
        .collect()
}

fn query_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decodes a response body as JSON, keeping a bounded preview on failure.
pub fn decode_body(bytes: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice(bytes).map_err(|source| {
        let preview = preview_bytes(bytes, DECODE_PREVIEW);
        if bytes.is_empty() {
            debug!("Empty response received");
        } else {
            warn!("Invalid JSON response: {}...", preview);
        }
        ClientError::Decode { preview, source }
    })
}
