//! Deterministic test double for [`Transport`].
//!
//! Responses are canned per endpoint. Every call is recorded so tests can
//! assert on the exact wire body that would have been sent.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{BoxFuture, Method, RequestBody, Transport};
use crate::error::ClientError;

/// How the fake answers a given endpoint.
pub enum FakeResponse {
    Json(Value),
    /// Produces a fresh error on every call; `ClientError` is not `Clone`.
    Fail(Box<dyn Fn() -> ClientError + Send + Sync>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: Method,
    pub endpoint: String,
    pub body: RequestBody,
}

#[derive(Default)]
pub struct FakeTransport {
    responses: Mutex<HashMap<String, FakeResponse>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a JSON response for `endpoint`.
    pub fn with_json(self, endpoint: &str, body: Value) -> Self {
        self.respond(endpoint, FakeResponse::Json(body));
        self
    }

    /// Seed a failure for `endpoint`.
    pub fn with_error<F>(self, endpoint: &str, make: F) -> Self
    where
        F: Fn() -> ClientError + Send + Sync + 'static,
    {
        self.respond(endpoint, FakeResponse::Fail(Box::new(make)));
        self
    }

    pub fn respond(&self, endpoint: &str, response: FakeResponse) {
        let mut responses = match self.responses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        responses.insert(endpoint.to_string(), response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls().pop()
    }

    fn answer(&self, method: Method, endpoint: &str, body: RequestBody) -> Result<Value, ClientError> {
        {
            let mut calls = match self.calls.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            calls.push(RecordedCall {
                method,
                endpoint: endpoint.to_string(),
                body,
            });
        }

        let responses = match self.responses.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match responses.get(endpoint) {
            Some(FakeResponse::Json(value)) => Ok(value.clone()),
            Some(FakeResponse::Fail(make)) => Err(make()),
            None => Err(ClientError::Status {
                status: 404,
                detail: format!("no such command: {}", endpoint),
            }),
        }
    }
}

impl Transport for FakeTransport {
    fn invoke<'a>(
        &'a self,
        method: Method,
        endpoint: &'a str,
        body: RequestBody,
    ) -> BoxFuture<'a, Result<Value, ClientError>> {
        let result = self.answer(method, endpoint, body);
        Box::pin(async move { result })
    }
}
