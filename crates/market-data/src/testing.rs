//! In-memory HTTP transport for facade and router tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::errors::MarketDataError;
use crate::provider::{HttpRequest, HttpTransport};

#[derive(Clone, Debug)]
enum Canned {
    Json(Value),
    Fail(String),
}

/// A request the stub received.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub provider: String,
    pub request: HttpRequest,
    pub at: Instant,
}

/// Answers each provider with a canned body and records every call.
///
/// Providers without a canned answer fail as unreachable.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Canned>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `provider` with `body`.
    pub fn respond(self, provider: &str, body: Value) -> Self {
        lock(&self.routes).insert(provider.to_string(), Canned::Json(body));
        self
    }

    /// Fail every request to `provider` with a request error.
    pub fn fail(self, provider: &str, message: &str) -> Self {
        lock(&self.routes).insert(provider.to_string(), Canned::Fail(message.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Providers called, in call order.
    pub fn called_providers(&self) -> Vec<String> {
        lock(&self.calls).iter().map(|c| c.provider.clone()).collect()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn get_json(&self, provider: &str, request: &HttpRequest) -> Result<Value, MarketDataError> {
        lock(&self.calls).push(RecordedCall {
            provider: provider.to_string(),
            request: request.clone(),
            at: Instant::now(),
        });

        let canned = lock(&self.routes).get(provider).cloned();
        match canned {
            Some(Canned::Json(body)) => Ok(body),
            Some(Canned::Fail(message)) => Err(MarketDataError::request(provider, message)),
            None => Err(MarketDataError::request(provider, "connection refused")),
        }
    }
}
