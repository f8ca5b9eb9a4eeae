//! In-memory transport for tests
//!
//! `MockTransport` implements [`Transport`] without any network: responses
//! are registered per `(method, url)` and every request is recorded so tests
//! can assert on call counts and payloads.
//!
//! ```ignore
//! let mock = MockTransport::new();
//! mock.respond(Method::GET, "http://x/Regions", ApiResponse::json(200, &json!({"regions": []})));
//! let context = Context::new(services, mock.clone().into_shared());
//! ```

use super::http::{ApiRequest, ApiResponse, Transport};
use crate::error::{Result, SdkError};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Routes {
    /// One-shot replies, consumed before the sticky reply
    queued: HashMap<(Method, String), VecDeque<Result<ApiResponse>>>,
    sticky: HashMap<(Method, String), Result<ApiResponse>>,
    requests: Vec<ApiRequest>,
}

/// Scripted transport; clones share the same routes and request log
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Routes>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> Arc<dyn Transport> {
        Arc::new(self)
    }

    fn routes(&self) -> std::sync::MutexGuard<'_, Routes> {
        // A panic while holding the lock only happens inside a failing test
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reply to every matching request with `response`
    pub fn respond(&self, method: Method, url: &str, response: ApiResponse) {
        self.routes()
            .sticky
            .insert((method, url.to_string()), Ok(response));
    }

    /// Reply to the next matching request only
    pub fn respond_once(&self, method: Method, url: &str, response: ApiResponse) {
        self.routes()
            .queued
            .entry((method, url.to_string()))
            .or_default()
            .push_back(Ok(response));
    }

    /// Fail every matching request as undeliverable
    pub fn fail(&self, method: Method, url: &str, message: &str) {
        self.routes().sticky.insert(
            (method, url.to_string()),
            Err(SdkError::Transport(message.to_string())),
        );
    }

    /// Fail the next matching request as undeliverable
    pub fn fail_once(&self, method: Method, url: &str, message: &str) {
        self.routes()
            .queued
            .entry((method, url.to_string()))
            .or_default()
            .push_back(Err(SdkError::Transport(message.to_string())));
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.routes().requests.clone()
    }

    /// Number of requests received for `(method, url)`
    pub fn calls(&self, method: &Method, url: &str) -> usize {
        self.routes()
            .requests
            .iter()
            .filter(|r| &r.method == method && r.url == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.routes().requests.len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut routes = self.routes();
        let key = (request.method.clone(), request.url.clone());
        routes.requests.push(request);

        if let Some(reply) = routes.queued.get_mut(&key).and_then(|q| q.pop_front()) {
            return reply;
        }

        match routes.sticky.get(&key) {
            Some(reply) => reply.clone(),
            None => Ok(ApiResponse::new(404, format!("no route for {} {}", key.0, key.1))),
        }
    }
}
