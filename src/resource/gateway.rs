//! Resource Gateway
//!
//! Typed request/response wrapper around one logical server endpoint.

use crate::error::{Result, SdkError};
use crate::sdk::{ApiRequest, Context};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Post-decode checks applied by [`Gateway::perform_checked`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestChecks {
    /// Reject a null/empty JSON body
    pub empty_check: bool,
    /// Reject a body reporting a non-zero `errorCode`/`resultCode`
    pub error_check: bool,
}

impl RequestChecks {
    /// Defaults for a method: GET listings rarely carry error codes
    pub fn for_method(method: &Method) -> Self {
        Self {
            empty_check: true,
            error_check: *method != Method::GET,
        }
    }

    pub fn none() -> Self {
        Self {
            empty_check: false,
            error_check: false,
        }
    }
}

/// Stateless wrapper of one endpoint, resolved once at construction
#[derive(Debug, Clone)]
pub struct Gateway {
    context: Arc<Context>,
    service: String,
    endpoint: String,
}

impl Gateway {
    /// Resolve `service_key` from the context's service table
    ///
    /// Fails with [`SdkError::Configuration`] if the key is unknown; no
    /// request is sent.
    pub fn new(context: Arc<Context>, service_key: &str) -> Result<Self> {
        let endpoint = context.resolve(service_key)?.to_string();
        Ok(Self {
            context,
            service: service_key.to_string(),
            endpoint,
        })
    }

    /// Resolve `service_key` and fill its `%s` placeholders with `params`
    pub fn with_params(context: Arc<Context>, service_key: &str, params: &[&str]) -> Result<Self> {
        let endpoint = context.resolve_with(service_key, params)?;
        Ok(Self {
            context,
            service: service_key.to_string(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Send one request and return the decoded JSON body as-is
    pub async fn perform(&self, action: Method, payload: Option<&Value>) -> Result<Value> {
        tracing::debug!("perform: service={}, method={}", self.service, action);

        let request = ApiRequest::new(action, self.endpoint.clone(), payload.cloned());
        let response = self.context.send(request).await?;

        if !response.is_success() {
            return Err(SdkError::request_failed(
                Some(response.status),
                response.error_detail(),
            ));
        }

        response.decode_json()
    }

    /// [`perform`](Self::perform) followed by the given body checks
    pub async fn perform_checked(
        &self,
        action: Method,
        payload: Option<&Value>,
        checks: RequestChecks,
    ) -> Result<Value> {
        let body = self.perform(action, payload).await?;

        if checks.empty_check && is_empty_body(&body) {
            return Err(SdkError::request_failed(None, "Empty response from server"));
        }

        if checks.error_check {
            if let Some((code, message)) = read_error(&body) {
                tracing::error!("{} reported error {}: {}", self.service, code, message);
                return Err(SdkError::request_failed(
                    None,
                    format!("[{}: {}]", code, message),
                ));
            }
        }

        Ok(body)
    }
}

fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(arr) => arr.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Read a non-zero error code and its message from a response body
///
/// Looks inside a nested `error` object first. A body without any code is
/// treated as success.
fn read_error(body: &Value) -> Option<(i64, String)> {
    let node = match body.get("error") {
        Some(inner @ Value::Object(_)) => inner,
        _ => body,
    };

    let code = ["errorCode", "resultCode"]
        .iter()
        .find_map(|key| node.get(*key))
        .and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })?;

    if code == 0 {
        return None;
    }

    let message = ["errorMessage", "errorString", "resultMessage"]
        .iter()
        .find_map(|key| node.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("No error message in response")
        .to_string();

    Some((code, message))
}
