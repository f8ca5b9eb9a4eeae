//! HTTP transport for CommServe REST API calls

use crate::error::{Result, SdkError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header carrying the session token issued by the CommServe login
const AUTH_TOKEN_HEADER: &str = "Authtoken";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
pub(crate) fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// One request handed to a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub payload: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            method,
            url: url.into(),
            payload,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, None)
    }

    pub fn post(url: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::POST, url, Some(payload))
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url, None)
    }
}

/// A delivered response: status plus the raw body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// e.g. "500 Internal Server Error"
    pub status_line: String,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            status_line: status_line(status),
            body: body.into(),
        }
    }

    /// Build a response with a JSON body
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON. An empty body (e.g. 204) decodes to `Null`.
    pub fn decode_json(&self) -> Result<Value> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&self.body).map_err(|e| {
            SdkError::request_failed(
                Some(self.status),
                format!("Failed to parse response JSON: {}", e),
            )
        })
    }

    /// Best human-readable failure detail carried by this response
    ///
    /// Order: JSON `error`/`errorMessage` field, then the `<title>` of an
    /// HTML error page, then the raw status line.
    pub fn error_detail(&self) -> String {
        if let Ok(body) = serde_json::from_str::<Value>(&self.body) {
            if let Some(detail) = json_error_detail(&body) {
                return detail;
            }
        }

        if let Some(title) = html_title(&self.body) {
            return title;
        }

        self.status_line.clone()
    }
}

fn status_line(status: u16) -> String {
    match StatusCode::from_u16(status) {
        Ok(code) => code.to_string(),
        Err(_) => status.to_string(),
    }
}

fn json_error_detail(body: &Value) -> Option<String> {
    let obj = body.as_object()?;

    if let Some(error) = obj.get("error") {
        match error {
            Value::String(s) if !s.is_empty() => return Some(s.clone()),
            Value::Object(inner) => {
                for key in ["errorMessage", "message", "errorString"] {
                    if let Some(s) = inner.get(key).and_then(|v| v.as_str()) {
                        return Some(s.to_string());
                    }
                }
            },
            _ => {},
        }
    }

    ["errorMessage", "errorString"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

fn html_title(body: &str) -> Option<String> {
    let start = body.find("<title>")? + "<title>".len();
    let end = body[start..].find("</title>")? + start;
    let title = body[start..end].trim();
    (!title.is_empty()).then(|| title.to_string())
}

/// Sends requests to the server
///
/// Implementations must be safe to share between collections and gateways.
/// A failure to deliver the request is reported as [`SdkError::Transport`];
/// any delivered response, whatever its status, is `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Settings for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub auth_token: Option<String>,
    /// PEM CA certificate trusted for https servers
    pub certificate_path: Option<PathBuf>,
    pub verify_ssl: bool,
    /// Whether the server is reached over https
    pub https: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            auth_token: None,
            certificate_path: None,
            verify_ssl: true,
            https: true,
        }
    }
}

/// reqwest-backed transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&HttpSettings::default())
    }

    pub fn with_settings(settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &settings.auth_token {
            let value = HeaderValue::from_str(token)
                .map_err(|e| SdkError::configuration(format!("Invalid auth token: {}", e)))?;
            headers.insert(AUTH_TOKEN_HEADER, value);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("cvsdk/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout)
            .connect_timeout(settings.connect_timeout)
            .default_headers(headers);

        // The CA certificate only applies to https servers; otherwise verify_ssl decides
        match (&settings.certificate_path, settings.https) {
            (Some(path), true) => {
                let pem = std::fs::read(path).map_err(|e| {
                    SdkError::configuration(format!(
                        "Failed to read certificate {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    SdkError::configuration(format!(
                        "Invalid certificate {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                builder = builder.add_root_certificate(certificate);
            },
            _ => {
                if !settings.verify_ssl {
                    tracing::warn!("TLS certificate verification is disabled");
                    builder = builder.danger_accept_invalid_certs(true);
                }
            },
        }

        let client = builder
            .build()
            .map_err(|e| SdkError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        tracing::debug!("{} {}", request.method, request.url);

        let mut builder = self.client.request(request.method.clone(), &request.url);
        if let Some(payload) = &request.payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            status_line: status.to_string(),
            body,
        })
    }
}
