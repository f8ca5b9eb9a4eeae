//! Service address table
//!
//! Maps logical service names (`"CERTIFICATES"`, `"REGIONS"`, ...) to the
//! URLs of one CommServe. Templates are embedded at compile time and carry a
//! `{0}` placeholder for the web-service base URL, plus optional positional
//! `%s` placeholders filled per request.

use crate::error::{Result, SdkError};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded service templates (compiled into the binary)
const SERVICES_FILE: &str = include_str!("../resources/services.json");

/// Placeholder replaced by the base URL
const BASE_PLACEHOLDER: &str = "{0}";

/// Positional request parameter placeholder
const PARAM_PLACEHOLDER: &str = "%s";

static TEMPLATES: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Get the embedded service templates (parsed on first access)
pub fn service_templates() -> &'static HashMap<String, String> {
    TEMPLATES.get_or_init(|| {
        serde_json::from_str(SERVICES_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded services JSON: {}", e))
    })
}

/// Resolved service addresses for one server
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTable {
    base_url: Option<String>,
    services: HashMap<String, String>,
}

impl ServiceTable {
    /// Build the table for `base_url` from the embedded templates
    ///
    /// `base_url` must be an absolute http(s) URL; a trailing `/` is added if
    /// missing so templates can append path segments directly.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_templates(base_url, service_templates())
    }

    /// Build the table for `base_url` from explicit templates
    pub fn with_templates(base_url: &str, templates: &HashMap<String, String>) -> Result<Self> {
        let base = normalize_base_url(base_url)?;
        let services = templates
            .iter()
            .map(|(key, template)| (key.clone(), template.replace(BASE_PLACEHOLDER, &base)))
            .collect();

        Ok(Self {
            base_url: Some(base),
            services,
        })
    }

    /// Table from already-resolved addresses (no base substitution)
    pub fn from_addresses<I, K, V>(addresses: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            base_url: None,
            services: addresses
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add or replace one resolved address
    pub fn insert(&mut self, key: impl Into<String>, address: impl Into<String>) {
        self.services.insert(key.into(), address.into());
    }

    /// Add or replace one entry from a template, substituting the base URL
    pub fn insert_template(&mut self, key: impl Into<String>, template: &str) {
        let address = match &self.base_url {
            Some(base) => template.replace(BASE_PLACEHOLDER, base),
            None => template.to_string(),
        };
        self.services.insert(key.into(), address);
    }

    /// Base URL the table was built for, with a trailing `/`
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.services.contains_key(key)
    }

    /// Look up the address for a logical service name
    pub fn resolve(&self, key: &str) -> Result<&str> {
        self.services
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| SdkError::configuration(format!("Unknown service: {}", key)))
    }

    /// Look up the address and fill its `%s` placeholders, in order
    pub fn resolve_with(&self, key: &str, params: &[&str]) -> Result<String> {
        fill_params(key, self.resolve(key)?, params)
    }

    /// All service names, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.services.keys().map(|s| s.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn normalize_base_url(base_url: &str) -> Result<String> {
    let parsed = url::Url::parse(base_url)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SdkError::configuration(format!(
            "Unsupported URL scheme '{}' in {}",
            parsed.scheme(),
            base_url
        )));
    }

    let mut base = base_url.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(base)
}

/// Fill `%s` placeholders with percent-encoded params
fn fill_params(key: &str, template: &str, params: &[&str]) -> Result<String> {
    let expected = template.matches(PARAM_PLACEHOLDER).count();
    if expected != params.len() {
        return Err(SdkError::configuration(format!(
            "Service {} expects {} parameter(s), got {}",
            key,
            expected,
            params.len()
        )));
    }

    let mut filled = String::with_capacity(template.len());
    let mut rest = template;
    for param in params {
        // Count checked above, the placeholder is always present
        let Some(idx) = rest.find(PARAM_PLACEHOLDER) else {
            break;
        };
        filled.push_str(&rest[..idx]);
        filled.push_str(&urlencoding::encode(param));
        rest = &rest[idx + PARAM_PLACEHOLDER.len()..];
    }
    filled.push_str(rest);

    Ok(filled)
}
