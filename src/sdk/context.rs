//! Session context
//!
//! Shared by every collection and gateway talking to one CommServe: the
//! resolved service table plus the transport used to reach it.

use super::http::{ApiRequest, ApiResponse, HttpSettings, HttpTransport, Transport};
use super::services::ServiceTable;
use crate::config::Config;
use crate::error::Result;
use std::fmt;
use std::sync::Arc;

/// Shared session context
#[derive(Clone)]
pub struct Context {
    services: ServiceTable,
    transport: Arc<dyn Transport>,
}

impl Context {
    pub fn new(services: ServiceTable, transport: Arc<dyn Transport>) -> Self {
        Self {
            services,
            transport,
        }
    }

    /// Build a context from configuration: service table for the configured
    /// server (with config overrides) and an HTTP transport.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.effective_base_url()?;
        let mut services = ServiceTable::new(&base_url)?;
        for (key, template) in &config.services {
            services.insert_template(key.clone(), template);
        }

        let settings = HttpSettings {
            https: base_url.starts_with("https://"),
            ..config.http_settings()
        };
        let transport = HttpTransport::with_settings(&settings)?;

        tracing::info!("Context ready for {} ({} services)", base_url, services.len());

        Ok(Self::new(services, Arc::new(transport)))
    }

    pub fn services(&self) -> &ServiceTable {
        &self.services
    }

    /// Resolve a logical service name to its address
    pub fn resolve(&self, key: &str) -> Result<&str> {
        self.services.resolve(key)
    }

    /// Resolve a logical service name and fill its `%s` placeholders
    pub fn resolve_with(&self, key: &str, params: &[&str]) -> Result<String> {
        self.services.resolve_with(key, params)
    }

    /// Send one request through the shared transport
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.transport.send(request).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("base_url", &self.services.base_url())
            .field("services", &self.services.len())
            .finish_non_exhaustive()
    }
}
