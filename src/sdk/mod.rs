//! CommServe API plumbing
//!
//! The session-level collaborators shared by collections and gateways.
//!
//! # Module Structure
//!
//! - [`http`] - Transport seam and the reqwest-backed HTTP transport
//! - [`services`] - Service address table (logical name -> URL)
//! - [`context`] - Shared session context (service table + transport)
//! - [`testing`] - In-memory transport for tests
//!
//! # Example
//!
//! ```ignore
//! use cvsdk::sdk::{Context, HttpTransport, ServiceTable};
//!
//! let services = ServiceTable::new("https://commserve.example.com/webconsole/api/")?;
//! let context = Context::new(services, Arc::new(HttpTransport::new()?));
//! ```

pub mod context;
pub mod http;
pub mod services;
pub mod testing;

pub use context::Context;
pub use http::{ApiRequest, ApiResponse, HttpSettings, HttpTransport, Transport};
pub use services::ServiceTable;
