//! Typed client for CommServe backup server REST APIs
//!
//! Two patterns cover every entity type the server exposes:
//!
//! - [`ResourceCollection`]: name-keyed, refreshable cache of one entity
//!   type (domains, regions, user groups, ...)
//! - [`Gateway`]: typed request/response wrapper around one endpoint
//!
//! Both share a [`Context`] holding the service address table and the
//! transport.
//!
//! # Example
//!
//! ```rust,no_run
//! use cvsdk::{Context, Gateway, HttpTransport, Method, ServiceTable};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cvsdk::Result<()> {
//!     let services = ServiceTable::new("https://commserve.example.com/webconsole/api/")?;
//!     let context = Arc::new(Context::new(services, Arc::new(HttpTransport::new()?)));
//!
//!     let certificates = Gateway::new(context.clone(), "CERTIFICATES")?;
//!     let body = certificates.perform(Method::GET, None).await?;
//!     println!("{}", body);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod resource;
pub mod sdk;

pub use error::{Result, SdkError};
pub use reqwest::Method;
pub use resource::{
    get_collection, CollectionDef, Fetcher, Gateway, Listing, RequestChecks, ResourceCollection,
    ResourceDescriptor, ServiceFetcher,
};
pub use sdk::{ApiRequest, ApiResponse, Context, HttpSettings, HttpTransport, ServiceTable, Transport};
