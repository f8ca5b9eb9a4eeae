//! Resource abstraction layer
//!
//! This module provides the two client patterns used for every CommServe
//! entity type: refreshable name-keyed collections and single-endpoint
//! gateways. Collection definitions are loaded from JSON at compile time, so
//! new entity types can be added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches collection definitions from embedded JSON
//! - [`descriptor`] - Immutable snapshot of one entity
//! - [`fetcher`] - Listing strategy for collections (swappable in tests)
//! - [`collection`] - Name-keyed cache with lookup, add, delete and refresh
//! - [`gateway`] - Typed request/response wrapper around one endpoint
//!
//! # Example
//!
//! ```ignore
//! use cvsdk::resource::{get_collection, ResourceCollection, ServiceFetcher};
//!
//! async fn regions(context: Arc<Context>) -> cvsdk::Result<()> {
//!     let def = get_collection("regions").unwrap().clone();
//!     let mut regions = ResourceCollection::open(context, def, ServiceFetcher).await?;
//!     regions.delete("emea").await?;
//!     Ok(())
//! }
//! ```

pub mod collection;
pub mod descriptor;
pub mod fetcher;
pub mod gateway;
mod registry;

pub use collection::{normalize, ResourceCollection};
pub use descriptor::{extract_json_value, ResourceDescriptor, UNKNOWN_ID};
pub use fetcher::{parse_listing, Fetcher, Listing, ServiceFetcher};
pub use gateway::{Gateway, RequestChecks};
pub use registry::*;
