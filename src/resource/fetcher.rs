//! Listing Fetcher
//!
//! Produces the current listing of one collection. The collection holds a
//! [`Fetcher`] instead of calling the server itself, so tests and callers
//! can swap the data source.

use super::descriptor::{lookup_path, ResourceDescriptor};
use super::gateway::{Gateway, RequestChecks};
use super::registry::CollectionDef;
use crate::error::{Result, SdkError};
use crate::sdk::Context;
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;

/// Result of one listing fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub descriptors: Vec<ResourceDescriptor>,
    /// Items dropped because they could not be mapped to a descriptor
    pub skipped: usize,
}

/// Source of the current listing of one collection
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, context: &Arc<Context>, def: &CollectionDef) -> Result<Listing>;
}

/// Fetches the listing from the definition's list service
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceFetcher;

/// Listings may be empty, but a non-zero error code in the body is a failure
const LISTING_CHECKS: RequestChecks = RequestChecks {
    empty_check: false,
    error_check: true,
};

#[async_trait]
impl Fetcher for ServiceFetcher {
    async fn fetch(&self, context: &Arc<Context>, def: &CollectionDef) -> Result<Listing> {
        let gateway = Gateway::new(context.clone(), &def.list_service)?;
        let body = gateway
            .perform_checked(Method::GET, None, LISTING_CHECKS)
            .await?;
        let listing = parse_listing(&body, def)?;

        if listing.skipped > 0 {
            tracing::warn!(
                "{}: skipped {} malformed item(s) from {}",
                def.display_name,
                listing.skipped,
                def.list_service
            );
        }
        tracing::debug!(
            "{}: fetched {} item(s)",
            def.display_name,
            listing.descriptors.len()
        );

        Ok(listing)
    }
}

/// Map a listing response body to descriptors
///
/// A body without the response path (or a null/empty body) is an empty
/// listing: the server omits the key when no entity exists.
pub fn parse_listing(body: &Value, def: &CollectionDef) -> Result<Listing> {
    let items = match lookup_path(body, &def.response_path) {
        None | Some(Value::Null) => return Ok(Listing::default()),
        Some(Value::Array(items)) => items,
        Some(Value::Object(map)) if def.response_path.is_empty() && map.is_empty() => {
            return Ok(Listing::default())
        },
        Some(_) => {
            return Err(SdkError::request_failed(
                None,
                format!(
                    "Unexpected listing shape for {}: '{}' is not an array",
                    def.display_name, def.response_path
                ),
            ))
        },
    };

    let mut listing = Listing::default();
    for item in items {
        match ResourceDescriptor::from_item(item, def) {
            Some(descriptor) => listing.descriptors.push(descriptor),
            None => listing.skipped += 1,
        }
    }

    Ok(listing)
}
