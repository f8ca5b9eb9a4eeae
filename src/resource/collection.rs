//! Resource Collection
//!
//! Name-keyed cache of one entity type, populated from a listing fetch and
//! refreshed on demand. Names compare case-insensitively.

use super::descriptor::{insert_path, ResourceDescriptor};
use super::fetcher::{Fetcher, ServiceFetcher};
use super::gateway::{Gateway, RequestChecks};
use super::registry::CollectionDef;
use crate::error::{Result, SdkError};
use crate::sdk::Context;
use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Checks for mutations: creation and deletion may answer with an empty body
const MUTATION_CHECKS: RequestChecks = RequestChecks {
    empty_check: false,
    error_check: true,
};

/// Key used for name lookups
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Cache of one entity type
///
/// `refresh`, `add` and `delete` take `&mut self`; share one instance across
/// tasks behind a `tokio::sync::Mutex`.
pub struct ResourceCollection<F: Fetcher = ServiceFetcher> {
    context: Arc<Context>,
    def: CollectionDef,
    fetcher: F,
    entries: HashMap<String, ResourceDescriptor>,
    skipped: usize,
}

impl<F: Fetcher> ResourceCollection<F> {
    /// Empty collection, no I/O
    pub fn new(context: Arc<Context>, def: CollectionDef, fetcher: F) -> Self {
        Self {
            context,
            def,
            fetcher,
            entries: HashMap::new(),
            skipped: 0,
        }
    }

    /// Build the collection and load the current listing
    pub async fn open(context: Arc<Context>, def: CollectionDef, fetcher: F) -> Result<Self> {
        let mut collection = Self::new(context, def, fetcher);
        collection.refresh().await?;
        Ok(collection)
    }

    /// Logical type name ("Domain", "Region", ...)
    pub fn kind(&self) -> &str {
        &self.def.display_name
    }

    pub fn definition(&self) -> &CollectionDef {
        &self.def
    }

    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&normalize(name))
    }

    pub fn get(&self, name: &str) -> Result<&ResourceDescriptor> {
        self.entries
            .get(&normalize(name))
            .ok_or_else(|| SdkError::not_found(&self.def.display_name, name))
    }

    /// Look up an entry by its server id
    pub fn get_by_id(&self, id: &str) -> Result<&ResourceDescriptor> {
        self.entries
            .values()
            .find(|d| d.id() == id)
            .ok_or_else(|| SdkError::not_found(&self.def.display_name, id))
    }

    /// Create an entity on the server and cache it
    ///
    /// `parameters` must be a JSON object (or null); the name is written at
    /// the definition's name path before the request is sent. A name already
    /// in the collection is rejected without a request.
    pub async fn add(&mut self, name: &str, parameters: Value) -> Result<ResourceDescriptor> {
        let Some(service) = self.def.create_service.as_deref() else {
            return Err(SdkError::configuration(format!(
                "{} collection does not support creation",
                self.def.display_name
            )));
        };

        if self.has(name) {
            return Err(SdkError::already_exists(&self.def.display_name, name.trim()));
        }

        let mut payload = match parameters {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => {
                return Err(SdkError::configuration(format!(
                    "{} parameters must be a JSON object",
                    self.def.display_name
                )))
            },
        };
        insert_path(&mut payload, &self.def.name_path, Value::String(name.trim().to_string()));
        let payload = Value::Object(payload);

        let gateway = Gateway::new(self.context.clone(), service)?;
        let body = gateway
            .perform_checked(Method::POST, Some(&payload), MUTATION_CHECKS)
            .await?;

        let descriptor = match self.server_record(name, &body) {
            Some(record) => {
                self.entries.insert(normalize(name), record.clone());
                record
            },
            None => {
                // Reply carries no usable record: take the entry from a fresh listing
                self.refresh().await?;
                self.get(name)?.clone()
            },
        };

        tracing::info!(
            "{} '{}' created (id {})",
            self.def.display_name,
            descriptor.name(),
            descriptor.id()
        );

        Ok(descriptor)
    }

    /// The created entity as returned in the reply, if it carries its name and id
    fn server_record(&self, name: &str, body: &Value) -> Option<ResourceDescriptor> {
        ResourceDescriptor::from_item(body, &self.def)
            .filter(|record| record.has_id() && normalize(record.name()) == normalize(name))
    }

    /// Delete an entity on the server, then drop it from the cache
    ///
    /// An unknown name fails with [`SdkError::NotFound`] and an entry listed
    /// without an id with [`SdkError::Configuration`], both before any
    /// request. On a failed request the cached entry is kept.
    pub async fn delete(&mut self, name: &str) -> Result<()> {
        let entry = self.get(name)?;
        if !entry.has_id() {
            return Err(SdkError::configuration(format!(
                "{} '{}' has no id, it cannot be deleted",
                self.def.display_name,
                entry.name()
            )));
        }
        let id = entry.id().to_string();

        let Some(service) = self.def.delete_service.as_deref() else {
            return Err(SdkError::configuration(format!(
                "{} collection does not support deletion",
                self.def.display_name
            )));
        };

        let gateway = Gateway::with_params(self.context.clone(), service, &[id.as_str()])?;
        gateway
            .perform_checked(Method::DELETE, None, MUTATION_CHECKS)
            .await?;

        self.entries.remove(&normalize(name));
        tracing::info!("{} '{}' deleted (id {})", self.def.display_name, name, id);

        Ok(())
    }

    /// Re-fetch the listing and replace the cache
    ///
    /// On failure the previous snapshot is kept and the error returned.
    pub async fn refresh(&mut self) -> Result<()> {
        let listing = self.fetcher.fetch(&self.context, &self.def).await?;

        let mut entries = HashMap::with_capacity(listing.descriptors.len());
        for descriptor in listing.descriptors {
            if let Some(previous) = entries.insert(normalize(descriptor.name()), descriptor) {
                tracing::debug!(
                    "{}: duplicate name '{}', keeping the later item",
                    self.def.display_name,
                    previous.name()
                );
            }
        }

        self.entries = entries;
        self.skipped = listing.skipped;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Items dropped as malformed by the last fetch
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Entry names as reported by the server, sorted case-insensitively
    pub fn names(&self) -> Vec<&str> {
        self.sorted().into_iter().map(|d| d.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.entries.values()
    }

    fn sorted(&self) -> Vec<&ResourceDescriptor> {
        let mut descriptors: Vec<&ResourceDescriptor> = self.entries.values().collect();
        descriptors.sort_by_key(|d| normalize(d.name()));
        descriptors
    }
}

impl<F: Fetcher> fmt::Display for ResourceCollection<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:^5}\t{:^50}", "S. No.", self.def.display_name)?;
        for (index, descriptor) in self.sorted().into_iter().enumerate() {
            write!(f, "\n{:^5}\t{:30}", index + 1, descriptor.name())?;
        }
        Ok(())
    }
}

impl<F: Fetcher> fmt::Debug for ResourceCollection<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCollection")
            .field("kind", &self.def.display_name)
            .field("entries", &self.entries.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}
