//! Collection Registry - Load collection definitions from JSON
//!
//! This module loads the resource collection definitions from an embedded
//! JSON file and provides lookup functions for the rest of the crate.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded collection JSON file (compiled into the binary)
const COLLECTIONS_FILE: &str = include_str!("../resources/collections.json");

/// How one entity type is listed, created and deleted on the server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionDef {
    /// Logical type name used in messages ("Domain", "Region", ...)
    pub display_name: String,
    /// Service key of the listing endpoint
    pub list_service: String,
    /// Dot path to the item array in the listing response; empty = root
    #[serde(default)]
    pub response_path: String,
    /// Dot path to the entity name inside one item
    pub name_path: String,
    /// Dot path to the entity id inside one item
    pub id_path: String,
    /// Service key of the create endpoint (POST)
    #[serde(default)]
    pub create_service: Option<String>,
    /// Service key of the delete endpoint (DELETE, one `%s` for the id)
    #[serde(default)]
    pub delete_service: Option<String>,
}

impl CollectionDef {
    /// Minimal definition: listing only, items keyed by `name` and `id`
    pub fn new(display_name: &str, list_service: &str, response_path: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            list_service: list_service.to_string(),
            response_path: response_path.to_string(),
            name_path: "name".to_string(),
            id_path: "id".to_string(),
            create_service: None,
            delete_service: None,
        }
    }

    pub fn with_paths(mut self, name_path: &str, id_path: &str) -> Self {
        self.name_path = name_path.to_string();
        self.id_path = id_path.to_string();
        self
    }

    pub fn with_create(mut self, service: &str) -> Self {
        self.create_service = Some(service.to_string());
        self
    }

    pub fn with_delete(mut self, service: &str) -> Self {
        self.delete_service = Some(service.to_string());
        self
    }
}

/// Root structure of resources/collections.json
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub collections: HashMap<String, CollectionDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<CollectionConfig> = OnceLock::new();

/// Get the collection registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static CollectionConfig {
    REGISTRY.get_or_init(|| {
        serde_json::from_str(COLLECTIONS_FILE)
            .unwrap_or_else(|e| panic!("Failed to parse embedded collection JSON: {}", e))
    })
}

/// Get a collection definition by key
pub fn get_collection(key: &str) -> Option<&'static CollectionDef> {
    get_registry().collections.get(key)
}

/// Get all collection keys, sorted (for the CLI listing)
pub fn get_all_collection_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = get_registry()
        .collections
        .keys()
        .map(|s| s.as_str())
        .collect();
    keys.sort_unstable();
    keys
}
