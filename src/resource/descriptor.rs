//! Resource descriptors
//!
//! Immutable snapshot of one server-side entity as reported by a listing.

use super::registry::CollectionDef;
use serde::Serialize;
use serde_json::{Map, Value};

/// Id shown for an item the server listed without one
pub const UNKNOWN_ID: &str = "-";

/// One entity: identifier, display name and the full server record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDescriptor {
    id: String,
    name: String,
    properties: Map<String, Value>,
}

impl ResourceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, properties: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            properties,
        }
    }

    /// Map one listing item through the definition's field paths
    ///
    /// Returns `None` when the item is not an object or its name is missing,
    /// empty or not a string. A missing id maps to [`UNKNOWN_ID`].
    pub fn from_item(item: &Value, def: &CollectionDef) -> Option<Self> {
        let properties = item.as_object()?;
        let name = lookup_path(item, &def.name_path)?.as_str()?.trim();
        if name.is_empty() {
            return None;
        }

        let id = lookup_path(item, &def.id_path)
            .and_then(scalar_to_string)
            .unwrap_or_else(|| UNKNOWN_ID.to_string());

        Some(Self::new(id, name, properties.clone()))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// False when the server reported no id for this entity
    pub fn has_id(&self) -> bool {
        self.id != UNKNOWN_ID
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// Property at a dot-notation path, e.g. `"company.name"`
    pub fn property(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let value = self.properties.get(head)?;
        match rest {
            Some(rest) => lookup_path(value, rest),
            None => Some(value),
        }
    }
}

/// Walk a dot-notation path; numeric segments index into arrays
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        current = match part.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

/// Write `value` at a dot-notation path, creating intermediate objects
pub fn insert_path(target: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            target.insert(path.to_string(), value);
        },
        Some((head, rest)) => {
            let child = target
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                insert_path(map, rest, value);
            }
        },
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Display a property value in one table cell
pub fn extract_json_value(item: &Value, path: &str) -> String {
    match lookup_path(item, path) {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Array(arr)) => format!("[{} items]", arr.len()),
        Some(Value::Object(_)) => "[object]".to_string(),
    }
}
