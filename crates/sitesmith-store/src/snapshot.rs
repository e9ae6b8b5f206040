//! A store backed by a local JSON snapshot.
//!
//! The snapshot has the same shape as the `data.json` dump written by the
//! builder: top-level keys are collection names. An array value is a
//! collection of documents; an object value is a singleton document returned
//! for any id; `null` means the collection has nothing.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::traits::{Document, DocumentStore, StoreError};

/// Documents loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
    collections: Map<String, Value>,
}

impl SnapshotStore {
    /// Read and parse the snapshot file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| StoreError::Snapshot {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut store = Self::from_json_str(&content).map_err(|e| match e {
            StoreError::Decode(message) => StoreError::Snapshot {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;
        store.path = path.to_path_buf();

        Ok(store)
    }

    /// Parse a snapshot from a string.
    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let value: Value =
            serde_json::from_str(content).map_err(|e| StoreError::Decode(e.to_string()))?;

        match value {
            Value::Object(collections) => Ok(Self {
                path: PathBuf::new(),
                collections,
            }),
            _ => Err(StoreError::Decode(
                "snapshot root must be an object of collections".to_string(),
            )),
        }
    }

    /// Snapshot file path (empty for in-memory snapshots).
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        match self.collections.get(collection) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| to_document(collection, index.to_string(), item))
                .collect(),
            Some(single @ Value::Object(_)) => {
                Ok(vec![to_document(collection, "content".to_string(), single)?])
            }
            Some(other) => Err(StoreError::Decode(format!(
                "collection '{}' must be an array or object, got {}",
                collection, other
            ))),
        }
    }
}

fn to_document(collection: &str, fallback_id: String, item: &Value) -> Result<Document, StoreError> {
    let Value::Object(fields) = item else {
        return Err(StoreError::Decode(format!(
            "document in '{}' must be an object",
            collection
        )));
    };

    let id = match fields.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback_id,
    };

    Ok(Document {
        id,
        fields: fields.clone(),
    })
}

#[async_trait]
impl DocumentStore for SnapshotStore {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        if let Some(Value::Object(_)) = self.collections.get(collection) {
            return Ok(self.documents(collection)?.into_iter().next());
        }

        Ok(self.documents(collection)?.into_iter().find(|d| d.id == id))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        self.documents(collection)
    }
}
