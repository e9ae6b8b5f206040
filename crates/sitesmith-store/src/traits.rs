//! Trait definitions for document stores.

use async_trait::async_trait;
use sitesmith_content::Fields;

/// A document as returned by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document id within its collection
    pub id: String,

    /// Decoded document fields
    pub fields: Fields,
}

/// Errors that can occur while talking to a store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Store returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from store: {0}")]
    Decode(String),

    #[error("Failed to read snapshot {path}: {message}")]
    Snapshot { path: String, message: String },

    #[error("Store connection is closed")]
    Closed,
}

/// A read-only source of collections and documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store identifier for log output (e.g., "firestore", "snapshot")
    fn name(&self) -> &'static str;

    /// Fetch a single document. `Ok(None)` when it does not exist.
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Fetch every document of a collection, in store order.
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Release the connection. Later calls fail with [`StoreError::Closed`].
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
