//! Site data loader.
//!
//! Fetches the home singleton and every content collection, then normalizes
//! each document into a [`ContentRecord`].

use serde::Deserialize;
use serde_json::Value;
use sitesmith_content::{Category, ContentRecord, HomeRecord, SiteData};

use crate::traits::{Document, DocumentStore, StoreError};

/// Collection holding the home singleton.
pub const HOME_COLLECTION: &str = "home";

/// Id of the home singleton document.
pub const HOME_DOCUMENT: &str = "content";

/// What to do when the store cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Fail the build
    #[default]
    Abort,

    /// Log the failure and build from an empty data set
    Empty,
}

/// Errors that can occur while loading site data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to load site data from {store}: {source}")]
    Fetch {
        store: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Loads a [`SiteData`] snapshot from a store.
#[derive(Debug, Clone, Default)]
pub struct SiteLoader {
    policy: FetchPolicy,
}

impl SiteLoader {
    /// Create a loader with the given failure policy.
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    /// Load all site data, applying the failure policy.
    pub async fn load(&self, store: &dyn DocumentStore) -> Result<SiteData, LoadError> {
        match self.fetch(store).await {
            Ok(data) => {
                tracing::info!(
                    "Loaded {} records from {} (home: {})",
                    data.len(),
                    store.name(),
                    if data.home.is_some() { "yes" } else { "missing" }
                );
                Ok(data)
            }
            Err(source) => match self.policy {
                FetchPolicy::Abort => Err(LoadError::Fetch {
                    store: store.name(),
                    source,
                }),
                FetchPolicy::Empty => {
                    tracing::error!(
                        "Failed to load site data from {}: {}. Continuing with empty collections.",
                        store.name(),
                        source
                    );
                    Ok(SiteData::empty())
                }
            },
        }
    }

    async fn fetch(&self, store: &dyn DocumentStore) -> Result<SiteData, StoreError> {
        let mut data = SiteData::empty();

        data.home = store
            .get_document(HOME_COLLECTION, HOME_DOCUMENT)
            .await?
            .map(|doc| HomeRecord::new(doc.fields));

        for category in Category::ALL {
            let records: Vec<ContentRecord> = store
                .list_documents(category.as_str())
                .await?
                .into_iter()
                .map(|doc| normalize_record(doc, category))
                .collect();

            tracing::debug!("Loaded {} records from '{}'", records.len(), category);
            data.collections.insert(category, records);
        }

        Ok(data)
    }
}

/// Turn a raw document into a content record.
///
/// Falls back to the document id for a missing `urlSlug` and decodes a
/// string `schemaJsonLd` field, nulling it when it is not valid JSON.
pub fn normalize_record(doc: Document, category: Category) -> ContentRecord {
    let Document { id, mut fields } = doc;

    let has_slug = fields
        .get("urlSlug")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !has_slug {
        fields.insert("urlSlug".to_string(), Value::String(id.clone()));
    }

    if let Some(Value::String(raw)) = fields.get("schemaJsonLd") {
        let decoded = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!("Invalid schemaJsonLd in {}/{}: {}", category, id, e);
                Value::Null
            })
        };
        fields.insert("schemaJsonLd".to_string(), decoded);
    }

    ContentRecord::new(id, category, fields)
}
