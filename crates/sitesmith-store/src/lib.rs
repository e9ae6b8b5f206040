//! Document store clients and the site data loader.
//!
//! A [`DocumentStore`] is constructed explicitly by the caller, handed to the
//! [`SiteLoader`], and closed once the build has its data.

pub mod firestore;
pub mod loader;
pub mod snapshot;
pub mod traits;
pub mod value;

pub use firestore::{FirestoreConfig, FirestoreStore};
pub use loader::{normalize_record, FetchPolicy, LoadError, SiteLoader};
pub use snapshot::SnapshotStore;
pub use traits::{Document, DocumentStore, StoreError};
pub use value::{decode_fields, decode_value};
