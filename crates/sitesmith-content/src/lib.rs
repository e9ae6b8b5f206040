//! Content records and HTML formatting for sitesmith.
//!
//! This crate holds the data model shared by the store and the static builder,
//! plus the block formatter that turns editor-authored text into HTML.

pub mod format;
pub mod record;

pub use format::{classify_block, format_content, format_optional, Block};
pub use record::{Category, ContentRecord, Fields, HomeRecord, ParseCategoryError, SiteData};
