//! Static site generator for sitesmith.
//!
//! Renders content records into HTML pages, writes a multilingual sitemap and
//! mirrors static assets from the project root.

pub mod assets;
pub mod builder;
pub mod layout;
pub mod sitemap;
pub mod templates;

pub use assets::{AssetCopier, CopyReport, DEFAULT_EXCLUDES};
pub use builder::{related_items, BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use layout::{LangPrefix, SiteLayout};
pub use sitemap::{AlternateLink, SitemapBuilder, SitemapUrl};
pub use templates::{
    TemplateEngine, TemplateError, BASE_TEMPLATE_NAME, DETAIL_TEMPLATE, HOME_TEMPLATE,
};
