//! Static site builder.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde_json::{Map, Value};
use sitesmith_content::{Category, ContentRecord, SiteData};

use crate::assets::AssetCopier;
use crate::layout::{publishable_parts, SiteLayout};
use crate::sitemap::SitemapBuilder;
use crate::templates::{
    DetailContext, HomeContext, LanguageLink, LanguageSections, TemplateEngine, TemplateError,
};

/// Maximum number of related records on a detail page.
pub const RELATED_LIMIT: usize = 3;

/// Categories related records are drawn from, in order.
const RELATED_POOL: [Category; 2] = [Category::Services, Category::Blog];

/// Configuration for building a static site.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; static assets are copied from here
    pub project_root: PathBuf,

    /// Output directory, wiped before every build
    pub output_dir: PathBuf,

    /// Directory holding template overrides
    pub templates_dir: PathBuf,

    /// URL layout and languages
    pub layout: SiteLayout,

    /// Display names for language codes
    pub language_names: BTreeMap<String, String>,

    /// Copy static assets from the project root
    pub copy_assets: bool,

    /// Extra top-level names the asset copier skips
    pub exclude: Vec<String>,

    /// Paths whose top-level entry under the project root is never copied
    pub exclude_paths: Vec<PathBuf>,

    /// Write `data.json` with the full data set
    pub data_json: bool,

    /// Write `robots.txt` unless the assets provide one
    pub robots: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            output_dir: PathBuf::from("build_output"),
            templates_dir: PathBuf::from("."),
            layout: SiteLayout::new("", "en", vec!["en".to_string()], Default::default()),
            language_names: BTreeMap::new(),
            copy_assets: true,
            exclude: vec![],
            exclude_paths: vec![],
            data_json: false,
            robots: true,
        }
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of detail pages generated
    pub pages: usize,

    /// Number of home pages generated
    pub home_pages: usize,

    /// Records skipped for missing fields or render failures
    pub skipped: usize,

    /// Number of top-level assets copied
    pub assets: usize,

    /// Number of assets that failed to copy
    pub asset_failures: usize,

    /// Number of sitemap entries
    pub sitemap_entries: usize,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

/// Errors that can occur during build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Refusing to use {0} as output directory: it contains the project root")]
    UnsafeOutput(String),

    #[error("Failed to clean output directory: {0}")]
    CleanError(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to render template: {0}")]
    RenderError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    templates: TemplateEngine,
    today: NaiveDate,
}

impl StaticBuilder {
    /// Create a new static builder, loading template overrides.
    pub fn new(config: BuildConfig) -> Result<Self, BuildError> {
        let templates = TemplateEngine::load(&config.templates_dir)?;

        Ok(Self {
            config,
            templates,
            today: Local::now().date_naive(),
        })
    }

    /// Pin the build date used for sitemap entries without `lastModified`.
    pub fn with_build_date(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Build the static site from loaded data.
    pub fn build(&self, data: &SiteData) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        self.prepare_output()?;

        let (assets, asset_failures) = if self.config.copy_assets {
            let copier = AssetCopier::new(&self.config.project_root, &self.config.output_dir)
                .exclude(self.config.exclude.iter().cloned())
                .exclude_path(&self.config.output_dir)
                .exclude_path(&self.config.templates_dir);
            let report = self
                .config
                .exclude_paths
                .iter()
                .fold(copier, |copier, path| copier.exclude_path(path))
                .copy_all();
            (report.copied.len(), report.failed.len())
        } else {
            (0, 0)
        };

        let home_pages = self.build_home(data);

        let mut pages = 0;
        let mut skipped = 0;
        let mut published: Vec<&ContentRecord> = Vec::new();

        for record in data.iter_records() {
            if publishable_parts(record).is_none() {
                tracing::warn!(
                    "Skipping {} (ID: {}): missing or invalid urlSlug or lang",
                    record.category,
                    record.id
                );
                skipped += 1;
                continue;
            }

            match self.build_page(record, data) {
                Ok(path) => {
                    tracing::info!("Created page {}", self.display_path(&path));
                    pages += 1;
                    published.push(record);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to render {}/{}: {}",
                        record.category,
                        record.slug().unwrap_or(&record.id),
                        e
                    );
                    skipped += 1;
                }
            }
        }

        let sitemap_entries = self.generate_sitemap(&published)?;

        if self.config.data_json {
            self.generate_data_json(data)?;
        }

        if self.config.robots {
            self.generate_robots()?;
        }

        let duration = start.elapsed();

        Ok(BuildResult {
            pages,
            home_pages,
            skipped,
            assets,
            asset_failures,
            sitemap_entries,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }

    /// Delete and recreate the output directory.
    fn prepare_output(&self) -> Result<(), BuildError> {
        let output = &self.config.output_dir;

        if let (Ok(root), Ok(out)) = (
            fs::canonicalize(&self.config.project_root),
            fs::canonicalize(output),
        ) {
            if root.starts_with(&out) {
                return Err(BuildError::UnsafeOutput(output.display().to_string()));
            }
        }

        if output.exists() {
            fs::remove_dir_all(output).map_err(|e| BuildError::CleanError(e.to_string()))?;
        }

        fs::create_dir_all(output).map_err(|e| BuildError::WriteError(e.to_string()))
    }

    /// Render the root page and one home page per additional language.
    fn build_home(&self, data: &SiteData) -> usize {
        let Some(home) = &data.home else {
            tracing::error!("Home record not found; skipping home pages");
            return 0;
        };

        let layout = &self.config.layout;
        let home_value = serde_json::to_value(home).unwrap_or(Value::Null);
        let sections_data = self.sections(data, None);
        let sections_by_lang: Vec<LanguageSections> = layout
            .languages()
            .iter()
            .map(|lang| LanguageSections {
                language: self.language_link(lang),
                sections: self.sections(data, Some(lang)),
            })
            .collect();

        let mut written = 0;

        for lang in layout.languages() {
            let context = HomeContext {
                home: home_value.clone(),
                sections_data: sections_data.clone(),
                sections_by_lang: sections_by_lang.clone(),
                lang: lang.clone(),
                page_url: layout.home_url(lang),
                base_url: layout.base_url().to_string(),
                languages: self.languages(),
            };

            let path = layout.home_file(&self.config.output_dir, lang);
            let result = self
                .templates
                .render_home(&context)
                .map_err(|e| BuildError::RenderError(e.to_string()))
                .and_then(|html| write_file(&path, &html));

            match result {
                Ok(()) => {
                    tracing::info!("Created home page {}", self.display_path(&path));
                    written += 1;
                }
                Err(e) => tracing::error!("Failed to render home page ({}): {}", lang, e),
            }
        }

        written
    }

    /// Build a single detail page.
    fn build_page(&self, record: &ContentRecord, data: &SiteData) -> Result<PathBuf, BuildError> {
        let layout = &self.config.layout;
        let (lang, slug) = publishable_parts(record)
            .ok_or_else(|| BuildError::RenderError("record has no slug or lang".to_string()))?;

        let related: Vec<Value> = related_items(record, data, RELATED_LIMIT)
            .into_iter()
            .map(|r| self.page_value(r))
            .collect();

        let context = DetailContext {
            item: self.page_value(record),
            related_items: related,
            site_data: serde_json::to_value(data)
                .map_err(|e| BuildError::RenderError(e.to_string()))?,
            lang: lang.to_string(),
            page_url: layout.page_url(lang, record.category, slug),
            base_url: layout.base_url().to_string(),
            languages: self.languages(),
        };

        let html = self
            .templates
            .render_detail(&context)
            .map_err(|e| BuildError::RenderError(e.to_string()))?;

        let path = layout.page_file(&self.config.output_dir, lang, record.category, slug);
        write_file(&path, &html)?;

        Ok(path)
    }

    /// Record as a template value, with its site-relative `url`.
    fn page_value(&self, record: &ContentRecord) -> Value {
        let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            let url = self.config.layout.record_path(record);
            map.insert("url".to_string(), url.map(Value::String).unwrap_or(Value::Null));
        }
        value
    }

    /// Records per category, optionally restricted to one language.
    fn sections(&self, data: &SiteData, lang: Option<&str>) -> Map<String, Value> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let records = data
                    .records(category)
                    .iter()
                    .filter(|r| lang.is_none() || r.lang() == lang)
                    .map(|r| self.page_value(r))
                    .collect();
                (category.as_str().to_string(), Value::Array(records))
            })
            .collect()
    }

    fn language_link(&self, code: &str) -> LanguageLink {
        LanguageLink {
            code: code.to_string(),
            name: self
                .config
                .language_names
                .get(code)
                .cloned()
                .unwrap_or_else(|| code.to_uppercase()),
            home: self.config.layout.home_path(code),
        }
    }

    fn languages(&self) -> Vec<LanguageLink> {
        self.config
            .layout
            .languages()
            .iter()
            .map(|code| self.language_link(code))
            .collect()
    }

    /// Generate sitemap. Returns the number of entries.
    fn generate_sitemap(&self, records: &[&ContentRecord]) -> Result<usize, BuildError> {
        let builder = SitemapBuilder::new(&self.config.layout, self.today);
        let entries = builder.entries(records);
        let xml = crate::sitemap::render(&entries);

        write_file(&self.config.output_dir.join("sitemap.xml"), &xml)?;
        tracing::info!("Generated sitemap with {} entries", entries.len());

        Ok(entries.len())
    }

    /// Dump the full data set for client-side use.
    fn generate_data_json(&self, data: &SiteData) -> Result<(), BuildError> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;

        write_file(&self.config.output_dir.join("data.json"), &json)
    }

    /// Generate robots.txt unless one was copied from the assets.
    fn generate_robots(&self) -> Result<(), BuildError> {
        let path = self.config.output_dir.join("robots.txt");
        if path.exists() {
            return Ok(());
        }

        let robots = format!(
            "User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml\n",
            self.config.layout.base_url()
        );
        write_file(&path, &robots)
    }

    fn display_path(&self, path: &Path) -> String {
        path.strip_prefix(&self.config.output_dir)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Up to `limit` publishable records from services then blog with the same
/// language and a different slug, in iteration order.
pub fn related_items<'a>(
    record: &ContentRecord,
    data: &'a SiteData,
    limit: usize,
) -> Vec<&'a ContentRecord> {
    let Some(lang) = record.lang() else {
        return Vec::new();
    };
    let slug = record.slug();

    RELATED_POOL
        .into_iter()
        .flat_map(|category| data.records(category))
        .filter(|candidate| {
            candidate.lang() == Some(lang)
                && publishable_parts(candidate).is_some()
                && candidate.slug() != slug
        })
        .take(limit)
        .collect()
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::WriteError(e.to_string()))?;
    }

    fs::write(path, content)
        .map_err(|e| BuildError::WriteError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LangPrefix;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use sitesmith_content::HomeRecord;
    use tempfile::tempdir;

    fn record(id: &str, category: Category, fields: Value) -> ContentRecord {
        ContentRecord::new(id, category, fields.as_object().cloned().unwrap())
    }

    fn site(records: Vec<ContentRecord>) -> SiteData {
        let mut data = SiteData::empty();
        data.home = Some(HomeRecord::new(
            json!({ "seoTitle": "Digital Craft" }).as_object().cloned().unwrap(),
        ));
        for r in records {
            data.collections.entry(r.category).or_default().push(r);
        }
        data
    }

    fn config(root: &Path, prefix: LangPrefix) -> BuildConfig {
        BuildConfig {
            project_root: root.to_path_buf(),
            output_dir: root.join("build_output"),
            templates_dir: root.to_path_buf(),
            layout: SiteLayout::new(
                "https://example.com",
                "en",
                vec!["en".to_string(), "ka".to_string()],
                prefix,
            ),
            ..Default::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn builds_pages_home_and_sitemap() {
        let temp = tempdir().unwrap();
        let data = site(vec![record(
            "s1",
            Category::Services,
            json!({ "urlSlug": "seo-audit", "lang": "en", "title": "SEO Audit" }),
        )]);

        let builder = StaticBuilder::new(config(temp.path(), LangPrefix::Always))
            .unwrap()
            .with_build_date(today());
        let result = builder.build(&data).unwrap();

        let out = temp.path().join("build_output");
        assert_eq!(result.pages, 1);
        assert_eq!(result.home_pages, 2);
        assert_eq!(result.sitemap_entries, 3);

        let page = fs::read_to_string(out.join("en/services/seo-audit/index.html")).unwrap();
        assert!(page.contains("SEO Audit"));

        let home = fs::read_to_string(out.join("index.html")).unwrap();
        assert!(home.contains("Digital Craft"));
        assert!(out.join("ka/index.html").exists());

        let sitemap = fs::read_to_string(out.join("sitemap.xml")).unwrap();
        assert!(sitemap.contains("<loc>https://example.com/en/services/seo-audit/</loc>"));
        assert!(sitemap.contains("<lastmod>2024-06-01</lastmod>"));

        let robots = fs::read_to_string(out.join("robots.txt")).unwrap();
        assert!(robots.contains("Sitemap: https://example.com/sitemap.xml"));
    }

    #[test]
    fn non_default_prefix_puts_default_language_at_root() {
        let temp = tempdir().unwrap();
        let data = site(vec![
            record("a", Category::Blog, json!({ "urlSlug": "hello", "lang": "en" })),
            record("b", Category::Blog, json!({ "urlSlug": "hello", "lang": "ka" })),
        ]);

        StaticBuilder::new(config(temp.path(), LangPrefix::NonDefault))
            .unwrap()
            .build(&data)
            .unwrap();

        let out = temp.path().join("build_output");
        assert!(out.join("blog/hello/index.html").exists());
        assert!(out.join("ka/blog/hello/index.html").exists());
        assert!(!out.join("en").exists());
    }

    #[test]
    fn skips_records_without_language() {
        let temp = tempdir().unwrap();
        let data = site(vec![
            record("a", Category::Portfolio, json!({ "urlSlug": "shop" })),
            record("b", Category::Portfolio, json!({ "urlSlug": "store", "lang": "en" })),
        ]);

        let result = StaticBuilder::new(config(temp.path(), LangPrefix::Always))
            .unwrap()
            .build(&data)
            .unwrap();

        assert_eq!(result.pages, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn render_failure_skips_only_that_page() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("template.html"),
            "{% if item.broken %}{{ range(\"x\") }}{% endif %}{{ item.title }}",
        )
        .unwrap();
        let data = site(vec![
            record("a", Category::Blog, json!({ "urlSlug": "ok", "lang": "en", "title": "Fine" })),
            record(
                "b",
                Category::Blog,
                json!({ "urlSlug": "bad", "lang": "en", "broken": true }),
            ),
        ]);

        let result = StaticBuilder::new(config(temp.path(), LangPrefix::Always))
            .unwrap()
            .build(&data)
            .unwrap();

        let out = temp.path().join("build_output");
        assert_eq!(result.pages, 1);
        assert_eq!(result.skipped, 1);
        assert!(out.join("en/blog/ok/index.html").exists());
        assert!(!out.join("en/blog/bad/index.html").exists());
    }

    #[test]
    fn cleans_previous_output() {
        let temp = tempdir().unwrap();
        let out = temp.path().join("build_output");
        fs::create_dir_all(out.join("stale")).unwrap();
        fs::write(out.join("stale/index.html"), "old").unwrap();

        StaticBuilder::new(config(temp.path(), LangPrefix::Always))
            .unwrap()
            .build(&site(vec![]))
            .unwrap();

        assert!(!out.join("stale").exists());
        assert!(out.join("sitemap.xml").exists());
    }

    #[test]
    fn refuses_output_containing_the_root() {
        let temp = tempdir().unwrap();
        let mut config = config(temp.path(), LangPrefix::Always);
        config.output_dir = temp.path().to_path_buf();

        let result = StaticBuilder::new(config).unwrap().build(&site(vec![]));

        assert!(matches!(result, Err(BuildError::UnsafeOutput(_))));
        assert!(temp.path().exists());
    }

    #[test]
    fn writes_data_json_when_enabled() {
        let temp = tempdir().unwrap();
        let mut config = config(temp.path(), LangPrefix::Always);
        config.data_json = true;

        StaticBuilder::new(config)
            .unwrap()
            .build(&site(vec![record("a", Category::Contact, json!({ "urlSlug": "office", "lang": "en" }))]))
            .unwrap();

        let dump: Value = serde_json::from_str(
            &fs::read_to_string(temp.path().join("build_output/data.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(dump["contact"][0]["urlSlug"], json!("office"));
        assert_eq!(dump["home"]["seoTitle"], json!("Digital Craft"));
    }

    #[test]
    fn missing_home_still_builds_pages() {
        let temp = tempdir().unwrap();
        let mut data = site(vec![record(
            "a",
            Category::Blog,
            json!({ "urlSlug": "post", "lang": "en" }),
        )]);
        data.home = None;

        let result = StaticBuilder::new(config(temp.path(), LangPrefix::Always))
            .unwrap()
            .build(&data)
            .unwrap();

        assert_eq!(result.home_pages, 0);
        assert_eq!(result.pages, 1);
    }

    #[test]
    fn related_items_follow_iteration_order() {
        let current = record("c", Category::Blog, json!({ "urlSlug": "current", "lang": "en" }));
        let data = site(vec![
            record("s1", Category::Services, json!({ "urlSlug": "one", "lang": "en" })),
            record("s2", Category::Services, json!({ "urlSlug": "dos", "lang": "es" })),
            record("p1", Category::Portfolio, json!({ "urlSlug": "folio", "lang": "en" })),
            record("b1", Category::Blog, json!({ "urlSlug": "current", "lang": "en" })),
            record("b2", Category::Blog, json!({ "urlSlug": "two", "lang": "en" })),
            record("b3", Category::Blog, json!({ "urlSlug": "three", "lang": "en" })),
            record("b4", Category::Blog, json!({ "urlSlug": "four", "lang": "en" })),
        ]);

        let related = related_items(&current, &data, RELATED_LIMIT);

        let slugs: Vec<&str> = related.iter().filter_map(|r| r.slug()).collect();
        assert_eq!(slugs, vec!["one", "two", "three"]);
    }

    #[test]
    fn related_items_skip_unsafe_slugs() {
        let current = record("c", Category::Blog, json!({ "urlSlug": "current", "lang": "en" }));
        let data = site(vec![
            record("s1", Category::Services, json!({ "urlSlug": "..", "lang": "en" })),
            record("s2", Category::Services, json!({ "urlSlug": "a/b", "lang": "en" })),
            record("b1", Category::Blog, json!({ "urlSlug": "safe", "lang": "en" })),
        ]);

        let related = related_items(&current, &data, RELATED_LIMIT);

        let slugs: Vec<&str> = related.iter().filter_map(|r| r.slug()).collect();
        assert_eq!(slugs, vec!["safe"]);
    }
}
