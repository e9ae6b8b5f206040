//! Output paths and public URLs.
//!
//! Every path and URL the builder produces goes through [`SiteLayout`] so
//! pages, home pages, related links and the sitemap agree on the language
//! prefix convention.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use sitesmith_content::{Category, ContentRecord};

/// Which languages get a path prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LangPrefix {
    /// Every language, the default one included: `/en/blog/post/`
    #[default]
    Always,

    /// All but the default language: `/blog/post/`, `/ka/blog/post/`
    NonDefault,
}

/// URL and filesystem layout of the generated site.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    base_url: String,
    default_language: String,
    languages: Vec<String>,
    prefix: LangPrefix,
}

impl SiteLayout {
    /// Create a layout. The default language is always part of `languages`.
    pub fn new(
        base_url: impl Into<String>,
        default_language: impl Into<String>,
        languages: Vec<String>,
        prefix: LangPrefix,
    ) -> Self {
        let default_language = default_language.into();
        let mut unique: Vec<String> = Vec::with_capacity(languages.len());
        for lang in languages {
            let lang = lang.trim();
            if !lang.is_empty() && !unique.iter().any(|l| l == lang) {
                unique.push(lang.to_string());
            }
        }
        let mut languages = unique;
        if !languages.contains(&default_language) {
            languages.insert(0, default_language.clone());
        }

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            default_language,
            languages,
            prefix,
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Supported languages, in configured order.
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn prefix(&self) -> LangPrefix {
        self.prefix
    }

    fn lang_segment<'a>(&self, lang: &'a str) -> Option<&'a str> {
        match self.prefix {
            LangPrefix::Always => Some(lang),
            LangPrefix::NonDefault if lang == self.default_language => None,
            LangPrefix::NonDefault => Some(lang),
        }
    }

    /// Site-relative path of a page, with leading and trailing slashes.
    pub fn page_path(&self, lang: &str, category: Category, slug: &str) -> String {
        match self.lang_segment(lang) {
            Some(lang) => format!("/{}/{}/{}/", lang, category, slug),
            None => format!("/{}/{}/", category, slug),
        }
    }

    /// Absolute URL of a page.
    pub fn page_url(&self, lang: &str, category: Category, slug: &str) -> String {
        format!("{}{}", self.base_url, self.page_path(lang, category, slug))
    }

    /// `index.html` location of a page under `output`.
    pub fn page_file(&self, output: &Path, lang: &str, category: Category, slug: &str) -> PathBuf {
        let mut path = output.to_path_buf();
        if let Some(lang) = self.lang_segment(lang) {
            path.push(lang);
        }
        path.join(category.as_str()).join(slug).join("index.html")
    }

    /// Site-relative path of a record's page, if it can have one.
    pub fn record_path(&self, record: &ContentRecord) -> Option<String> {
        let (lang, slug) = publishable_parts(record)?;
        Some(self.page_path(lang, record.category, slug))
    }

    /// Absolute URL of a record's page, if it can have one.
    pub fn record_url(&self, record: &ContentRecord) -> Option<String> {
        let (lang, slug) = publishable_parts(record)?;
        Some(self.page_url(lang, record.category, slug))
    }

    /// Site-relative path of a language's home page. The root is the
    /// default language's home.
    pub fn home_path(&self, lang: &str) -> String {
        if lang == self.default_language {
            "/".to_string()
        } else {
            format!("/{}/", lang)
        }
    }

    /// Absolute URL of a language's home page.
    pub fn home_url(&self, lang: &str) -> String {
        format!("{}{}", self.base_url, self.home_path(lang))
    }

    /// `index.html` location of a language's home page under `output`.
    pub fn home_file(&self, output: &Path, lang: &str) -> PathBuf {
        if lang == self.default_language {
            output.join("index.html")
        } else {
            output.join(lang).join("index.html")
        }
    }
}

/// Language and slug of a record, if both are present and usable as single
/// path segments.
pub fn publishable_parts(record: &ContentRecord) -> Option<(&str, &str)> {
    let lang = record.lang().filter(|l| is_path_segment(l))?;
    let slug = record.slug().filter(|s| is_path_segment(s))?;
    Some((lang, slug))
}

fn is_path_segment(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn layout(prefix: LangPrefix) -> SiteLayout {
        SiteLayout::new(
            "https://example.com/",
            "en",
            vec!["ka".to_string(), "ru".to_string()],
            prefix,
        )
    }

    fn record(lang: &str, slug: &str) -> ContentRecord {
        let fields = json!({ "lang": lang, "urlSlug": slug });
        ContentRecord::new("id", Category::Blog, fields.as_object().cloned().unwrap())
    }

    #[test]
    fn always_prefixes_every_language() {
        let layout = layout(LangPrefix::Always);

        assert_eq!(
            layout.page_url("en", Category::Services, "seo-audit"),
            "https://example.com/en/services/seo-audit/"
        );
        assert_eq!(
            layout.page_file(Path::new("out"), "en", Category::Services, "seo-audit"),
            PathBuf::from("out/en/services/seo-audit/index.html")
        );
    }

    #[test]
    fn non_default_skips_default_language() {
        let layout = layout(LangPrefix::NonDefault);

        assert_eq!(layout.page_path("en", Category::Blog, "post"), "/blog/post/");
        assert_eq!(layout.page_path("ka", Category::Blog, "post"), "/ka/blog/post/");
        assert_eq!(
            layout.page_file(Path::new("out"), "en", Category::Blog, "post"),
            PathBuf::from("out/blog/post/index.html")
        );
    }

    #[test]
    fn default_language_is_always_supported() {
        let layout = layout(LangPrefix::Always);

        assert_eq!(layout.languages(), ["en", "ka", "ru"]);
        assert_eq!(layout.base_url(), "https://example.com");
    }

    #[test]
    fn home_urls() {
        let layout = layout(LangPrefix::Always);

        assert_eq!(layout.home_url("en"), "https://example.com/");
        assert_eq!(layout.home_url("ka"), "https://example.com/ka/");
        assert_eq!(
            layout.home_file(Path::new("out"), "ru"),
            PathBuf::from("out/ru/index.html")
        );
    }

    #[test]
    fn rejects_slugs_that_escape_the_output() {
        let layout = layout(LangPrefix::Always);

        assert_eq!(layout.record_path(&record("en", "../etc")), None);
        assert_eq!(layout.record_path(&record("en", "..")), None);
        assert_eq!(
            layout.record_path(&record("en", "ok")).as_deref(),
            Some("/en/blog/ok/")
        );
    }
}
