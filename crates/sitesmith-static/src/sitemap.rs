//! Sitemap generation.
//!
//! Produces a sitemap covering every language's home page and every
//! publishable content record. Records sharing a translation key point at
//! each other through `xhtml:link` alternates.

use std::collections::HashMap;

use chrono::NaiveDate;
use sitesmith_content::{Category, ContentRecord};

use crate::layout::{publishable_parts, SiteLayout};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

/// Change frequency and priority used when a record has no override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitemapDefaults {
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Defaults for home pages.
pub const HOME_DEFAULTS: SitemapDefaults = SitemapDefaults {
    changefreq: "weekly",
    priority: "1.0",
};

/// Defaults for a content category.
pub fn category_defaults(category: Category) -> SitemapDefaults {
    match category {
        Category::Services => SitemapDefaults {
            changefreq: "monthly",
            priority: "0.9",
        },
        Category::Portfolio => SitemapDefaults {
            changefreq: "yearly",
            priority: "0.8",
        },
        Category::Blog => SitemapDefaults {
            changefreq: "monthly",
            priority: "0.7",
        },
        Category::Contact => SitemapDefaults {
            changefreq: "yearly",
            priority: "0.5",
        },
    }
}

/// A sitemap URL entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapUrl {
    /// URL location.
    pub loc: String,

    /// Last modification date (YYYY-MM-DD).
    pub lastmod: String,

    /// Change frequency.
    pub changefreq: String,

    /// Priority (0.0 to 1.0).
    pub priority: String,

    /// Alternate language versions.
    pub alternates: Vec<AlternateLink>,
}

/// Alternate language link for a URL.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternateLink {
    /// Language code (e.g., "en", "ka") or "x-default".
    pub hreflang: String,

    /// URL for this language version.
    pub href: String,
}

/// Sitemap builder.
#[derive(Debug)]
pub struct SitemapBuilder<'a> {
    layout: &'a SiteLayout,
    today: NaiveDate,
}

impl<'a> SitemapBuilder<'a> {
    /// `today` is the lastmod of entries without their own date.
    pub fn new(layout: &'a SiteLayout, today: NaiveDate) -> Self {
        Self { layout, today }
    }

    /// Generate sitemap XML for the given records.
    pub fn build(&self, records: &[&ContentRecord]) -> String {
        render(&self.entries(records))
    }

    /// All entries: home pages first, then records group by group.
    pub fn entries(&self, records: &[&ContentRecord]) -> Vec<SitemapUrl> {
        let mut urls = self.home_entries();

        for group in group_by_translation(records) {
            let members: Vec<(&ContentRecord, &str, String)> = group
                .iter()
                .filter_map(|record| {
                    let (lang, _) = publishable_parts(record)?;
                    Some((*record, lang, self.layout.record_url(record)?))
                })
                .collect();

            // One href per language; a later member replaces an earlier one
            let mut by_lang: Vec<(&str, &str)> = Vec::new();
            for (_, lang, href) in &members {
                match by_lang.iter_mut().find(|(l, _)| l == lang) {
                    Some(slot) => slot.1 = href.as_str(),
                    None => by_lang.push((*lang, href.as_str())),
                }
            }

            for (record, lang, loc) in &members {
                let alternates = by_lang
                    .iter()
                    .filter(|(other, _)| other != lang)
                    .map(|(other, href)| AlternateLink {
                        hreflang: other.to_string(),
                        href: href.to_string(),
                    })
                    .collect();

                urls.push(self.record_entry(record, loc.clone(), alternates));
            }
        }

        tracing::debug!(count = urls.len(), "generated sitemap entries");

        urls
    }

    fn home_entries(&self) -> Vec<SitemapUrl> {
        let languages = self.layout.languages();
        let default_home = self.layout.home_url(self.layout.default_language());

        languages
            .iter()
            .map(|lang| {
                let mut alternates = vec![AlternateLink {
                    hreflang: "x-default".to_string(),
                    href: default_home.clone(),
                }];
                alternates.extend(languages.iter().filter(|other| *other != lang).map(|other| {
                    AlternateLink {
                        hreflang: other.clone(),
                        href: self.layout.home_url(other),
                    }
                }));

                SitemapUrl {
                    loc: self.layout.home_url(lang),
                    lastmod: self.today.format("%Y-%m-%d").to_string(),
                    changefreq: HOME_DEFAULTS.changefreq.to_string(),
                    priority: HOME_DEFAULTS.priority.to_string(),
                    alternates,
                }
            })
            .collect()
    }

    fn record_entry(
        &self,
        record: &ContentRecord,
        loc: String,
        alternates: Vec<AlternateLink>,
    ) -> SitemapUrl {
        let defaults = category_defaults(record.category);

        SitemapUrl {
            loc,
            lastmod: record
                .last_modified()
                .and_then(date_part)
                .map(str::to_string)
                .unwrap_or_else(|| self.today.format("%Y-%m-%d").to_string()),
            changefreq: record
                .changefreq()
                .unwrap_or(defaults.changefreq)
                .to_string(),
            priority: record
                .priority()
                .unwrap_or_else(|| defaults.priority.to_string()),
            alternates,
        }
    }
}

/// Group publishable records by translation key, in order of first
/// appearance. Records without a key form their own group.
fn group_by_translation<'r>(records: &[&'r ContentRecord]) -> Vec<Vec<&'r ContentRecord>> {
    let mut groups: Vec<Vec<&ContentRecord>> = Vec::new();
    let mut by_key: HashMap<&str, usize> = HashMap::new();

    for record in records.iter().copied() {
        if publishable_parts(record).is_none() {
            tracing::warn!(
                "Skipping {}/{} in sitemap: missing urlSlug or lang",
                record.category,
                record.id
            );
            continue;
        }

        match record.translation_key() {
            Some(key) => match by_key.get(key) {
                Some(&index) => groups[index].push(record),
                None => {
                    by_key.insert(key, groups.len());
                    groups.push(vec![record]);
                }
            },
            None => groups.push(vec![record]),
        }
    }

    groups
}

/// Date portion of a timestamp such as `2024-05-01T12:00:00Z`.
fn date_part(value: &str) -> Option<&str> {
    value
        .split(['T', ' '])
        .next()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

/// Serialize entries as a pretty-printed sitemap document.
pub fn render(urls: &[SitemapUrl]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<urlset xmlns=\"{}\" xmlns:xhtml=\"{}\">\n",
        SITEMAP_NS, XHTML_NS
    ));

    for url in urls {
        xml.push_str("    <url>\n");
        xml.push_str(&format!("        <loc>{}</loc>\n", escape_xml(&url.loc)));
        xml.push_str(&format!(
            "        <lastmod>{}</lastmod>\n",
            escape_xml(&url.lastmod)
        ));
        xml.push_str(&format!(
            "        <changefreq>{}</changefreq>\n",
            escape_xml(&url.changefreq)
        ));
        xml.push_str(&format!(
            "        <priority>{}</priority>\n",
            escape_xml(&url.priority)
        ));
        for alt in &url.alternates {
            xml.push_str(&format!(
                "        <xhtml:link rel=\"alternate\" hreflang=\"{}\" href=\"{}\"/>\n",
                escape_xml(&alt.hreflang),
                escape_xml(&alt.href)
            ));
        }
        xml.push_str("    </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
