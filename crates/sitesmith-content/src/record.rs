//! Content records as fetched from the document store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Free-form document fields.
pub type Fields = serde_json::Map<String, Value>;

/// The collection a content record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Services,
    Portfolio,
    Blog,
    Contact,
}

impl Category {
    /// All categories in build order.
    pub const ALL: [Category; 4] = [
        Category::Services,
        Category::Portfolio,
        Category::Blog,
        Category::Contact,
    ];

    /// Collection name in the store and path segment in the output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Portfolio => "portfolio",
            Self::Blog => "blog",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// A single page-producing document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentRecord {
    /// Store-assigned document id
    pub id: String,

    /// Owning collection
    #[serde(rename = "collection_name")]
    pub category: Category,

    /// Remaining document fields
    #[serde(flatten)]
    pub fields: Fields,
}

impl ContentRecord {
    /// Create a record. `id` and `collection_name` keys in `fields` are dropped
    /// since they are carried by the record itself.
    pub fn new(id: impl Into<String>, category: Category, mut fields: Fields) -> Self {
        fields.remove("id");
        fields.remove("collection_name");

        Self {
            id: id.into(),
            category,
            fields,
        }
    }

    /// A non-blank string field, trimmed.
    pub fn text(&self, key: &str) -> Option<&str> {
        non_blank(&self.fields, key)
    }

    /// URL slug (`urlSlug`).
    pub fn slug(&self) -> Option<&str> {
        self.text("urlSlug")
    }

    /// Language code (`lang`).
    pub fn lang(&self) -> Option<&str> {
        self.text("lang")
    }

    /// Translation group key; blank keys count as absent.
    pub fn translation_key(&self) -> Option<&str> {
        self.text("translationGroupKey")
    }

    /// Raw `lastModified` value.
    pub fn last_modified(&self) -> Option<&str> {
        self.text("lastModified")
    }

    /// Sitemap change frequency override.
    pub fn changefreq(&self) -> Option<&str> {
        self.text("sitemapChangefreq")
    }

    /// Sitemap priority override, as a string or a number.
    pub fn priority(&self) -> Option<String> {
        match self.fields.get("sitemapPriority")? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Display title with the usual fallbacks.
    pub fn title(&self) -> &str {
        self.text("title")
            .or_else(|| self.text("h1"))
            .or_else(|| self.text("seoTitle"))
            .unwrap_or(&self.id)
    }

    /// Whether the record has what it needs to become a page.
    pub fn is_publishable(&self) -> bool {
        self.slug().is_some() && self.lang().is_some()
    }
}

/// The `home/content` singleton.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HomeRecord {
    pub fields: Fields,
}

impl HomeRecord {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// SEO title (`seoTitle`).
    pub fn seo_title(&self) -> Option<&str> {
        non_blank(&self.fields, "seoTitle")
    }

    /// Meta description (`metaDescription`).
    pub fn meta_description(&self) -> Option<&str> {
        non_blank(&self.fields, "metaDescription")
    }
}

/// Everything fetched for one build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteData {
    /// Home singleton, if the document exists
    pub home: Option<HomeRecord>,

    /// Records per category, in store iteration order
    pub collections: BTreeMap<Category, Vec<ContentRecord>>,
}

impl SiteData {
    /// A skeleton with every category present and empty.
    pub fn empty() -> Self {
        Self {
            home: None,
            collections: Category::ALL.into_iter().map(|c| (c, Vec::new())).collect(),
        }
    }

    /// Records of one category.
    pub fn records(&self, category: Category) -> &[ContentRecord] {
        self.collections
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All records, category by category.
    pub fn iter_records(&self) -> impl Iterator<Item = &ContentRecord> {
        self.collections.values().flatten()
    }

    /// Total number of content records.
    pub fn len(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serializes as `{"home": {...}, "services": [...], ...}`.
impl Serialize for SiteData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.collections.len() + 1))?;
        map.serialize_entry("home", &self.home)?;
        for (category, records) in &self.collections {
            map.serialize_entry(category.as_str(), records)?;
        }
        map.end()
    }
}

fn non_blank<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn parses_category_names() {
        assert_eq!("blog".parse::<Category>(), Ok(Category::Blog));
        assert!("news".parse::<Category>().is_err());
        assert_eq!(Category::Portfolio.to_string(), "portfolio");
    }

    #[test]
    fn blank_fields_are_absent() {
        let record = ContentRecord::new(
            "abc",
            Category::Blog,
            fields(json!({ "urlSlug": "  ", "lang": "en", "translationGroupKey": "" })),
        );

        assert_eq!(record.slug(), None);
        assert_eq!(record.lang(), Some("en"));
        assert_eq!(record.translation_key(), None);
        assert!(!record.is_publishable());
    }

    #[test]
    fn reads_numeric_and_string_priority() {
        let numeric = ContentRecord::new("a", Category::Blog, fields(json!({ "sitemapPriority": 0.4 })));
        let text = ContentRecord::new("b", Category::Blog, fields(json!({ "sitemapPriority": "0.6" })));

        assert_eq!(numeric.priority().as_deref(), Some("0.4"));
        assert_eq!(text.priority().as_deref(), Some("0.6"));
    }

    #[test]
    fn serializes_flat_with_collection_name() {
        let record = ContentRecord::new(
            "doc-1",
            Category::Services,
            fields(json!({ "id": "stale", "title": "SEO Audit" })),
        );

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({ "id": "doc-1", "collection_name": "services", "title": "SEO Audit" })
        );
    }

    #[test]
    fn empty_site_data_has_every_category() {
        let data = SiteData::empty();
        let value = serde_json::to_value(&data).unwrap();

        assert!(data.is_empty());
        assert_eq!(
            value,
            json!({ "home": null, "services": [], "portfolio": [], "blog": [], "contact": [] })
        );
    }

    #[test]
    fn title_falls_back_to_id() {
        let record = ContentRecord::new("doc-9", Category::Contact, Fields::new());

        assert_eq!(record.title(), "doc-9");
    }
}
