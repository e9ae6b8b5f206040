//! Template engine for rendering detail and home pages.

use std::fs;
use std::path::Path;

use minijinja::{context, Environment, Value};
use serde::Serialize;
use sitesmith_content::format_content;

/// Detail page template name.
pub const DETAIL_TEMPLATE: &str = "template.html";

/// Home page template name.
pub const HOME_TEMPLATE: &str = "home_template.html";

/// Shared layout template name.
pub const BASE_TEMPLATE_NAME: &str = "base.html";

/// A supported language as exposed to templates.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageLink {
    /// Language code
    pub code: String,
    /// Display name
    pub name: String,
    /// Home page path for this language
    pub home: String,
}

/// Records of one language, grouped by category.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageSections {
    pub language: LanguageLink,
    pub sections: serde_json::Map<String, serde_json::Value>,
}

/// Context for rendering a detail page.
#[derive(Debug, Clone, Serialize)]
pub struct DetailContext {
    /// The record, with its `url`
    pub item: serde_json::Value,
    /// Up to three related records, each with its `url`
    pub related_items: Vec<serde_json::Value>,
    /// Full data set
    pub site_data: serde_json::Value,
    /// Page language
    pub lang: String,
    /// Absolute URL of this page
    pub page_url: String,
    /// Base URL without trailing slash
    pub base_url: String,
    /// Supported languages
    pub languages: Vec<LanguageLink>,
}

/// Context for rendering a home page.
#[derive(Debug, Clone, Serialize)]
pub struct HomeContext {
    /// Home record fields
    pub home: serde_json::Value,
    /// Records per category, each with its `url`
    pub sections_data: serde_json::Map<String, serde_json::Value>,
    /// Records per language, then per category
    pub sections_by_lang: Vec<LanguageSections>,
    /// Language of this home page
    pub lang: String,
    /// Absolute URL of this page
    pub page_url: String,
    /// Base URL without trailing slash
    pub base_url: String,
    /// Supported languages
    pub languages: Vec<LanguageLink>,
}

/// Errors that can occur while loading templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid template {name}: {source}")]
    Syntax {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in templates.
    pub fn new() -> Self {
        let mut env = Environment::new();
        register_helpers(&mut env);

        // Add base template
        env.add_template_owned(BASE_TEMPLATE_NAME.to_string(), BASE_TEMPLATE.to_string())
            .expect("Failed to add base template");

        // Add detail template
        env.add_template_owned(DETAIL_TEMPLATE.to_string(), DEFAULT_DETAIL_TEMPLATE.to_string())
            .expect("Failed to add detail template");

        // Add home template
        env.add_template_owned(HOME_TEMPLATE.to_string(), DEFAULT_HOME_TEMPLATE.to_string())
            .expect("Failed to add home template");

        Self { env }
    }

    /// Create an engine whose templates are overridden by files in `dir`.
    ///
    /// Any of `base.html`, `template.html` and `home_template.html` found in
    /// `dir` replaces the built-in version.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut engine = Self::new();

        for name in [BASE_TEMPLATE_NAME, DETAIL_TEMPLATE, HOME_TEMPLATE] {
            let path = dir.join(name);
            if !path.is_file() {
                tracing::debug!("Using built-in {}", name);
                continue;
            }

            let source = fs::read_to_string(&path).map_err(|e| TemplateError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

            engine
                .env
                .add_template_owned(name.to_string(), source)
                .map_err(|source| TemplateError::Syntax {
                    name: name.to_string(),
                    source,
                })?;

            tracing::info!("Loaded template {}", path.display());
        }

        Ok(engine)
    }

    /// Source of a built-in template, for scaffolding overrides.
    pub fn builtin_source(name: &str) -> Option<&'static str> {
        match name {
            BASE_TEMPLATE_NAME => Some(BASE_TEMPLATE),
            DETAIL_TEMPLATE => Some(DEFAULT_DETAIL_TEMPLATE),
            HOME_TEMPLATE => Some(DEFAULT_HOME_TEMPLATE),
            _ => None,
        }
    }

    /// Render a detail page.
    pub fn render_detail(&self, context: &DetailContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(DETAIL_TEMPLATE)?;

        tmpl.render(context! {
            page_type => "detail",
            item => &context.item,
            related_items => &context.related_items,
            site_data => &context.site_data,
            lang => &context.lang,
            page_url => &context.page_url,
            base_url => &context.base_url,
            languages => &context.languages,
        })
    }

    /// Render a home page.
    pub fn render_home(&self, context: &HomeContext) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(HOME_TEMPLATE)?;

        tmpl.render(context! {
            page_type => "home",
            home => &context.home,
            item => &context.home,
            sections_data => &context.sections_data,
            sections_by_lang => &context.sections_by_lang,
            lang => &context.lang,
            page_url => &context.page_url,
            base_url => &context.base_url,
            languages => &context.languages,
        })
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Make `format_content` available as both a function and a filter.
fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("format_content", format_content_value);
    env.add_filter("format_content", format_content_value);
}

fn format_content_value(value: Option<Value>) -> Value {
    let html = match value {
        Some(v) if v.is_none() || v.is_undefined() => String::new(),
        Some(v) => match v.as_str() {
            Some(text) => format_content(text),
            None => format_content(&v.to_string()),
        },
        None => String::new(),
    };

    Value::from_safe_string(html)
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="{{ lang }}">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{% block title %}{% endblock %}</title>
  <meta name="description" content="{% block description %}{% endblock %}">
  <link rel="canonical" href="{{ page_url }}">
  <link rel="stylesheet" href="/style.css">
  {% block head %}{% endblock %}
</head>
<body>
  <header class="site-header">
    <a href="{{ base_url }}/" class="logo">Home</a>
    <ul class="lang-switcher">
    {% for language in languages %}
      <li{% if language.code == lang %} class="active"{% endif %}><a href="{{ language.home }}">{{ language.name }}</a></li>
    {% endfor %}
    </ul>
  </header>
  <main>
    {% block content %}{% endblock %}
  </main>
</body>
</html>"##;

const DEFAULT_DETAIL_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block title %}{{ item.seoTitle or item.title }}{% endblock %}
{% block description %}{{ item.metaDescription }}{% endblock %}

{% block head %}
{% if item.schemaJsonLd %}<script type="application/ld+json">{{ item.schemaJsonLd | tojson }}</script>{% endif %}
{% endblock %}

{% block content %}
<section class="detail">
  <div class="detail-page-header">
    <h1>{{ item.h1 or item.title }}</h1>
    {% if item.price %}<div class="detail-price">{{ item.price }}</div>{% endif %}
  </div>
  <div class="detail-content">
    {{ format_content(item.mainContent) }}
  </div>
</section>

{% if related_items %}
<section class="related-posts">
  <h2>Related</h2>
  <div class="items-grid">
  {% for related in related_items %}
    <a href="{{ related.url }}" class="item-card">
      <h3>{{ related.title }}</h3>
      {% if related.description %}<p>{{ related.description }}</p>{% endif %}
    </a>
  {% endfor %}
  </div>
</section>
{% endif %}
{% endblock %}"##;

const DEFAULT_HOME_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block title %}{{ home.seoTitle or "Home" }}{% endblock %}
{% block description %}{{ home.metaDescription }}{% endblock %}

{% block head %}
{% if home.schemaJsonLd %}<script type="application/ld+json">{{ home.schemaJsonLd | tojson }}</script>{% endif %}
{% endblock %}

{% block content %}
<section class="hero">
  <h1>{{ home.heroTitle or home.seoTitle }}</h1>
  {% if home.heroSubtitle %}<p>{{ home.heroSubtitle }}</p>{% endif %}
</section>

{% for category in ["services", "portfolio", "blog", "contact"] %}
<section id="{{ category }}">
  <h2>{{ category | capitalize }}</h2>
  {% for group in sections_by_lang %}
    {% if group.sections[category] %}
    <div class="language-group">
      <h4>{{ group.language.name }}</h4>
      <div class="items-grid">
      {% for entry in group.sections[category] %}
        <a href="{{ entry.url }}" class="item-card">
          <h3>{{ entry.title }}</h3>
          {% if entry.description %}<p>{{ entry.description }}</p>{% endif %}
        </a>
      {% endfor %}
      </div>
    </div>
    {% endif %}
  {% endfor %}
</section>
{% endfor %}
{% endblock %}"##;
