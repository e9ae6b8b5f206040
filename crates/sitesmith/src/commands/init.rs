//! Scaffold a sitesmith project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sitesmith_static::{TemplateEngine, DETAIL_TEMPLATE, HOME_TEMPLATE};

/// Run the init command.
pub async fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing sitesmith...");

    let root = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(root).context("Failed to create project directory")?;

    write_scaffold(config_path, DEFAULT_CONFIG, yes)?;

    for name in [DETAIL_TEMPLATE, HOME_TEMPLATE] {
        if let Some(source) = TemplateEngine::builtin_source(name) {
            write_scaffold(&root.join(name), source, yes)?;
        }
    }

    write_scaffold(&root.join("content.json"), DEFAULT_SNAPSHOT, yes)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'sitesmith build --snapshot content.json' to build the sample site.");

    Ok(())
}

fn write_scaffold(path: &Path, content: &str, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(());
    }

    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(())
}

const DEFAULT_CONFIG: &str = r#"# Sitesmith Configuration

[site]
# Absolute site URL, no trailing slash
base_url = "https://example.com"
default_language = "en"
languages = ["en", "ka", "ru", "ua"]
# "always" puts every language under /<lang>/, "non-default" skips the default
lang_prefix = "always"

[site.language_names]
en = "English"
ka = "ქართული"
ru = "Русский"
ua = "Українська"

[store]
# "firestore" or "snapshot"
kind = "firestore"
project_id = "my-project"
database = "(default)"
# Environment variable holding an OAuth bearer token
token_env = "FIRESTORE_TOKEN"
page_size = 300
snapshot = "content.json"
# "abort" fails the build when content cannot be fetched, "empty" builds anyway
fetch_policy = "abort"

[build]
output = "build_output"
templates = "."
root = "."
data_json = false
robots = true
exclude = []
"#;

const DEFAULT_SNAPSHOT: &str = r#"{
  "home": {
    "seoTitle": "My Site",
    "metaDescription": "Services, portfolio and blog",
    "h1": "Welcome"
  },
  "services": [
    {
      "id": "seo-audit-en",
      "urlSlug": "seo-audit",
      "lang": "en",
      "translationGroupKey": "seo-audit",
      "title": "SEO Audit",
      "h1": "SEO Audit",
      "price": "from $300",
      "mainContent": "A full technical review of your site.\n\nhttps://www.youtube.com/watch?v=dQw4w9WgXcQ",
      "sitemapPriority": 0.9
    }
  ],
  "portfolio": [],
  "blog": [
    {
      "id": "launch-en",
      "urlSlug": "launch",
      "lang": "en",
      "title": "We launched",
      "mainContent": "Our new site is live.",
      "lastModified": "2025-01-15T10:00:00Z"
    }
  ],
  "contact": []
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn scaffolds_project() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("sitesmith.toml");

        run(&config, false).await.unwrap();

        assert!(config.exists());
        assert!(temp.path().join("template.html").exists());
        assert!(temp.path().join("home_template.html").exists());

        let snapshot = fs::read_to_string(temp.path().join("content.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
        assert_eq!(value["services"][0]["urlSlug"], "seo-audit");

        let parsed = crate::config::load_config(&config).unwrap();
        assert_eq!(parsed.file.site.languages.len(), 4);
    }

    #[tokio::test]
    async fn keeps_existing_files_without_yes() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("sitesmith.toml");
        fs::write(&config, "# mine").unwrap();

        run(&config, false).await.unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "# mine");

        run(&config, true).await.unwrap();
        assert!(fs::read_to_string(&config).unwrap().contains("[site]"));
    }
}
