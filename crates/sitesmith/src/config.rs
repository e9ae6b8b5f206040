//! Configuration file (sitesmith.toml).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use sitesmith_static::LangPrefix;
use sitesmith_store::FetchPolicy;

/// Configuration file structure.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub lang_prefix: LangPrefix,
    /// Display names for the language switcher
    #[serde(default)]
    pub language_names: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    #[default]
    Firestore,
    Snapshot,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    pub api_base: Option<String>,
    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_snapshot")]
    pub snapshot: String,
    #[serde(default)]
    pub fetch_policy: FetchPolicy,
}

#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_dir")]
    pub templates: String,
    #[serde(default = "default_dir")]
    pub root: String,
    #[serde(default)]
    pub data_json: bool,
    #[serde(default = "default_true")]
    pub robots: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_language: default_language(),
            languages: default_languages(),
            lang_prefix: LangPrefix::default(),
            language_names: BTreeMap::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::default(),
            project_id: String::new(),
            database: default_database(),
            api_base: None,
            token_env: default_token_env(),
            page_size: default_page_size(),
            snapshot: default_snapshot(),
            fetch_policy: FetchPolicy::default(),
        }
    }
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            templates: default_dir(),
            root: default_dir(),
            data_json: false,
            robots: true,
            exclude: Vec::new(),
        }
    }
}

fn default_base_url() -> String {
    "https://example.com".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_languages() -> Vec<String> {
    ["en", "ka", "ru", "ua"].iter().map(|s| s.to_string()).collect()
}
fn default_database() -> String {
    "(default)".to_string()
}
fn default_token_env() -> String {
    "FIRESTORE_TOKEN".to_string()
}
fn default_page_size() -> u32 {
    300
}
fn default_snapshot() -> String {
    "content.json".to_string()
}
fn default_output() -> String {
    "build_output".to_string()
}
fn default_dir() -> String {
    ".".to_string()
}
fn default_true() -> bool {
    true
}

/// A parsed config plus the directory relative paths resolve against.
#[derive(Debug)]
pub struct LoadedConfig {
    pub file: ConfigFile,
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Resolve a configured path against the config file's directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<LoadedConfig> {
    let base_dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return Ok(LoadedConfig {
            file: ConfigFile::default(),
            base_dir,
        });
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!("Loaded config from {}", path.display());

    Ok(LoadedConfig { file, base_dir })
}
