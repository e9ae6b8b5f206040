//! Static site build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sitesmith_static::{BuildConfig, SiteLayout, StaticBuilder};
use sitesmith_store::{
    DocumentStore, FetchPolicy, FirestoreConfig, FirestoreStore, SiteLoader, SnapshotStore,
};

use crate::config::{load_config, LoadedConfig, StoreKind};

/// Command-line overrides for the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub output: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub lenient: bool,
}

/// Run the build command.
pub async fn run(config_path: &Path, overrides: Overrides) -> Result<()> {
    tracing::info!("Building static site...");

    let config = load_config(config_path)?;

    let policy = if overrides.lenient {
        FetchPolicy::Empty
    } else {
        config.file.store.fetch_policy
    };

    let snapshot = overrides
        .snapshot
        .clone()
        .or_else(|| match config.file.store.kind {
            StoreKind::Snapshot => Some(config.resolve(&config.file.store.snapshot)),
            StoreKind::Firestore => None,
        });

    let store = open_store(&config, snapshot.as_deref())?;
    tracing::info!("Loading content from {}", store.name());

    let loaded = SiteLoader::new(policy).load(store.as_ref()).await;
    if let Err(e) = store.close().await {
        tracing::warn!("Failed to close {}: {}", store.name(), e);
    }
    let data = loaded?;

    tracing::info!("Loaded {} records", data.len());

    // Content sources stay out of the published assets whichever store is used
    let mut exclude_paths = vec![
        config_path.to_path_buf(),
        config.resolve(&config.file.store.snapshot),
    ];
    exclude_paths.extend(snapshot);

    let site = &config.file.site;
    let build_config = BuildConfig {
        project_root: config.resolve(&config.file.build.root),
        output_dir: overrides
            .output
            .unwrap_or_else(|| config.resolve(&config.file.build.output)),
        templates_dir: config.resolve(&config.file.build.templates),
        layout: SiteLayout::new(
            &site.base_url,
            &site.default_language,
            site.languages.clone(),
            site.lang_prefix,
        ),
        language_names: site.language_names.clone(),
        copy_assets: true,
        exclude: config.file.build.exclude.clone(),
        exclude_paths,
        data_json: config.file.build.data_json,
        robots: config.file.build.robots,
    };

    let result = StaticBuilder::new(build_config)?.build(&data)?;

    if result.skipped > 0 {
        tracing::warn!("Skipped {} records", result.skipped);
    }
    if result.asset_failures > 0 {
        tracing::warn!("{} assets failed to copy", result.asset_failures);
    }

    tracing::info!(
        "Built {} pages and {} home pages, {} sitemap entries, {} assets in {}ms",
        result.pages,
        result.home_pages,
        result.sitemap_entries,
        result.assets,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    Ok(())
}

fn open_store(config: &LoadedConfig, snapshot: Option<&Path>) -> Result<Box<dyn DocumentStore>> {
    if let Some(path) = snapshot {
        let store = SnapshotStore::open(path)
            .with_context(|| format!("Failed to open snapshot {}", path.display()))?;
        return Ok(Box::new(store));
    }

    let store_config = &config.file.store;
    let token = std::env::var(&store_config.token_env)
        .ok()
        .filter(|t| !t.trim().is_empty());
    if token.is_none() {
        tracing::debug!("{} not set, connecting without credentials", store_config.token_env);
    }

    let store = FirestoreStore::connect(FirestoreConfig {
        project_id: store_config.project_id.clone(),
        database: store_config.database.clone(),
        api_base: store_config.api_base.clone(),
        token,
        page_size: store_config.page_size,
    })
    .context("Failed to configure Firestore")?;

    Ok(Box::new(store))
}
