//! Copies static assets from the project root into the output directory.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Top-level names that are never copied.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    // generator sources and configuration
    "generate_site.py",
    "generate_site+.py",
    "generate_site_debug.py",
    "sitesmith.toml",
    "Cargo.toml",
    "Cargo.lock",
    "target",
    "__pycache__",
    // templates
    "template.html",
    "home_template.html",
    "base.html",
    // version control and CI
    ".git",
    ".github",
    ".gitignore",
    ".gitlab-ci.yml",
    // credentials
    ".env",
    "service-account.json",
    "serviceAccountKey.json",
    "firebase.json",
    ".firebaserc",
    // documentation
    "README.md",
    "LICENSE",
];

/// Outcome of an asset copy pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyReport {
    /// Top-level entries copied
    pub copied: Vec<String>,

    /// Top-level entries that failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Errors that can occur while copying a single entry.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("Failed to read {0}: {1}")]
    Read(String, String),

    #[error("Failed to write {0}: {1}")]
    Write(String, String),
}

/// Mirrors the project root into the output directory.
#[derive(Debug, Clone)]
pub struct AssetCopier {
    root: PathBuf,
    output: PathBuf,
    excludes: Vec<String>,
}

impl AssetCopier {
    /// Create a copier with the default denylist.
    pub fn new(root: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output: output.into(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Add top-level names to the denylist.
    pub fn exclude<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Exclude whatever top-level entry of the root contains `path`.
    pub fn exclude_path(self, path: &Path) -> Self {
        match top_level_name(&self.root, path) {
            Some(name) => self.exclude([name]),
            None => self,
        }
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.excludes.iter().any(|e| e == name)
    }

    /// Copy every non-excluded top-level entry. Failures are logged and
    /// recorded; the pass always completes.
    pub fn copy_all(&self) -> CopyReport {
        let mut report = CopyReport::default();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.root.display(), e);
                report
                    .failed
                    .push((self.root.display().to_string(), e.to_string()));
                return report;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| !self.is_excluded(name))
            .collect();
        names.sort();

        for name in names {
            let source = self.root.join(&name);
            let dest = self.output.join(&name);

            // The output directory may live under the root under any name
            if same_path(&source, &self.output) {
                continue;
            }

            match copy_entry(&source, &dest) {
                Ok(()) => {
                    tracing::debug!("Copied {}", name);
                    report.copied.push(name);
                }
                Err(e) => {
                    tracing::error!("Failed to copy {}: {}", name, e);
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            "Copied {} assets ({} failed)",
            report.copied.len(),
            report.failed.len()
        );

        report
    }
}

fn copy_entry(source: &Path, dest: &Path) -> Result<(), CopyError> {
    if source.is_dir() {
        if dest.exists() {
            fs::remove_dir_all(dest)
                .map_err(|e| CopyError::Write(dest.display().to_string(), e.to_string()))?;
        }
        copy_dir(source, dest)
    } else {
        fs::copy(source, dest)
            .map(|_| ())
            .map_err(|e| CopyError::Write(dest.display().to_string(), e.to_string()))
    }
}

fn copy_dir(source: &Path, dest: &Path) -> Result<(), CopyError> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| CopyError::Read(source.display().to_string(), e.to_string()))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| CopyError::Write(target.display().to_string(), e.to_string()))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| CopyError::Write(target.display().to_string(), e.to_string()))?;
        }
    }

    Ok(())
}

/// First component of `path` relative to `root`, if `path` is inside it.
fn top_level_name(root: &Path, path: &Path) -> Option<String> {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

    path.strip_prefix(&root)
        .ok()?
        .components()
        .next()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn project() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();

        fs::write(root.join("style.css"), "body {}").unwrap();
        fs::write(root.join("generate_site.py"), "print('hi')").unwrap();
        fs::write(root.join("template.html"), "{{ item }}").unwrap();
        fs::write(root.join("README.md"), "# docs").unwrap();
        fs::create_dir_all(root.join("img/icons")).unwrap();
        fs::write(root.join("img/icons/logo.svg"), "<svg/>").unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();

        temp
    }

    #[test]
    fn copies_assets_and_skips_denylist() {
        let temp = project();
        let out = temp.path().join("build_output");
        fs::create_dir_all(&out).unwrap();

        let report = AssetCopier::new(temp.path(), &out).exclude_path(&out).copy_all();

        assert_eq!(report.copied, vec!["img".to_string(), "style.css".to_string()]);
        assert!(report.failed.is_empty());
        assert!(out.join("style.css").exists());
        assert!(out.join("img/icons/logo.svg").exists());
        assert!(!out.join("generate_site.py").exists());
        assert!(!out.join("template.html").exists());
        assert!(!out.join(".git").exists());
        assert!(!out.join("build_output").exists());
    }

    #[test]
    fn replaces_existing_directories() {
        let temp = project();
        let out = temp.path().join("dist");
        fs::create_dir_all(out.join("img")).unwrap();
        fs::write(out.join("img/stale.png"), "old").unwrap();

        AssetCopier::new(temp.path(), &out).exclude(["dist"]).copy_all();

        assert!(!out.join("img/stale.png").exists());
        assert!(out.join("img/icons/logo.svg").exists());
    }

    #[test]
    fn overwrites_files() {
        let temp = project();
        let out = temp.path().join("dist");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("style.css"), "old").unwrap();

        AssetCopier::new(temp.path(), &out).exclude(["dist"]).copy_all();

        assert_eq!(fs::read_to_string(out.join("style.css")).unwrap(), "body {}");
    }

    #[test]
    fn skips_output_directory_even_without_exclude() {
        let temp = project();
        let out = temp.path().join("public");
        fs::create_dir_all(&out).unwrap();

        let report = AssetCopier::new(temp.path(), &out).copy_all();

        assert!(!report.copied.contains(&"public".to_string()));
        assert!(!out.join("public").exists());
    }

    #[test]
    fn missing_root_is_reported() {
        let temp = tempdir().unwrap();

        let report = AssetCopier::new(temp.path().join("nope"), temp.path().join("out")).copy_all();

        assert_eq!(report.failed.len(), 1);
        assert!(report.copied.is_empty());
    }
}
