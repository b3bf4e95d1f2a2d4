//! Asset path to playable URL resolution.

use std::path::{Path, PathBuf};

use url::Url;

/// Resolves manifest-relative asset paths against the extraction directory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetResolver {
    root_dir: Option<PathBuf>,
    manifest_subdir: String,
}

impl AssetResolver {
    pub fn new(root_dir: Option<PathBuf>, manifest_subdir: impl Into<String>) -> Self {
        Self {
            root_dir,
            manifest_subdir: manifest_subdir.into(),
        }
    }

    /// Absolute path of an asset, or `None` while the root directory is unknown.
    pub fn resolve_path(&self, asset_path: &str) -> Option<PathBuf> {
        let root = self.root_dir.as_deref()?;
        Some(
            segments(&self.manifest_subdir)
                .chain(segments(asset_path))
                .fold(root.to_path_buf(), |acc, s| acc.join(s)),
        )
    }

    /// Playable `file://` URL for an asset. Empty when not ready.
    pub fn resolve(&self, asset_path: &str) -> String {
        let Some(path) = self.resolve_path(asset_path) else {
            return String::new();
        };
        to_file_url(&path).unwrap_or_else(|| {
            log::warn!("Cannot convert {} to a file URL", path.display());
            String::new()
        })
    }
}

/// Path components that stay below the root. Parent references are dropped.
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
}

fn to_file_url(path: &Path) -> Option<String> {
    Url::from_file_path(path).ok().map(String::from)
}
