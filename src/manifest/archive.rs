//! Zip archive unpacking and `manifest.json` discovery.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use zip::ZipArchive;

use super::model::Manifest;
use crate::config::ConfigError;

const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("manifest.json not found inside the zip archive")]
    MissingManifest,
    #[error("Invalid manifest.json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Manifest loading task failed: {0}")]
    Task(String),
}

impl ManifestError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A parsed manifest together with where its assets were extracted
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedManifest {
    pub manifest: Arc<Manifest>,
    /// Extraction root on disk
    pub root_dir: PathBuf,
    /// Directory of `manifest.json` inside the archive ("" at the root)
    pub manifest_subdir: String,
}

pub fn normalize_zip_path(name: &str) -> String {
    name.replace('\\', "/")
}

/// Reject traversal, absolute and drive-qualified entry names.
pub fn is_safe_zip_path(name: &str) -> bool {
    !(name.contains("..") || name.starts_with('/') || name.starts_with('\\') || name.contains(':'))
}

/// Find `manifest.json` at the archive root or one directory level down.
pub fn locate_manifest(entries: &[String]) -> Option<&str> {
    let safe = || entries.iter().filter(|e| is_safe_zip_path(e));

    safe()
        .find(|e| e.as_str() == MANIFEST_FILE_NAME)
        .or_else(|| {
            safe().find(|e| {
                e.strip_suffix(MANIFEST_FILE_NAME)
                    .and_then(|dir| dir.strip_suffix('/'))
                    .is_some_and(|dir| !dir.is_empty() && !dir.contains('/'))
            })
        })
        .map(String::as_str)
}

fn manifest_subdir(entry: &str) -> String {
    entry
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string())
        .unwrap_or_default()
}

fn extraction_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!(
        "{}-{:x}",
        now.as_millis(),
        now.subsec_nanos() ^ std::process::id()
    )
}

fn join_segments(base: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base.to_path_buf(), |acc, s| acc.join(s))
}

/// Unpack `zip_path` under `extraction_base/ads/<zip stem>/<id>/` and parse its manifest.
pub fn load_from_zip(zip_path: &Path, extraction_base: &Path) -> Result<LoadedManifest, ManifestError> {
    log::info!("Loading advertisements from {}", zip_path.display());

    let file = File::open(zip_path).map_err(ManifestError::io(zip_path))?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let entries: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| normalize_zip_path(f.name())))
        .collect();
    log::debug!("Archive entries: {}", entries.len());

    let manifest_entry = locate_manifest(&entries)
        .ok_or(ManifestError::MissingManifest)?
        .to_string();
    let subdir = manifest_subdir(&manifest_entry);
    log::info!("Found {} (subdir: {:?})", manifest_entry, subdir);

    let zip_stem = zip_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("archive"));
    let archive_dir = extraction_base.join("ads").join(zip_stem);
    let root_dir = archive_dir.join(extraction_id());
    fs::create_dir_all(&root_dir).map_err(ManifestError::io(&root_dir))?;

    let manifest = match extract_and_parse(&mut archive, &root_dir, &manifest_entry) {
        Ok(manifest) => manifest,
        Err(e) => {
            remove_dir_logged(&root_dir);
            return Err(e);
        }
    };
    log::info!(
        "Parsed manifest for {} with {} advertisements",
        manifest.date,
        manifest.items.len()
    );
    prune_extractions(&archive_dir, &root_dir);

    Ok(LoadedManifest {
        manifest: Arc::new(manifest),
        root_dir,
        manifest_subdir: subdir,
    })
}

fn extract_and_parse<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    root_dir: &Path,
    manifest_entry: &str,
) -> Result<Manifest, ManifestError> {
    let written = extract_entries(archive, root_dir)?;
    log::info!("Extracted {} files to {}", written, root_dir.display());

    let manifest_path = join_segments(root_dir, manifest_entry);
    let text = fs::read_to_string(&manifest_path).map_err(ManifestError::io(&manifest_path))?;
    Ok(Manifest::from_json(&text)?)
}

/// Remove earlier extractions of the same archive, keeping `current`.
fn prune_extractions(archive_dir: &Path, current: &Path) {
    let entries = match fs::read_dir(archive_dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {}", archive_dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path != current && path.is_dir() {
            log::debug!("Removing stale extraction {}", path.display());
            remove_dir_logged(&path);
        }
    }
}

fn remove_dir_logged(path: &Path) {
    if let Err(e) = fs::remove_dir_all(path) {
        log::warn!("Failed to remove {}: {}", path.display(), e);
    }
}

fn extract_entries<R: io::Read + io::Seek>(
    archive: &mut ZipArchive<R>,
    root_dir: &Path,
) -> Result<usize, ManifestError> {
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = normalize_zip_path(entry.name());

        if !is_safe_zip_path(&name) {
            log::warn!("Skipping unsafe archive entry: {}", name);
            continue;
        }
        if entry.is_dir() || name.ends_with('/') {
            continue;
        }

        let out_path = join_segments(root_dir, &name);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(ManifestError::io(parent))?;
        }

        let mut out = File::create(&out_path).map_err(ManifestError::io(&out_path))?;
        io::copy(&mut entry, &mut out).map_err(ManifestError::io(&out_path))?;
        written += 1;
    }

    Ok(written)
}
