//! Cached manifest provider with explicit reload.
//!
//! The provider owns a single cache slot for the process. `load()` serves the
//! cached manifest when present, `reload()` clears the slot and fetches again.
//! Observers follow a [`ManifestSnapshot`] through a watch channel.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::{watch, Mutex as AsyncMutex};

use super::archive::{load_from_zip, LoadedManifest, ManifestError};
use super::model::Manifest;
use crate::config::AppConfig;

/// Where manifests come from
pub trait ManifestSource: Send + Sync {
    /// Blocking fetch + unpack + parse
    fn fetch(&self) -> Result<LoadedManifest, ManifestError>;
}

/// Reads `[ads] zipPath` from the configuration on every fetch
pub struct ZipManifestSource {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl ZipManifestSource {
    pub fn new(config_dir: PathBuf, data_dir: PathBuf) -> Self {
        Self {
            config_dir,
            data_dir,
        }
    }
}

impl ManifestSource for ZipManifestSource {
    fn fetch(&self) -> Result<LoadedManifest, ManifestError> {
        let config = AppConfig::load_from(&self.config_dir)?;
        let zip_path = config.require_zip_path()?;
        load_from_zip(zip_path, &self.data_dir)
    }
}

/// Reactive view of the provider state
#[derive(Debug, Clone, Default)]
pub struct ManifestSnapshot {
    pub manifest: Option<Arc<Manifest>>,
    pub root_dir: Option<PathBuf>,
    pub manifest_subdir: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct ManifestCache {
    slot: Mutex<Option<Arc<LoadedManifest>>>,
}

impl ManifestCache {
    fn get(&self) -> Option<Arc<LoadedManifest>> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    fn store(&self, loaded: Arc<LoadedManifest>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(loaded);
        }
    }

    fn invalidate(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

pub struct ManifestProvider {
    source: Arc<dyn ManifestSource>,
    cache: ManifestCache,
    state: watch::Sender<ManifestSnapshot>,
    fetch_lock: AsyncMutex<()>,
}

impl ManifestProvider {
    pub fn new(source: Arc<dyn ManifestSource>) -> Self {
        let (state, _) = watch::channel(ManifestSnapshot::default());
        Self {
            source,
            cache: ManifestCache::default(),
            state,
            fetch_lock: AsyncMutex::new(()),
        }
    }

    pub fn snapshot(&self) -> ManifestSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ManifestSnapshot> {
        self.state.subscribe()
    }

    /// Return the cached manifest, fetching it once if the cache is empty.
    pub async fn load(&self) -> Result<Arc<LoadedManifest>, ManifestError> {
        let _guard = self.fetch_lock.lock().await;

        if let Some(cached) = self.cache.get() {
            self.publish_loaded(&cached);
            return Ok(cached);
        }

        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let source = self.source.clone();
        let result = tokio::task::spawn_blocking(move || source.fetch())
            .await
            .map_err(|e| ManifestError::Task(e.to_string()))
            .and_then(|r| r);

        match result {
            Ok(loaded) => {
                let loaded = Arc::new(loaded);
                self.cache.store(loaded.clone());
                self.publish_loaded(&loaded);
                Ok(loaded)
            }
            Err(e) => {
                log::error!("Failed to load advertisements: {}", e);
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
                Err(e)
            }
        }
    }

    /// Drop the cached manifest and fetch it again.
    pub async fn reload(&self) -> Result<Arc<LoadedManifest>, ManifestError> {
        log::info!("Reloading advertisements");
        self.cache.invalidate();
        self.load().await
    }

    fn publish_loaded(&self, loaded: &LoadedManifest) {
        let snapshot = ManifestSnapshot {
            manifest: Some(loaded.manifest.clone()),
            root_dir: Some(loaded.root_dir.clone()),
            manifest_subdir: Some(loaded.manifest_subdir.clone()),
            loading: false,
            error: None,
        };
        self.state.send_replace(snapshot);
    }
}
