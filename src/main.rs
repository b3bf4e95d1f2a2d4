//! Ad Overlay Kiosk - GTK4 + GStreamer advertisement overlay.
//!
//! Architecture:
//! - `config` module: INI configuration with auto-created defaults
//! - `manifest` module: zip archive loading, manifest cache and asset URLs
//! - `playback` module: playlist cursor, rotation and GTK-free surface state
//! - `state` module: GTK-free overlay state machine (testable)
//! - `overlay` module: async lifecycle controller and platform seams
//! - `app` module: Bridges the state machines to GTK and async operations
//! - `video` module: GStreamer pipeline for advertisement videos
//! - `ui` module: GTK4 widgets and screens

use std::path::PathBuf;
use std::sync::Arc;

use gtk4::prelude::*;
use libadwaita as adw;

mod app;
mod config;
mod manifest;
mod overlay;
mod playback;
mod state;
mod ui;
mod video;

use app::{AppContext, AppMessage};
use config::{AppConfig, IniData};
use manifest::{ManifestProvider, ZipManifestSource};
use playback::{AdRotation, FileIndexStore, IndexStore, MemoryIndexStore};
use state::ExitMode;
use ui::{HotkeyTracker, MainWindow};

fn rotation_store(data_dir: &std::path::Path) -> Box<dyn IndexStore> {
    match std::fs::create_dir_all(data_dir) {
        Ok(()) => Box::new(FileIndexStore::new(data_dir.join(config::AD_INDEX_FILE_NAME))),
        Err(e) => {
            log::warn!(
                "Data directory {} unusable ({}), rotation will not persist",
                data_dir.display(),
                e
            );
            Box::new(MemoryIndexStore::default())
        }
    }
}

fn main() -> glib::ExitCode {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting Ad Overlay Kiosk");

    // Create tokio runtime for async operations
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => Arc::new(runtime),
        Err(e) => {
            log::error!("Failed to create tokio runtime: {}", e);
            return glib::ExitCode::FAILURE;
        }
    };

    if let Err(e) = gstreamer::init() {
        log::error!("Failed to initialize GStreamer: {}", e);
        return glib::ExitCode::FAILURE;
    }
    if let Err(e) = gstgtk4::plugin_register_static() {
        log::error!("Failed to register gtk4paintablesink: {}", e);
    }

    let data_dir = config::data_dir();
    let config_dir = config::config_dir().unwrap_or_else(|e| {
        log::warn!("{}; using {}", e, data_dir.display());
        data_dir.clone()
    });
    let app_config = AppConfig::load_from(&config_dir).unwrap_or_else(|e| {
        log::error!("Failed to load configuration: {}", e);
        AppConfig::from_ini(PathBuf::new(), &IniData::default())
    });
    log::info!(
        "Cycle: show {}s every {} min, fullscreen {}",
        app_config.show_seconds,
        app_config.interval_minutes,
        app_config.fullscreen
    );

    let provider = Arc::new(ManifestProvider::new(Arc::new(ZipManifestSource::new(
        config_dir,
        data_dir.clone(),
    ))));

    let app = adw::Application::builder()
        .application_id(config::APP_ID)
        .build();

    let runtime_clone = runtime.clone();

    app.connect_activate(move |app| {
        let rotation = AdRotation::new(rotation_store(&data_dir));
        let (ctx, mut rx) = AppContext::new(
            runtime_clone.clone(),
            app_config.clone(),
            provider.clone(),
            rotation,
            overlay::foreground::detect(),
        );

        // Create main window (GTK layer)
        let main_window = MainWindow::new(app, ctx.clone());

        let hotkey = match HotkeyTracker::new() {
            Ok(tracker) => Some(tracker),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        // Poll the tokio channel and the global hotkey from the GTK main loop
        let window = main_window.clone();
        glib::timeout_add_local(
            std::time::Duration::from_millis(config::MESSAGE_POLL_INTERVAL_MS),
            move || {
                if hotkey.as_ref().is_some_and(|h| h.poll()) {
                    window.handle_message(AppMessage::ExitOverlay(ExitMode::ToApp));
                }
                while let Ok(msg) = rx.try_recv() {
                    window.handle_message(msg);
                }
                glib::ControlFlow::Continue
            },
        );

        ctx.load_manifest();
        main_window.window.present();
    });

    let status = app.run();

    log::info!("Ad Overlay Kiosk shutting down");
    status
}
