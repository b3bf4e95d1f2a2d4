//! Configuration constants and the INI-backed runtime configuration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// GTK application id
pub const APP_ID: &str = "com.adoverlay.kiosk";

/// Directory name used under the platform config/data directories
pub const APP_DIR_NAME: &str = "ad-overlay";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "ad-overlay.ini";

/// File holding the last played advertisement index
pub const AD_INDEX_FILE_NAME: &str = "current-ad-index.json";

/// Visible phase length when no content duration is known
pub const DEFAULT_SHOW_SECONDS: f64 = 15.0;

/// Hidden phase length between two overlay cycles
pub const DEFAULT_INTERVAL_MINUTES: f64 = 0.5;

/// Accepted range for `[player] intervalMinutes`
pub const INTERVAL_MINUTES_RANGE: (f64, f64) = (0.05, 1440.0);

/// Accepted range for `[player] showSeconds`
pub const SHOW_SECONDS_RANGE: (f64, f64) = (1.0, 3600.0);

/// Duration used for assets without a usable `durationSeconds`
pub const FALLBACK_ASSET_SECONDS: f64 = 10.0;

/// Shortest timer ever scheduled for an asset
pub const MIN_ASSET_SECONDS: f64 = 1.0;

/// Longest timer ever scheduled for an asset (one day, well inside glib's millisecond timeouts)
pub const MAX_ASSET_SECONDS: f64 = 86_400.0;

/// How often the GTK main loop drains the async message channel
pub const MESSAGE_POLL_INTERVAL_MS: u64 = 16;

/// Upper bound on a frame wait when the frame clock is not ticking
pub const FRAME_WAIT_FALLBACK_MS: u64 = 100;

const DEFAULT_INI: &str = "; ad-overlay.ini

[ads]
; Absolute path to the zip archive holding manifest.json and its assets
zipPath=

[player]
; Minutes between two overlay cycles (0.05 - 1440)
intervalMinutes=0.5
; Seconds the overlay stays visible when the content length is unknown (1 - 3600)
showSeconds=15
; Use fullscreen (true) or a maximized borderless window (false)
fullscreen=true
";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zipPath is not configured. Edit the file:\n{}\n\nIn the [ads] section, set zipPath=...", .ini_path.display())]
    MissingZipPath { ini_path: PathBuf },
}

/// Parsed INI content: section -> key -> value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IniData {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniData {
    /// Parse INI text. Keys before the first section land in `default`.
    pub fn parse(text: &str) -> Self {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut section = String::from("default");
        sections.entry(section.clone()).or_default();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                section = if name.is_empty() {
                    String::from("default")
                } else {
                    name.to_string()
                };
                sections.entry(section.clone()).or_default();
                continue;
            }

            let Some(eq) = line.find('=') else { continue };
            if eq == 0 {
                continue;
            }

            let key = line[..eq].trim().to_string();
            let value = line[eq + 1..].trim().to_string();
            sections.entry(section.clone()).or_default().insert(key, value);
        }

        Self { sections }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }
}

/// Parse a number, falling back when it is not finite or outside `range`.
fn parse_number(raw: Option<&str>, fallback: f64, range: (f64, f64)) -> f64 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return fallback;
    };
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n >= range.0 && n <= range.1 => n,
        _ => fallback,
    }
}

fn parse_bool(raw: Option<&str>, fallback: bool) -> bool {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes" | "on") => true,
        Some("false" | "0" | "no" | "off") => false,
        _ => fallback,
    }
}

/// Runtime configuration read from the INI file
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub ini_path: PathBuf,
    pub ads_zip_path: Option<PathBuf>,
    pub interval_minutes: f64,
    pub show_seconds: f64,
    pub fullscreen: bool,
}

impl AppConfig {
    /// Build a configuration from already parsed INI data.
    pub fn from_ini(ini_path: PathBuf, ini: &IniData) -> Self {
        let ads_zip_path = ini
            .get("ads", "zipPath")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        Self {
            ini_path,
            ads_zip_path,
            interval_minutes: parse_number(
                ini.get("player", "intervalMinutes"),
                DEFAULT_INTERVAL_MINUTES,
                INTERVAL_MINUTES_RANGE,
            ),
            show_seconds: parse_number(
                ini.get("player", "showSeconds"),
                DEFAULT_SHOW_SECONDS,
                SHOW_SECONDS_RANGE,
            ),
            fullscreen: parse_bool(ini.get("player", "fullscreen"), true),
        }
    }

    /// Load the configuration from `config_dir`, creating the file with
    /// commented defaults when it does not exist yet.
    pub fn load_from(config_dir: &Path) -> Result<Self, ConfigError> {
        let ini_path = ensure_ini(config_dir)?;
        let text = fs::read_to_string(&ini_path).map_err(|source| ConfigError::Io {
            path: ini_path.clone(),
            source,
        })?;
        Ok(Self::from_ini(ini_path, &IniData::parse(&text)))
    }

    /// The archive path, or an actionable error naming the file and key to edit.
    pub fn require_zip_path(&self) -> Result<&Path, ConfigError> {
        self.ads_zip_path
            .as_deref()
            .ok_or_else(|| ConfigError::MissingZipPath {
                ini_path: self.ini_path.clone(),
            })
    }
}

/// Create `config_dir/ad-overlay.ini` with defaults if missing and return its path.
pub fn ensure_ini(config_dir: &Path) -> Result<PathBuf, ConfigError> {
    fs::create_dir_all(config_dir).map_err(|source| ConfigError::Io {
        path: config_dir.to_path_buf(),
        source,
    })?;

    let ini_path = config_dir.join(CONFIG_FILE_NAME);
    if !ini_path.exists() {
        log::info!("Creating default configuration at {}", ini_path.display());
        fs::write(&ini_path, DEFAULT_INI).map_err(|source| ConfigError::Io {
            path: ini_path.clone(),
            source,
        })?;
    }

    Ok(ini_path)
}

/// Platform configuration directory for this application
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .ok_or(ConfigError::NoConfigDir)
}

/// Platform data directory for extracted archives and the rotation index
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}
