//! Save and restore the window that had focus before the overlay took it.

use std::process::Command;
use std::sync::{Arc, Mutex};

use super::host::PlatformError;

pub trait ForegroundTracker: Send + Sync {
    fn save(&self) -> Result<(), PlatformError>;
    fn restore(&self) -> Result<(), PlatformError>;
}

/// X11 implementation backed by `xdotool`
#[derive(Default)]
pub struct XdotoolForeground {
    saved: Mutex<Option<String>>,
}

fn xdotool(args: &[&str]) -> Result<String, PlatformError> {
    let output = Command::new("xdotool")
        .args(args)
        .output()
        .map_err(|e| PlatformError::Command(format!("xdotool: {}", e)))?;

    if !output.status.success() {
        return Err(PlatformError::Command(format!(
            "xdotool {} exited with {}",
            args.join(" "),
            output.status
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

impl XdotoolForeground {
    /// Detect a working `xdotool`.
    pub fn detect() -> Option<Self> {
        match xdotool(&["version"]) {
            Ok(version) => {
                log::info!("Foreground tracking via {}", version);
                Some(Self::default())
            }
            Err(e) => {
                log::info!("Foreground tracking unavailable: {}", e);
                None
            }
        }
    }
}

impl ForegroundTracker for XdotoolForeground {
    fn save(&self) -> Result<(), PlatformError> {
        let window = xdotool(&["getactivewindow"])?;
        log::debug!("Saved foreground window {}", window);
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(window);
        }
        Ok(())
    }

    fn restore(&self) -> Result<(), PlatformError> {
        let window = self.saved.lock().ok().and_then(|mut saved| saved.take());
        match window {
            Some(window) => xdotool(&["windowactivate", &window]).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// Used when no platform tracker is available
pub struct NoopForeground;

impl ForegroundTracker for NoopForeground {
    fn save(&self) -> Result<(), PlatformError> {
        Ok(())
    }

    fn restore(&self) -> Result<(), PlatformError> {
        Ok(())
    }
}

pub fn detect() -> Arc<dyn ForegroundTracker> {
    match XdotoolForeground::detect() {
        Some(tracker) => Arc::new(tracker),
        None => Arc::new(NoopForeground),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_without_save_is_noop() {
        let tracker = XdotoolForeground::default();
        assert!(tracker.restore().is_ok());
        assert!(NoopForeground.save().is_ok());
        assert!(NoopForeground.restore().is_ok());
    }
}
