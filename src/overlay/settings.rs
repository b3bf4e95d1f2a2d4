//! Live cycle configuration shared with the running controller.

use std::time::Duration;

use crate::config::{AppConfig, INTERVAL_MINUTES_RANGE, SHOW_SECONDS_RANGE};

/// Durations for one show/hide cycle. Read at the start of every phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSettings {
    pub show_seconds: f64,
    pub interval_minutes: f64,
    pub fullscreen: bool,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            show_seconds: crate::config::DEFAULT_SHOW_SECONDS,
            interval_minutes: crate::config::DEFAULT_INTERVAL_MINUTES,
            fullscreen: true,
        }
    }
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

impl CycleSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            show_seconds: config.show_seconds,
            interval_minutes: config.interval_minutes,
            fullscreen: config.fullscreen,
        }
    }

    pub fn show_duration(&self) -> Duration {
        Duration::from_secs_f64(clamp(self.show_seconds, SHOW_SECONDS_RANGE))
    }

    pub fn interval_duration(&self) -> Duration {
        Duration::from_secs_f64(clamp(self.interval_minutes, INTERVAL_MINUTES_RANGE) * 60.0)
    }

    /// Show for the advertisement's content length when known, else the configured time.
    pub fn track_content(&mut self, cycle_seconds: f64, configured_seconds: f64) {
        self.show_seconds = if cycle_seconds.is_finite() && cycle_seconds > 0.0 {
            cycle_seconds
        } else {
            configured_seconds
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_durations() {
        let settings = CycleSettings::default();
        assert_eq!(settings.show_duration(), Duration::from_secs(15));
        assert_eq!(settings.interval_duration(), Duration::from_secs(30));
        assert!(settings.fullscreen);
    }

    #[test]
    fn test_durations_are_clamped() {
        let settings = CycleSettings {
            show_seconds: 0.0,
            interval_minutes: f64::NAN,
            fullscreen: false,
        };
        assert_eq!(settings.show_duration(), Duration::from_secs(1));
        assert_eq!(settings.interval_duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_track_content() {
        let mut settings = CycleSettings::default();
        settings.track_content(8.0, 15.0);
        assert_eq!(settings.show_seconds, 8.0);

        settings.track_content(0.0, 20.0);
        assert_eq!(settings.show_seconds, 20.0);
    }
}
