//! Overlay lifecycle: async controller, window host seam and live settings.

pub mod controller;
pub mod foreground;
pub mod host;
pub mod settings;

pub use controller::OverlayController;
pub use foreground::ForegroundTracker;
pub use host::{OverlayHost, PlatformError};
pub use settings::CycleSettings;
