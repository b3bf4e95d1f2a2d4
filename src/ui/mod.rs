//! UI components for the kiosk.

pub mod home;
pub mod hotkey;
pub mod player;
pub mod window;

pub use hotkey::HotkeyTracker;
pub use window::MainWindow;
