//! OS-level exit shortcut (Ctrl+Shift+F) via the global-hotkey crate.

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Global hotkey manager unavailable: {0}")]
    Manager(global_hotkey::Error),
    #[error("Failed to register Ctrl+Shift+F: {0}")]
    Register(global_hotkey::Error),
}

/// Registered global hotkey, unregistered on drop.
///
/// Must be created and polled on the GTK main thread.
pub struct HotkeyTracker {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl HotkeyTracker {
    pub fn new() -> Result<Self, HotkeyError> {
        let manager = GlobalHotKeyManager::new().map_err(HotkeyError::Manager)?;
        let hotkey = HotKey::new(Some(Modifiers::CONTROL | Modifiers::SHIFT), Code::KeyF);

        manager.register(hotkey).map_err(HotkeyError::Register)?;
        log::info!("Registered global exit shortcut Ctrl+Shift+F");

        Ok(Self { manager, hotkey })
    }

    /// Drain pending events; true if the shortcut was pressed.
    pub fn poll(&self) -> bool {
        let receiver = GlobalHotKeyEvent::receiver();
        let mut pressed = false;
        while let Ok(event) = receiver.try_recv() {
            if event.id == self.hotkey.id() && event.state == HotKeyState::Pressed {
                pressed = true;
            }
        }
        pressed
    }
}

impl Drop for HotkeyTracker {
    fn drop(&mut self) {
        let _ = self.manager.unregister(self.hotkey);
    }
}
