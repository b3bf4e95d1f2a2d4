//! Playlist ordering, rotation and the playback surface state.

pub mod cursor;
pub mod rotation;
pub mod surface;

pub use cursor::PlaybackCursor;
pub use rotation::{AdRotation, FileIndexStore, IndexStore, MemoryIndexStore};
pub use surface::{PlaybackSurface, SurfaceCommand, SurfaceEvent, SurfaceView};
