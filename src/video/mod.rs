//! Video playback through GStreamer.

pub mod pipeline;

pub use pipeline::{MediaSignal, VideoPipeline};
