//! GStreamer playbin pipeline for muted advertisement videos.

use gstreamer as gst;
use gstreamer::prelude::*;
use gtk4 as gtk;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("GStreamer error: {0}")]
    Gstreamer(#[from] glib::Error),
    #[error("GStreamer bool error: {0}")]
    GstreamerBool(#[from] glib::BoolError),
    #[error("Failed to create element: {0}")]
    ElementCreation(String),
    #[error("Pipeline has no bus")]
    NoBus,
    #[error("State change failed")]
    StateChange,
}

/// End-of-stream or error reported by the bus
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    Ended,
    Failed(String),
}

/// Video pipeline rendering into a GTK paintable
pub struct VideoPipeline {
    playbin: gst::Element,
    paintable: gtk::gdk::Paintable,
    _bus_watch: gst::bus::BusWatchGuard,
}

impl VideoPipeline {
    /// Create a muted playbin. `on_signal` runs on the GTK main loop.
    pub fn new(on_signal: impl Fn(MediaSignal) + 'static) -> Result<Self, PipelineError> {
        gst::init()?;

        let sink = gst::ElementFactory::make("gtk4paintablesink")
            .build()
            .map_err(|_| PipelineError::ElementCreation("gtk4paintablesink".into()))?;
        let paintable = sink.property::<gtk::gdk::Paintable>("paintable");

        let playbin = gst::ElementFactory::make("playbin")
            .property("video-sink", &sink)
            .property("mute", true)
            .property("volume", 0.0f64)
            .build()
            .map_err(|_| PipelineError::ElementCreation("playbin".into()))?;

        let bus = playbin.bus().ok_or(PipelineError::NoBus)?;
        let bus_watch = bus.add_watch_local(move |_bus, msg| {
            use gst::MessageView;

            match msg.view() {
                MessageView::Eos(..) => {
                    log::debug!("Video reached end of stream");
                    on_signal(MediaSignal::Ended);
                }
                MessageView::Error(err) => {
                    log::warn!(
                        "Video error from {:?}: {}",
                        err.src().map(|s| s.path_string()),
                        err.error()
                    );
                    on_signal(MediaSignal::Failed(err.error().to_string()));
                }
                _ => {}
            }
            glib::ControlFlow::Continue
        })?;

        Ok(Self {
            playbin,
            paintable,
            _bus_watch: bus_watch,
        })
    }

    /// Get the paintable for use in GTK widgets
    pub fn paintable(&self) -> &gtk::gdk::Paintable {
        &self.paintable
    }

    /// Replace the current source and start playing from the beginning
    pub fn load(&self, uri: &str) -> Result<(), PipelineError> {
        log::info!("Playing video {}", uri);
        self.playbin
            .set_state(gst::State::Null)
            .map_err(|_| PipelineError::StateChange)?;
        self.playbin.set_property("uri", uri);
        self.playbin
            .set_state(gst::State::Playing)
            .map_err(|_| PipelineError::StateChange)?;
        Ok(())
    }

    /// Stop playback and detach the source
    pub fn stop(&self) -> Result<(), PipelineError> {
        self.playbin
            .set_state(gst::State::Null)
            .map_err(|_| PipelineError::StateChange)?;
        self.playbin.set_property("uri", None::<&str>);
        Ok(())
    }
}

impl Drop for VideoPipeline {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
