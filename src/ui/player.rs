//! Overlay player view - renders the playback surface output.

use std::cell::Cell;
use std::rc::Rc;

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::app::{AppMessage, MessageSender};
use crate::playback::{SurfaceEvent, SurfaceView};
use crate::video::{MediaSignal, VideoPipeline};

/// References to updateable widgets in the player view
pub struct PlayerWidgets {
    pub root: gtk::Overlay,
    picture: gtk::Picture,
    message: gtk::Label,
    video: Option<VideoPipeline>,
    /// Generation of the video currently loaded into the pipeline
    video_generation: Rc<Cell<u64>>,
    tx: MessageSender,
}

/// Create the player view
pub fn create_player_screen(tx: MessageSender) -> PlayerWidgets {
    let root = gtk::Overlay::new();
    root.add_css_class("player-screen");

    let picture = gtk::Picture::new();
    picture.set_content_fit(gtk::ContentFit::Contain);
    picture.set_hexpand(true);
    picture.set_vexpand(true);
    root.set_child(Some(&picture));

    let message = gtk::Label::new(None);
    message.add_css_class("player-message");
    message.set_wrap(true);
    message.set_justify(gtk::Justification::Center);
    message.set_halign(gtk::Align::Center);
    message.set_valign(gtk::Align::Center);
    message.set_visible(false);
    root.add_overlay(&message);

    let video_generation = Rc::new(Cell::new(0));
    let video = {
        let tx = tx.clone();
        let generation = video_generation.clone();
        VideoPipeline::new(move |signal| {
            let generation = generation.get();
            let event = match signal {
                MediaSignal::Ended => SurfaceEvent::MediaEnded { generation },
                MediaSignal::Failed(_) => SurfaceEvent::MediaFailed { generation },
            };
            tx.send(AppMessage::Surface(event));
        })
    };
    let video = match video {
        Ok(video) => Some(video),
        Err(e) => {
            log::error!("Video playback unavailable: {}", e);
            None
        }
    };

    PlayerWidgets {
        root,
        picture,
        message,
        video,
        video_generation,
        tx,
    }
}

impl PlayerWidgets {
    pub fn render(&self, view: &SurfaceView) {
        match view {
            SurfaceView::Hidden => {
                self.clear_picture();
                self.message.set_visible(false);
            }
            SurfaceView::Loading => self.show_message("Loading…"),
            SurfaceView::Empty => self.show_message("No advertisements to show"),
            SurfaceView::Error(error) => self.show_message(error),
            SurfaceView::Image { url, generation } => self.show_image(url, *generation),
            SurfaceView::Video { url, generation } => self.show_video(url, *generation),
        }
    }

    /// Pause the video and detach its source
    pub fn stop_video(&self) {
        if let Some(video) = &self.video {
            if let Err(e) = video.stop() {
                log::warn!("Failed to stop video: {}", e);
            }
        }
    }

    fn clear_picture(&self) {
        self.picture.set_paintable(None::<&gtk::gdk::Paintable>);
    }

    fn show_message(&self, text: &str) {
        self.clear_picture();
        self.message.set_label(text);
        self.message.set_visible(true);
    }

    fn fail(&self, generation: u64) {
        self.tx
            .send(AppMessage::Surface(SurfaceEvent::MediaFailed { generation }));
    }

    fn show_image(&self, url: &str, generation: u64) {
        self.message.set_visible(false);

        match gtk::gdk::Texture::from_file(&gio::File::for_uri(url)) {
            Ok(texture) => self.picture.set_paintable(Some(&texture)),
            Err(e) => {
                log::warn!("Failed to load image {}: {}", url, e);
                self.clear_picture();
                self.fail(generation);
            }
        }
    }

    fn show_video(&self, url: &str, generation: u64) {
        self.message.set_visible(false);

        let Some(video) = &self.video else {
            self.clear_picture();
            self.fail(generation);
            return;
        };

        self.video_generation.set(generation);
        self.picture.set_paintable(Some(video.paintable()));
        if let Err(e) = video.load(url) {
            log::warn!("Failed to start video {}: {}", url, e);
            self.fail(generation);
        }
    }
}
