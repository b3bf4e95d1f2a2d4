//! Home screen - manifest status, today's advertisements, reload and play.

use gtk4 as gtk;
use gtk4::prelude::*;

use crate::manifest::{AdKind, AdvertisementItem, ManifestSnapshot};
use crate::playback::cursor::cycle_seconds;

/// `m:ss` for a duration in seconds
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() {
        seconds.max(0.0).round() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

fn describe(item: &AdvertisementItem) -> String {
    let kind = match item.kind {
        AdKind::Image => "Image",
        AdKind::Video => "Video",
    };
    let assets = match item.assets.len() {
        1 => String::from("1 asset"),
        n => format!("{} assets", n),
    };
    format!(
        "#{}  ·  {}  ·  {}  ·  {}",
        item.advertisement_id,
        kind,
        assets,
        format_duration(cycle_seconds(item))
    )
}

/// References to updateable widgets in the home screen
pub struct HomeWidgets {
    pub root: gtk::Box,
    status: gtk::Label,
    list: gtk::ListBox,
    play_button: gtk::Button,
}

/// Create the home screen
pub fn create_home_screen(on_reload: impl Fn() + 'static, on_play: impl Fn() + 'static) -> HomeWidgets {
    let root = gtk::Box::new(gtk::Orientation::Vertical, 16);
    root.add_css_class("home-screen");
    root.set_margin_start(32);
    root.set_margin_end(32);
    root.set_margin_top(24);
    root.set_margin_bottom(24);

    let title = gtk::Label::new(Some("Today's advertisements"));
    title.add_css_class("home-title");
    title.set_halign(gtk::Align::Start);

    let status = gtk::Label::new(Some("Not loaded"));
    status.add_css_class("home-status");
    status.set_halign(gtk::Align::Start);
    status.set_wrap(true);

    let list = gtk::ListBox::new();
    list.set_selection_mode(gtk::SelectionMode::None);
    list.add_css_class("boxed-list");

    let scroller = gtk::ScrolledWindow::new();
    scroller.set_vexpand(true);
    scroller.set_child(Some(&list));

    let buttons = gtk::Box::new(gtk::Orientation::Horizontal, 12);
    buttons.set_halign(gtk::Align::End);

    let reload_button = gtk::Button::with_label("Reload");
    reload_button.connect_clicked(move |_| on_reload());

    let play_button = gtk::Button::with_label("Play");
    play_button.add_css_class("suggested-action");
    play_button.connect_clicked(move |_| on_play());

    buttons.append(&reload_button);
    buttons.append(&play_button);

    root.append(&title);
    root.append(&status);
    root.append(&scroller);
    root.append(&buttons);

    HomeWidgets {
        root,
        status,
        list,
        play_button,
    }
}

impl HomeWidgets {
    pub fn update(&self, snapshot: &ManifestSnapshot) {
        let status = if snapshot.loading {
            String::from("Loading…")
        } else if let Some(error) = &snapshot.error {
            error.clone()
        } else if let Some(manifest) = &snapshot.manifest {
            format!("{}: {} advertisements", manifest.date, manifest.items.len())
        } else {
            String::from("Not loaded")
        };
        self.status.set_label(&status);

        self.list.remove_all();
        if let Some(manifest) = &snapshot.manifest {
            for item in &manifest.items {
                let label = gtk::Label::new(Some(&describe(item)));
                label.set_halign(gtk::Align::Start);
                label.set_margin_top(8);
                label.set_margin_bottom(8);
                label.set_margin_start(12);
                self.list.append(&label);
            }
        }
    }

    pub fn set_running(&self, running: bool) {
        self.play_button.set_sensitive(!running);
        self.play_button
            .set_label(if running { "Playing…" } else { "Play" });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Asset;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(8.0), "0:08");
        assert_eq!(format_duration(75.4), "1:15");
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_describe_item() {
        let item = AdvertisementItem {
            advertisement_id: 7,
            kind: AdKind::Video,
            daily_display_count: None,
            assets: vec![Asset {
                path: "v.mp4".into(),
                order_index: Some(0),
                duration_seconds: Some(30.0),
            }],
        };
        assert_eq!(describe(&item), "#7  ·  Video  ·  1 asset  ·  0:30");
    }
}
