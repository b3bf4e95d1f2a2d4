//! GTK-free playback surface state.
//!
//! Turns visibility changes, manifest updates and media signals into render
//! and timer commands. The GTK player widget executes those commands and
//! feeds media results back as events tagged with the generation they were
//! issued for, so late timers and signals from a replaced asset are ignored.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{MAX_ASSET_SECONDS, MIN_ASSET_SECONDS};
use crate::manifest::{AdKind, AssetResolver, Manifest, ManifestSnapshot};
use crate::playback::cursor::PlaybackCursor;

/// Timer delay for an asset, between one second and one day.
pub fn advance_delay(duration_seconds: f64) -> Duration {
    let secs = if duration_seconds.is_finite() {
        duration_seconds.clamp(MIN_ASSET_SECONDS, MAX_ASSET_SECONDS)
    } else {
        MIN_ASSET_SECONDS
    };
    Duration::from_secs_f64(secs)
}

/// What the player widget should display
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceView {
    /// Overlay hidden, nothing rendered
    Hidden,
    Loading,
    Empty,
    Error(String),
    Image { url: String, generation: u64 },
    Video { url: String, generation: u64 },
}

#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    ManifestChanged(ManifestSnapshot),
    AdvertisementSelected(usize),
    VisibilityChanged(bool),
    ImageTimerElapsed { generation: u64 },
    MediaEnded { generation: u64 },
    MediaFailed { generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Render(SurfaceView),
    /// Emit `ImageTimerElapsed { generation }` after `delay`
    ScheduleAdvance { generation: u64, delay: Duration },
    /// Pause the video and detach its source
    StopVideo,
    ReportCounts {
        advertisements: usize,
        cycle_seconds: f64,
    },
    AdvertisementExhausted { advertisement_id: i64 },
}

#[derive(Debug, Default)]
pub struct PlaybackSurface {
    cursor: PlaybackCursor,
    resolver: AssetResolver,
    manifest: Option<Arc<Manifest>>,
    error: Option<String>,
    visible: bool,
    generation: u64,
    exhausted: bool,
}

impl PlaybackSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> &PlaybackCursor {
        &self.cursor
    }

    pub fn process(&mut self, event: SurfaceEvent) -> Vec<SurfaceCommand> {
        let mut commands = Vec::new();

        match event {
            SurfaceEvent::ManifestChanged(snapshot) => {
                let error_changed = self.error != snapshot.error;
                self.error = snapshot.error.clone();

                let changed = match (&self.manifest, &snapshot.manifest) {
                    (Some(old), Some(new)) => !Arc::ptr_eq(old, new),
                    (None, None) => false,
                    _ => true,
                };

                if changed {
                    match &snapshot.manifest {
                        Some(manifest) => self.cursor.set_manifest(manifest),
                        None => self.cursor.clear(),
                    }
                    self.manifest = snapshot.manifest.clone();
                    self.resolver = AssetResolver::new(
                        snapshot.root_dir.clone(),
                        snapshot.manifest_subdir.clone().unwrap_or_default(),
                    );
                    self.exhausted = false;
                }

                commands.push(self.counts());
                if self.visible && (changed || error_changed) {
                    self.show_current(&mut commands);
                }
            }

            SurfaceEvent::AdvertisementSelected(index) => {
                self.cursor.select_advertisement(index);
                self.exhausted = false;
                commands.push(self.counts());
                if self.visible {
                    self.show_current(&mut commands);
                }
            }

            SurfaceEvent::VisibilityChanged(true) => {
                self.visible = true;
                self.exhausted = false;
                self.cursor.reset_to_start();
                self.show_current(&mut commands);
            }

            SurfaceEvent::VisibilityChanged(false) => {
                self.visible = false;
                self.generation += 1;
                commands.push(SurfaceCommand::StopVideo);
                commands.push(SurfaceCommand::Render(SurfaceView::Hidden));
            }

            SurfaceEvent::ImageTimerElapsed { generation }
            | SurfaceEvent::MediaEnded { generation } => {
                if self.is_current(generation) {
                    self.advance(&mut commands);
                }
            }

            SurfaceEvent::MediaFailed { generation } => {
                if self.is_current(generation) {
                    if let Some(entry) = self.cursor.current_asset() {
                        log::warn!("Skipping unplayable asset {}", entry.asset_path);
                    }
                    self.advance(&mut commands);
                }
            }
        }

        commands
    }

    fn is_current(&self, generation: u64) -> bool {
        self.visible && generation == self.generation
    }

    fn counts(&self) -> SurfaceCommand {
        SurfaceCommand::ReportCounts {
            advertisements: self.cursor.ad_count(),
            cycle_seconds: self
                .cursor
                .current_advertisement()
                .map(|ad| ad.cycle_seconds)
                .unwrap_or(0.0),
        }
    }

    fn advance(&mut self, commands: &mut Vec<SurfaceCommand>) {
        if self.cursor.advance_asset() {
            self.show_current(commands);
        } else if !self.exhausted {
            self.exhausted = true;
            if let Some(ad) = self.cursor.current_advertisement() {
                log::info!("Advertisement {} exhausted", ad.advertisement_id);
                commands.push(SurfaceCommand::AdvertisementExhausted {
                    advertisement_id: ad.advertisement_id,
                });
            }
        }
    }

    fn show_current(&mut self, commands: &mut Vec<SurfaceCommand>) {
        self.generation += 1;
        let generation = self.generation;

        if let Some(error) = &self.error {
            commands.push(SurfaceCommand::StopVideo);
            commands.push(SurfaceCommand::Render(SurfaceView::Error(error.clone())));
            return;
        }

        if self.manifest.is_none() {
            commands.push(SurfaceCommand::Render(SurfaceView::Loading));
            return;
        }

        let Some(entry) = self.cursor.current_asset() else {
            commands.push(SurfaceCommand::StopVideo);
            commands.push(SurfaceCommand::Render(SurfaceView::Empty));
            return;
        };

        let url = self.resolver.resolve(&entry.asset_path);
        if url.is_empty() {
            commands.push(SurfaceCommand::Render(SurfaceView::Loading));
            return;
        }

        match entry.kind {
            AdKind::Image => {
                let delay = advance_delay(entry.duration_seconds);
                commands.push(SurfaceCommand::StopVideo);
                commands.push(SurfaceCommand::Render(SurfaceView::Image { url, generation }));
                commands.push(SurfaceCommand::ScheduleAdvance { generation, delay });
            }
            AdKind::Video => {
                commands.push(SurfaceCommand::Render(SurfaceView::Video { url, generation }));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::manifest::{AdvertisementItem, Asset};

    fn snapshot(items: Vec<AdvertisementItem>) -> ManifestSnapshot {
        ManifestSnapshot {
            manifest: Some(Arc::new(Manifest {
                date: "2026-02-22".into(),
                items,
            })),
            root_dir: Some(PathBuf::from("/ads")),
            manifest_subdir: Some(String::new()),
            loading: false,
            error: None,
        }
    }

    fn image_ad(id: i64, assets: &[(&str, Option<f64>, Option<i64>)]) -> AdvertisementItem {
        AdvertisementItem {
            advertisement_id: id,
            kind: AdKind::Image,
            daily_display_count: None,
            assets: assets
                .iter()
                .map(|(path, duration, order)| Asset {
                    path: path.to_string(),
                    order_index: *order,
                    duration_seconds: *duration,
                })
                .collect(),
        }
    }

    fn rendered(commands: &[SurfaceCommand]) -> Option<&SurfaceView> {
        commands.iter().find_map(|c| match c {
            SurfaceCommand::Render(view) => Some(view),
            _ => None,
        })
    }

    fn scheduled(commands: &[SurfaceCommand]) -> Option<(u64, Duration)> {
        commands.iter().find_map(|c| match c {
            SurfaceCommand::ScheduleAdvance { generation, delay } => Some((*generation, *delay)),
            _ => None,
        })
    }

    #[test]
    fn test_advance_delay_minimum() {
        assert_eq!(advance_delay(0.0), Duration::from_secs(1));
        assert_eq!(advance_delay(-2.0), Duration::from_secs(1));
        assert_eq!(advance_delay(f64::NAN), Duration::from_secs(1));
        assert_eq!(advance_delay(0.4), Duration::from_secs(1));
        assert_eq!(advance_delay(7.5), Duration::from_millis(7500));
    }

    #[test]
    fn test_advance_delay_huge_value() {
        let asset: Asset =
            serde_json::from_str(r#"{"path":"a.jpg","orderIndex":0,"durationSeconds":1e20}"#).unwrap();
        let delay = advance_delay(asset.effective_duration());
        assert_eq!(delay, Duration::from_secs_f64(MAX_ASSET_SECONDS));
        assert!(delay.as_millis() <= u32::MAX as u128);
        assert_eq!(advance_delay(f64::MAX), Duration::from_secs_f64(MAX_ASSET_SECONDS));
    }

    #[test]
    fn test_zero_duration_schedules_at_least_one_second() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("zero.jpg", Some(0.0), None), ("missing.jpg", None, None)],
        )])));

        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (generation, delay) = scheduled(&cmds).unwrap();
        assert!(delay >= Duration::from_millis(1000));

        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        let (_, delay) = scheduled(&cmds).unwrap();
        assert!(delay >= Duration::from_millis(1000));
    }

    #[test]
    fn test_two_image_advertisement_plays_in_order_then_exhausts() {
        let mut surface = PlaybackSurface::new();
        let cmds = surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("b.jpg", Some(3.0), Some(1)), ("a.jpg", Some(5.0), Some(0))],
        )])));
        assert!(cmds.contains(&SurfaceCommand::ReportCounts {
            advertisements: 1,
            cycle_seconds: 8.0
        }));

        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (generation, delay) = scheduled(&cmds).unwrap();
        assert_eq!(delay, Duration::from_secs(5));
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Image { url, .. }) if url.ends_with("/ads/a.jpg")
        ));

        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        let (generation, delay) = scheduled(&cmds).unwrap();
        assert_eq!(delay, Duration::from_secs(3));
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Image { url, .. }) if url.ends_with("/ads/b.jpg")
        ));

        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        assert_eq!(
            cmds,
            vec![SurfaceCommand::AdvertisementExhausted { advertisement_id: 1 }]
        );

        // exhaustion is signalled once
        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        assert!(cmds.is_empty());
    }

    #[test]
    fn test_reload_while_visible_restarts_with_new_manifest() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("a.jpg", Some(5.0), Some(0)), ("b.jpg", Some(3.0), Some(1))],
        )])));
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (old_generation, _) = scheduled(&cmds).unwrap();

        let cmds = surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![
            image_ad(
                2,
                &[("y.jpg", Some(2.0), Some(1)), ("x.jpg", Some(4.0), Some(0))],
            ),
            image_ad(3, &[("z.jpg", Some(9.0), None)]),
        ])));
        assert!(cmds.contains(&SurfaceCommand::ReportCounts {
            advertisements: 2,
            cycle_seconds: 6.0
        }));
        let (new_generation, delay) = scheduled(&cmds).unwrap();
        assert_ne!(new_generation, old_generation);
        assert_eq!(delay, Duration::from_secs(4));
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Image { url, generation })
                if url.ends_with("/ads/x.jpg") && *generation == new_generation
        ));

        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed {
            generation: old_generation,
        });
        assert!(cmds.is_empty());
        assert_eq!(surface.cursor().asset_index(), 0);
        assert_eq!(surface.cursor().current_asset().unwrap().asset_path, "x.jpg");
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("a.jpg", Some(5.0), Some(0)), ("b.jpg", Some(3.0), Some(1))],
        )])));
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (generation, _) = scheduled(&cmds).unwrap();

        surface.process(SurfaceEvent::VisibilityChanged(false));
        let cmds = surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        assert!(cmds.is_empty());
        assert_eq!(surface.cursor().asset_index(), 0);
    }

    #[test]
    fn test_image_error_advances_immediately() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("broken.jpg", Some(30.0), Some(0)), ("ok.jpg", Some(3.0), Some(1))],
        )])));
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (generation, _) = scheduled(&cmds).unwrap();

        let cmds = surface.process(SurfaceEvent::MediaFailed { generation });
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Image { url, .. }) if url.ends_with("ok.jpg")
        ));
    }

    #[test]
    fn test_video_advances_on_end() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![AdvertisementItem {
            advertisement_id: 9,
            kind: AdKind::Video,
            daily_display_count: None,
            assets: vec![
                Asset {
                    path: "part1.mp4".into(),
                    order_index: Some(0),
                    duration_seconds: Some(12.0),
                },
                Asset {
                    path: "part2.mp4".into(),
                    order_index: Some(1),
                    duration_seconds: Some(8.0),
                },
            ],
        }])));

        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        assert!(scheduled(&cmds).is_none());
        let generation = match rendered(&cmds) {
            Some(SurfaceView::Video { generation, url }) => {
                assert!(url.ends_with("part1.mp4"));
                *generation
            }
            other => panic!("unexpected view {:?}", other),
        };

        let cmds = surface.process(SurfaceEvent::MediaEnded { generation });
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Video { url, .. }) if url.ends_with("part2.mp4")
        ));
    }

    #[test]
    fn test_hidden_stops_video() {
        let mut surface = PlaybackSurface::new();
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(false));
        assert_eq!(
            cmds,
            vec![
                SurfaceCommand::StopVideo,
                SurfaceCommand::Render(SurfaceView::Hidden)
            ]
        );
    }

    #[test]
    fn test_visible_again_restarts_at_first_asset() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![image_ad(
            1,
            &[("a.jpg", Some(5.0), Some(0)), ("b.jpg", Some(3.0), Some(1))],
        )])));
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        let (generation, _) = scheduled(&cmds).unwrap();
        surface.process(SurfaceEvent::ImageTimerElapsed { generation });
        assert_eq!(surface.cursor().asset_index(), 1);

        surface.process(SurfaceEvent::VisibilityChanged(false));
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        assert_eq!(surface.cursor().asset_index(), 0);
        assert!(matches!(
            rendered(&cmds),
            Some(SurfaceView::Image { url, .. }) if url.ends_with("a.jpg")
        ));
    }

    #[test]
    fn test_manifest_error_renders_message() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(ManifestSnapshot {
            error: Some("manifest.json not found inside the zip archive".into()),
            ..ManifestSnapshot::default()
        }));

        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        assert_eq!(
            rendered(&cmds),
            Some(&SurfaceView::Error(
                "manifest.json not found inside the zip archive".into()
            ))
        );
    }

    #[test]
    fn test_loading_before_manifest() {
        let mut surface = PlaybackSurface::new();
        let cmds = surface.process(SurfaceEvent::VisibilityChanged(true));
        assert_eq!(rendered(&cmds), Some(&SurfaceView::Loading));
    }

    #[test]
    fn test_selected_advertisement_reports_its_cycle() {
        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::ManifestChanged(snapshot(vec![
            image_ad(1, &[("a.jpg", Some(5.0), None)]),
            image_ad(2, &[("b.jpg", Some(4.0), None), ("c.jpg", Some(6.0), None)]),
        ])));

        let cmds = surface.process(SurfaceEvent::AdvertisementSelected(1));
        assert_eq!(
            cmds,
            vec![SurfaceCommand::ReportCounts {
                advertisements: 2,
                cycle_seconds: 10.0
            }]
        );
    }
}
