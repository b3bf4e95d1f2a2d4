//! Application context - bridges the GTK-free state machines with the GTK UI.
//!
//! The overlay controller and manifest loads run on the tokio runtime. They
//! reach GTK only through [`MessageSender`]; window operations carry a
//! oneshot reply so the controller can await every step in order.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};

use crate::config::AppConfig;
use crate::manifest::{ManifestProvider, ManifestSnapshot};
use crate::overlay::{CycleSettings, ForegroundTracker, OverlayController, OverlayHost, PlatformError};
use crate::playback::{AdRotation, PlaybackSurface, SurfaceCommand, SurfaceEvent};
use crate::state::{ExitMode, WindowOp};

/// Messages sent from async tasks to the GTK main loop
#[derive(Debug)]
pub enum AppMessage {
    /// Run a window operation and reply once it took effect
    Window {
        op: WindowOp,
        reply: WindowReply,
    },
    /// The manifest provider published a new snapshot
    Manifest(ManifestSnapshot),
    /// Feed an event to the playback surface
    Surface(SurfaceEvent),
    /// The overlay finished a hide phase
    OverlayHidden,
    /// Leave overlay mode (exit shortcut)
    ExitOverlay(ExitMode),
}

/// Sender that can dispatch messages to the GTK main loop from any thread
#[derive(Clone)]
pub struct MessageSender {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl MessageSender {
    pub fn send(&self, msg: AppMessage) {
        let _ = self.tx.send(msg);
    }
}

/// Reply channel for one window operation
pub type WindowReply = oneshot::Sender<Result<(), PlatformError>>;

/// [`OverlayHost`] that forwards window operations to the GTK main loop
pub struct GtkOverlayHost {
    tx: MessageSender,
}

#[async_trait]
impl OverlayHost for GtkOverlayHost {
    async fn perform(&self, op: WindowOp) -> Result<(), PlatformError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(AppMessage::Window { op, reply });
        rx.await.map_err(|_| PlatformError::Disconnected)?
    }
}

/// Application context - holds state and provides methods to interact with it
pub struct AppContext {
    /// GTK-free playback state
    pub surface: RefCell<PlaybackSurface>,
    pub rotation: RefCell<AdRotation>,
    pub provider: Arc<ManifestProvider>,
    pub config: AppConfig,
    /// Live cycle settings read by the running controller
    pub settings: watch::Sender<CycleSettings>,
    foreground: Arc<dyn ForegroundTracker>,
    controller: RefCell<Option<Arc<OverlayController>>>,
    /// Tokio runtime for async operations
    pub runtime: Arc<tokio::runtime::Runtime>,
    /// Sender for dispatching messages to GTK main loop
    pub message_tx: MessageSender,
}

impl AppContext {
    pub fn new(
        runtime: Arc<tokio::runtime::Runtime>,
        config: AppConfig,
        provider: Arc<ManifestProvider>,
        rotation: AdRotation,
        foreground: Arc<dyn ForegroundTracker>,
    ) -> (Rc<Self>, mpsc::UnboundedReceiver<AppMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut surface = PlaybackSurface::new();
        surface.process(SurfaceEvent::AdvertisementSelected(rotation.index()));

        let ctx = Rc::new(Self {
            surface: RefCell::new(surface),
            rotation: RefCell::new(rotation),
            provider,
            settings: watch::Sender::new(CycleSettings::from_config(&config)),
            config,
            foreground,
            controller: RefCell::new(None),
            runtime,
            message_tx: MessageSender { tx },
        });

        ctx.watch_manifest();
        (ctx, rx)
    }

    /// Forward every provider snapshot to the GTK main loop
    fn watch_manifest(&self) {
        let mut rx = self.provider.subscribe();
        let tx = self.message_tx.clone();

        self.runtime.spawn(async move {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                tx.send(AppMessage::Manifest(snapshot));
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });
    }

    /// Load the manifest (cached after the first success)
    pub fn load_manifest(&self) {
        let provider = self.provider.clone();
        self.runtime.spawn(async move {
            // Failures are published on the snapshot
            let _ = provider.load().await;
        });
    }

    pub fn reload_manifest(&self) {
        let provider = self.provider.clone();
        self.runtime.spawn(async move {
            let _ = provider.reload().await;
        });
    }

    pub fn overlay_running(&self) -> bool {
        self.controller
            .borrow()
            .as_ref()
            .is_some_and(|c| !c.is_cancelled())
    }

    /// Mount a fresh overlay controller and start cycling
    pub fn start_overlay(&self) {
        if self.overlay_running() {
            log::debug!("Overlay already running");
            return;
        }

        self.load_manifest();

        let host = Arc::new(GtkOverlayHost {
            tx: self.message_tx.clone(),
        });
        let tx = self.message_tx.clone();
        let controller = Arc::new(OverlayController::new(
            host,
            self.settings.subscribe(),
            move || tx.send(AppMessage::OverlayHidden),
        ));

        let runner = controller.clone();
        self.runtime.spawn(async move { runner.run().await });
        *self.controller.borrow_mut() = Some(controller);
    }

    /// Leave overlay mode. No-op when no controller is mounted.
    pub fn exit_overlay(&self, mode: ExitMode) {
        let Some(controller) = self.controller.borrow_mut().take() else {
            log::debug!("Exit requested without a running overlay");
            return;
        };
        self.runtime.spawn(async move { controller.exit(mode).await });
    }

    /// Unmount without running the exit sequence (application shutdown)
    pub fn shutdown(&self) {
        if let Some(controller) = self.controller.borrow_mut().take() {
            controller.cancel();
        }
    }

    /// Save or restore the foreground window on the blocking pool, since the
    /// tracker shells out. Replies once done.
    pub fn track_foreground(&self, save: bool, reply: WindowReply) {
        let foreground = self.foreground.clone();
        self.runtime.spawn_blocking(move || {
            let result = if save {
                foreground.save()
            } else {
                foreground.restore()
            };
            let _ = reply.send(result);
        });
    }

    /// Rotate to the next advertisement after a hide phase
    pub fn on_overlay_hidden(&self) -> Vec<SurfaceCommand> {
        let index = self.rotation.borrow_mut().advance();
        log::info!("Next advertisement index {}", index);
        self.process_surface_event(SurfaceEvent::AdvertisementSelected(index))
    }

    /// Process a surface event and execute the non-UI commands.
    /// Render and video commands are returned for the window to apply.
    pub fn process_surface_event(&self, event: SurfaceEvent) -> Vec<SurfaceCommand> {
        let commands = self.surface.borrow_mut().process(event);

        for cmd in &commands {
            self.execute_command(cmd);
        }

        commands
    }

    fn execute_command(&self, cmd: &SurfaceCommand) {
        match cmd {
            SurfaceCommand::ScheduleAdvance { generation, delay } => {
                let tx = self.message_tx.clone();
                let generation = *generation;
                glib::timeout_add_once(*delay, move || {
                    tx.send(AppMessage::Surface(SurfaceEvent::ImageTimerElapsed {
                        generation,
                    }));
                });
            }

            SurfaceCommand::ReportCounts {
                advertisements,
                cycle_seconds,
            } => {
                self.rotation.borrow_mut().set_count(*advertisements);
                let configured = self.config.show_seconds;
                self.settings
                    .send_modify(|s| s.track_content(*cycle_seconds, configured));
            }

            SurfaceCommand::AdvertisementExhausted { advertisement_id } => {
                log::debug!(
                    "Advertisement {} finished, waiting for the next cycle",
                    advertisement_id
                );
            }

            SurfaceCommand::Render(_) | SurfaceCommand::StopVideo => {
                // Applied by the window
            }
        }
    }
}
