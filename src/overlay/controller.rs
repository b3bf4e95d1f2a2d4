//! Async runner for the overlay state machine.
//!
//! One controller per mount. The loop alternates show and hide phases with
//! abortable sleeps in between; `exit()` cancels the loop and runs the exit
//! sequence. Phases and exit share one async mutex, so sequences never
//! interleave.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use super::host::OverlayHost;
use super::settings::CycleSettings;
use crate::state::{ExitMode, OverlayCommand, OverlayEvent, OverlayStateMachine, WindowOp};

type HiddenCallback = Box<dyn Fn() + Send + Sync>;

pub struct OverlayController {
    host: Arc<dyn OverlayHost>,
    settings: watch::Receiver<CycleSettings>,
    machine: Mutex<OverlayStateMachine>,
    cancel: CancellationToken,
    on_hidden: HiddenCallback,
}

impl OverlayController {
    pub fn new(
        host: Arc<dyn OverlayHost>,
        settings: watch::Receiver<CycleSettings>,
        on_hidden: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            host,
            settings,
            machine: Mutex::new(OverlayStateMachine::new()),
            cancel: CancellationToken::new(),
            on_hidden: Box::new(on_hidden),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the loop without touching the window. A cancelled controller never resumes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Run show/hide cycles until cancelled.
    pub async fn run(&self) {
        log::info!("Overlay loop started");

        if self.apply(OverlayEvent::Mount).await {
            loop {
                if self.cancel.is_cancelled() {
                    break;
                }

                let settings = *self.settings.borrow();
                if !self
                    .apply(OverlayEvent::ShowDue {
                        fullscreen: settings.fullscreen,
                    })
                    .await
                {
                    break;
                }
                if !self.sleep(settings.show_duration()).await {
                    break;
                }

                if !self.apply(OverlayEvent::HideDue).await {
                    break;
                }
                let interval = self.settings.borrow().interval_duration();
                if !self.sleep(interval).await {
                    break;
                }
            }
        }

        log::info!("Overlay loop stopped");
    }

    /// Cancel the loop and leave overlay mode. Idempotent.
    pub async fn exit(&self, mode: ExitMode) {
        log::info!("Exiting overlay ({:?})", mode);
        self.cancel.cancel();
        self.apply(OverlayEvent::Exit(mode)).await;
    }

    /// Run one transition. Returns `false` once the controller is cancelled.
    async fn apply(&self, event: OverlayEvent) -> bool {
        let mut machine = self.machine.lock().await;

        let is_exit = matches!(event, OverlayEvent::Exit(_));
        if self.cancel.is_cancelled() && !is_exit {
            return false;
        }

        let commands = machine.process(event);
        for command in &commands {
            match command {
                OverlayCommand::Window(op) => self.attempt(*op).await,
                OverlayCommand::NotifyHidden => (self.on_hidden)(),
            }
        }
        machine.process(OverlayEvent::TransitionDone);

        !self.cancel.is_cancelled()
    }

    async fn attempt(&self, op: WindowOp) {
        if let Err(e) = self.host.perform(op).await {
            log::warn!("Window operation {:?} failed: {}", op, e);
        }
    }

    /// Sleep unless cancelled first. Returns `false` when cancelled.
    async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
