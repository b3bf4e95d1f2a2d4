//! Main application window: home view and overlay player in one stack.

use gtk4 as gtk;
use gtk4::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::app::{AppContext, AppMessage, WindowReply};
use crate::config::FRAME_WAIT_FALLBACK_MS;
use crate::overlay::PlatformError;
use crate::playback::{SurfaceCommand, SurfaceEvent};
use crate::state::{ExitMode, WindowOp};
use crate::ui::home::{self, HomeWidgets};
use crate::ui::player::{self, PlayerWidgets};

const HOME_PAGE: &str = "home";
const PLAYER_PAGE: &str = "player";

/// Main window containing the home view and the overlay player
pub struct MainWindow {
    pub window: adw::ApplicationWindow,
    ctx: Rc<AppContext>,
    stack: gtk::Stack,
    home: HomeWidgets,
    player: PlayerWidgets,
    /// Content visibility as last set by the overlay controller
    overlay_active: Cell<bool>,
}

impl MainWindow {
    pub fn new(app: &adw::Application, ctx: Rc<AppContext>) -> Rc<Self> {
        let window = adw::ApplicationWindow::builder()
            .application(app)
            .title("Ad Overlay")
            .default_width(1280)
            .default_height(800)
            .build();

        let home = {
            let reload_ctx = ctx.clone();
            let play_ctx = ctx.clone();
            home::create_home_screen(
                move || reload_ctx.reload_manifest(),
                move || play_ctx.start_overlay(),
            )
        };
        let player = player::create_player_screen(ctx.message_tx.clone());

        let stack = gtk::Stack::new();
        stack.set_transition_type(gtk::StackTransitionType::None);
        stack.add_named(&home.root, Some(HOME_PAGE));
        stack.add_named(&player.root, Some(PLAYER_PAGE));
        stack.set_visible_child_name(HOME_PAGE);

        window.set_content(Some(&stack));

        let main_window = Rc::new(Self {
            window,
            ctx,
            stack,
            home,
            player,
            overlay_active: Cell::new(false),
        });

        main_window.connect_handlers();
        main_window.load_css();

        main_window
    }

    fn load_css(&self) {
        let provider = gtk::CssProvider::new();
        provider.load_from_string(include_str!("../../resources/style.css"));

        match gtk::gdk::Display::default() {
            Some(display) => gtk::style_context_add_provider_for_display(
                &display,
                &provider,
                gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
            ),
            None => log::warn!("No display, skipping stylesheet"),
        }
    }

    fn connect_handlers(self: &Rc<Self>) {
        // Exit shortcut, handled before any child widget sees the key
        let keys = gtk::EventControllerKey::new();
        keys.set_propagation_phase(gtk::PropagationPhase::Capture);
        let tx = self.ctx.message_tx.clone();
        keys.connect_key_pressed(move |_, key, _, state| {
            let chord = gtk::gdk::ModifierType::CONTROL_MASK | gtk::gdk::ModifierType::SHIFT_MASK;
            if state.contains(chord) && key.to_lower() == gtk::gdk::Key::f {
                log::info!("Exit shortcut pressed");
                tx.send(AppMessage::ExitOverlay(ExitMode::ToApp));
                return glib::Propagation::Stop;
            }
            glib::Propagation::Proceed
        });
        self.window.add_controller(keys);

        let ctx = self.ctx.clone();
        self.window.connect_close_request(move |_| {
            ctx.shutdown();
            glib::Propagation::Proceed
        });
    }

    /// Handle app messages - main entry point for state updates
    pub fn handle_message(self: &Rc<Self>, msg: AppMessage) {
        match msg {
            AppMessage::Window { op, reply } => self.perform(op, reply),

            AppMessage::Manifest(snapshot) => {
                self.home.update(&snapshot);
                let commands = self
                    .ctx
                    .process_surface_event(SurfaceEvent::ManifestChanged(snapshot));
                self.apply_surface(&commands);
            }

            AppMessage::Surface(event) => {
                let commands = self.ctx.process_surface_event(event);
                self.apply_surface(&commands);
            }

            AppMessage::OverlayHidden => {
                let commands = self.ctx.on_overlay_hidden();
                self.apply_surface(&commands);
            }

            AppMessage::ExitOverlay(mode) => {
                if self.ctx.overlay_running() {
                    self.ctx.exit_overlay(mode);
                } else {
                    self.show_home();
                }
            }
        }
    }

    fn apply_surface(&self, commands: &[SurfaceCommand]) {
        for cmd in commands {
            match cmd {
                SurfaceCommand::Render(view) => self.player.render(view),
                SurfaceCommand::StopVideo => self.player.stop_video(),
                _ => {}
            }
        }
    }

    fn show_home(&self) {
        self.stack.set_visible_child_name(HOME_PAGE);
        self.home.set_running(self.ctx.overlay_running());
    }

    /// Execute one window operation for the overlay controller
    fn perform(self: &Rc<Self>, op: WindowOp, reply: WindowReply) {
        let window = &self.window;

        let result = match op {
            WindowOp::ApplyMask => {
                self.stack.set_opacity(0.0);
                window.set_cursor_from_name(Some("none"));
                Ok(())
            }
            WindowOp::RemoveMask => {
                self.stack.set_opacity(1.0);
                // The cursor stays hidden while the overlay is on screen
                if !self.overlay_active.get() {
                    window.set_cursor(None::<&gtk::gdk::Cursor>);
                }
                Ok(())
            }
            WindowOp::SetAlwaysOnTop(_) => Err(PlatformError::Unsupported(op)),
            WindowOp::SaveForeground => {
                self.ctx.track_foreground(true, reply);
                return;
            }
            WindowOp::RestoreForeground => {
                self.ctx.track_foreground(false, reply);
                return;
            }
            WindowOp::SetDecorations(decorated) => {
                window.set_decorated(decorated);
                Ok(())
            }
            WindowOp::Show => {
                window.set_visible(true);
                Ok(())
            }
            WindowOp::Hide => {
                window.set_visible(false);
                Ok(())
            }
            WindowOp::Unminimize => {
                window.unminimize();
                Ok(())
            }
            WindowOp::Maximize => {
                window.maximize();
                Ok(())
            }
            WindowOp::Unmaximize => {
                window.unmaximize();
                Ok(())
            }
            WindowOp::SetFullscreen(true) => {
                window.fullscreen();
                Ok(())
            }
            WindowOp::SetFullscreen(false) => {
                window.unfullscreen();
                Ok(())
            }
            WindowOp::Focus => {
                window.present();
                Ok(())
            }
            WindowOp::SetContentVisible(visible) => {
                self.overlay_active.set(visible);
                if visible {
                    self.stack.set_visible_child_name(PLAYER_PAGE);
                    self.home.set_running(true);
                }
                let commands = self
                    .ctx
                    .process_surface_event(SurfaceEvent::VisibilityChanged(visible));
                self.apply_surface(&commands);
                Ok(())
            }
            WindowOp::WaitFrame => {
                self.wait_frame(reply);
                return;
            }
            WindowOp::ReturnToApp => {
                self.show_home();
                Ok(())
            }
        };

        let _ = reply.send(result);
    }

    /// Reply after the next frame, or after a fallback delay when the
    /// window is not being drawn.
    fn wait_frame(&self, reply: WindowReply) {
        let reply = Rc::new(RefCell::new(Some(reply)));

        let on_tick = reply.clone();
        self.window.add_tick_callback(move |_, _| {
            if let Some(reply) = on_tick.borrow_mut().take() {
                let _ = reply.send(Ok(()));
            }
            glib::ControlFlow::Break
        });

        glib::timeout_add_local_once(Duration::from_millis(FRAME_WAIT_FALLBACK_MS), move || {
            if let Some(reply) = reply.borrow_mut().take() {
                let _ = reply.send(Ok(()));
            }
        });
    }
}
