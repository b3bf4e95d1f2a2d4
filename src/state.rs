//! GTK-free overlay lifecycle state machine.
//!
//! This module contains the pure Rust state machine that decides which window
//! operations run on every phase change. It performs no I/O; the async
//! controller in `overlay` executes the returned commands in order and reports
//! back with [`OverlayEvent::TransitionDone`].

/// Overlay lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayPhase {
    /// Window hidden, waiting for the next cycle
    Hidden,
    /// Show sequence in progress
    TransitioningToVisible,
    /// Overlay on screen, content playing
    Visible,
    /// Hide sequence in progress
    TransitioningToHidden,
    /// Manual exit requested; terminal for this controller
    Exiting,
}

/// Where a manual exit returns the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitMode {
    /// Normal in-app view, window decorated and focused
    ToApp,
    /// Window hidden, previous foreground window refocused
    ToDesktop,
}

/// One platform or presentation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOp {
    /// Hide rendered content and the cursor around window-state changes
    ApplyMask,
    RemoveMask,
    SaveForeground,
    RestoreForeground,
    SetAlwaysOnTop(bool),
    SetDecorations(bool),
    Show,
    Hide,
    Unminimize,
    Maximize,
    Unmaximize,
    SetFullscreen(bool),
    Focus,
    /// The authoritative visibility signal consumed by the playback surface
    SetContentVisible(bool),
    /// Resolve after the next rendered frame
    WaitFrame,
    /// Switch the window back to the normal application view
    ReturnToApp,
}

/// Events that trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayEvent {
    /// Controller started; the overlay begins hidden
    Mount,
    /// Show-phase is due
    ShowDue { fullscreen: bool },
    /// Hide-phase is due
    HideDue,
    /// All commands of the current transition have been executed
    TransitionDone,
    /// Manual exit
    Exit(ExitMode),
}

/// Commands emitted by the state machine for the controller to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayCommand {
    Window(WindowOp),
    /// Tell upstream the overlay finished hiding
    NotifyHidden,
}

/// The overlay state machine
#[derive(Debug)]
pub struct OverlayStateMachine {
    pub phase: OverlayPhase,
}

impl Default for OverlayStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

fn ops(list: &[WindowOp]) -> Vec<OverlayCommand> {
    list.iter().copied().map(OverlayCommand::Window).collect()
}

impl OverlayStateMachine {
    pub fn new() -> Self {
        Self {
            phase: OverlayPhase::Hidden,
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.phase == OverlayPhase::Exiting
    }

    /// Process an event and return commands to execute
    pub fn process(&mut self, event: OverlayEvent) -> Vec<OverlayCommand> {
        use WindowOp::*;

        match (self.phase, event) {
            (OverlayPhase::Exiting, _) => Vec::new(),

            (_, OverlayEvent::Exit(mode)) => {
                self.phase = OverlayPhase::Exiting;
                let mut commands = ops(&[
                    ApplyMask,
                    SetContentVisible(false),
                    SetFullscreen(false),
                    SetAlwaysOnTop(false),
                    SetDecorations(true),
                    Unmaximize,
                    ReturnToApp,
                ]);
                commands.extend(match mode {
                    ExitMode::ToApp => ops(&[Show, Focus, WaitFrame, RemoveMask]),
                    ExitMode::ToDesktop => ops(&[Hide, RestoreForeground, RemoveMask]),
                });
                commands
            }

            (OverlayPhase::Hidden, OverlayEvent::Mount) => ops(&[SetContentVisible(false), Hide]),

            (OverlayPhase::Hidden, OverlayEvent::ShowDue { fullscreen }) => {
                self.phase = OverlayPhase::TransitioningToVisible;
                ops(&[
                    ApplyMask,
                    SaveForeground,
                    SetAlwaysOnTop(true),
                    SetDecorations(false),
                    Show,
                    Unminimize,
                    if fullscreen { SetFullscreen(true) } else { Maximize },
                    Focus,
                    SetContentVisible(true),
                    WaitFrame,
                    WaitFrame,
                    RemoveMask,
                ])
            }

            (OverlayPhase::TransitioningToVisible, OverlayEvent::TransitionDone) => {
                self.phase = OverlayPhase::Visible;
                Vec::new()
            }

            (OverlayPhase::Visible, OverlayEvent::HideDue) => {
                self.phase = OverlayPhase::TransitioningToHidden;
                let mut commands = ops(&[
                    ApplyMask,
                    SetContentVisible(false),
                    SetFullscreen(false),
                    Hide,
                    RestoreForeground,
                    RemoveMask,
                ]);
                commands.push(OverlayCommand::NotifyHidden);
                commands
            }

            (OverlayPhase::TransitioningToHidden, OverlayEvent::TransitionDone) => {
                self.phase = OverlayPhase::Hidden;
                Vec::new()
            }

            (phase, event) => {
                log::debug!("Ignoring {:?} in phase {:?}", event, phase);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window_ops(cmds: &[OverlayCommand]) -> Vec<WindowOp> {
        cmds.iter()
            .filter_map(|c| match c {
                OverlayCommand::Window(op) => Some(*op),
                OverlayCommand::NotifyHidden => None,
            })
            .collect()
    }

    fn position(ops: &[WindowOp], op: WindowOp) -> usize {
        ops.iter().position(|o| *o == op).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let sm = OverlayStateMachine::new();
        assert_eq!(sm.phase, OverlayPhase::Hidden);
        assert!(!sm.is_exiting());
    }

    #[test]
    fn test_mount_hides_window() {
        let mut sm = OverlayStateMachine::new();
        let cmds = sm.process(OverlayEvent::Mount);
        assert_eq!(
            window_ops(&cmds),
            vec![WindowOp::SetContentVisible(false), WindowOp::Hide]
        );
        assert_eq!(sm.phase, OverlayPhase::Hidden);
    }

    #[test]
    fn test_full_cycle() {
        let mut sm = OverlayStateMachine::new();

        let cmds = sm.process(OverlayEvent::ShowDue { fullscreen: true });
        assert_eq!(sm.phase, OverlayPhase::TransitioningToVisible);
        assert!(!cmds.is_empty());

        sm.process(OverlayEvent::TransitionDone);
        assert_eq!(sm.phase, OverlayPhase::Visible);

        let cmds = sm.process(OverlayEvent::HideDue);
        assert_eq!(sm.phase, OverlayPhase::TransitioningToHidden);
        assert_eq!(cmds.last(), Some(&OverlayCommand::NotifyHidden));

        sm.process(OverlayEvent::TransitionDone);
        assert_eq!(sm.phase, OverlayPhase::Hidden);
    }

    #[test]
    fn test_show_sequence_order() {
        let mut sm = OverlayStateMachine::new();
        let ops = window_ops(&sm.process(OverlayEvent::ShowDue { fullscreen: true }));

        assert_eq!(ops.first(), Some(&WindowOp::ApplyMask));
        assert_eq!(ops.last(), Some(&WindowOp::RemoveMask));
        assert!(position(&ops, WindowOp::SaveForeground) < position(&ops, WindowOp::Show));
        assert!(position(&ops, WindowOp::SetDecorations(false)) < position(&ops, WindowOp::Show));
        assert!(
            position(&ops, WindowOp::SetFullscreen(true))
                < position(&ops, WindowOp::SetContentVisible(true))
        );
        assert!(position(&ops, WindowOp::SetContentVisible(true)) < position(&ops, WindowOp::WaitFrame));
        assert_eq!(ops.iter().filter(|o| **o == WindowOp::WaitFrame).count(), 2);
    }

    #[test]
    fn test_maximize_when_fullscreen_disabled() {
        let mut sm = OverlayStateMachine::new();
        let ops = window_ops(&sm.process(OverlayEvent::ShowDue { fullscreen: false }));
        assert!(ops.contains(&WindowOp::Maximize));
        assert!(!ops.contains(&WindowOp::SetFullscreen(true)));
    }

    #[test]
    fn test_hide_sequence_masks_before_restoring() {
        let mut sm = OverlayStateMachine::new();
        sm.process(OverlayEvent::ShowDue { fullscreen: true });
        sm.process(OverlayEvent::TransitionDone);

        let ops = window_ops(&sm.process(OverlayEvent::HideDue));
        assert_eq!(
            ops,
            vec![
                WindowOp::ApplyMask,
                WindowOp::SetContentVisible(false),
                WindowOp::SetFullscreen(false),
                WindowOp::Hide,
                WindowOp::RestoreForeground,
                WindowOp::RemoveMask,
            ]
        );
    }

    #[test]
    fn test_phases_cannot_overlap() {
        let mut sm = OverlayStateMachine::new();
        sm.process(OverlayEvent::ShowDue { fullscreen: true });

        // Still transitioning: neither a second show nor a hide may start
        assert!(sm.process(OverlayEvent::ShowDue { fullscreen: true }).is_empty());
        assert!(sm.process(OverlayEvent::HideDue).is_empty());
        assert_eq!(sm.phase, OverlayPhase::TransitioningToVisible);
    }

    #[test]
    fn test_exit_to_app() {
        let mut sm = OverlayStateMachine::new();
        sm.process(OverlayEvent::ShowDue { fullscreen: true });
        sm.process(OverlayEvent::TransitionDone);

        let ops = window_ops(&sm.process(OverlayEvent::Exit(ExitMode::ToApp)));
        assert_eq!(sm.phase, OverlayPhase::Exiting);
        assert_eq!(ops.first(), Some(&WindowOp::ApplyMask));
        assert_eq!(ops.last(), Some(&WindowOp::RemoveMask));
        assert!(position(&ops, WindowOp::SetDecorations(true)) < position(&ops, WindowOp::Show));
        assert!(position(&ops, WindowOp::SetAlwaysOnTop(false)) < position(&ops, WindowOp::Show));
        assert!(position(&ops, WindowOp::Focus) < position(&ops, WindowOp::RemoveMask));
        assert!(!ops.contains(&WindowOp::Hide));
    }

    #[test]
    fn test_exit_to_desktop() {
        let mut sm = OverlayStateMachine::new();
        let ops = window_ops(&sm.process(OverlayEvent::Exit(ExitMode::ToDesktop)));
        assert!(position(&ops, WindowOp::Hide) < position(&ops, WindowOp::RestoreForeground));
        assert!(!ops.contains(&WindowOp::Show));
    }

    #[test]
    fn test_exit_is_terminal() {
        let mut sm = OverlayStateMachine::new();
        sm.process(OverlayEvent::Exit(ExitMode::ToApp));

        assert!(sm.process(OverlayEvent::Exit(ExitMode::ToApp)).is_empty());
        assert!(sm.process(OverlayEvent::ShowDue { fullscreen: true }).is_empty());
        assert!(sm.process(OverlayEvent::TransitionDone).is_empty());
        assert!(sm.is_exiting());
    }
}
