use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::api::Snapshot;
use crate::error::CycleError;

/// Unified event type for all app events (keyboard, timers, refresh cycles)
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input, already mapped to an action
    Key(KeyAction),

    /// Terminal was resized
    Resize,

    /// Once-per-second countdown tick
    Tick,

    /// A refresh cycle finished, successfully or not
    CycleFinished {
        cycle: u64,
        outcome: Result<Snapshot, CycleError>,
    },

    /// The keyboard reader stopped
    InputClosed(String),
}

/// Dashboard keyboard actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ForceRefresh,
    TogglePause,
    AdvanceMode,
    ToggleHelp,
    CloseHelp,
    None,
}

/// Map a key event to an action.
pub fn map_key(key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::ForceRefresh,
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Char(' ') => KeyAction::TogglePause,
        KeyCode::Char('m') | KeyCode::Char('M') => KeyAction::AdvanceMode,
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => KeyAction::ToggleHelp,
        KeyCode::Esc => KeyAction::CloseHelp,
        _ => KeyAction::None,
    }
}

/// Read the keyboard on a dedicated thread so the blocking read never stalls
/// the ticks. The thread ends when the receiver is dropped or input fails.
pub fn spawn_keyboard_reader(tx: UnboundedSender<AppEvent>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || loop {
            let forwarded = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    match map_key(key) {
                        KeyAction::None => Ok(()),
                        action => tx.send(AppEvent::Key(action)),
                    }
                }
                Ok(Event::Resize(_, _)) => tx.send(AppEvent::Resize),
                Ok(_) => Ok(()),
                Err(e) => {
                    error!(error = %e, "keyboard read failed");
                    tx.send(AppEvent::InputClosed(e.to_string())).ok();
                    return;
                }
            };
            if forwarded.is_err() {
                debug!("event loop gone, keyboard reader exiting");
                return;
            }
        })
}

/// Send a [`AppEvent::Tick`] every `period` until the receiver is dropped.
pub fn spawn_ticker(tx: UnboundedSender<AppEvent>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    })
}
