//! Display state owned by the event loop.
//!
//! Only the `App` task holds a `DisplayState`; every mutation and every read
//! made for rendering happens on that task, so no lock is involved.

use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

/// Filter/verbosity setting. Codes 0-3 follow declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayMode {
    #[default]
    HighImportanceOnly,
    All,
    WithRates,
    WithImportant,
}

impl DisplayMode {
    pub const ALL: [DisplayMode; 4] = [
        DisplayMode::HighImportanceOnly,
        DisplayMode::All,
        DisplayMode::WithRates,
        DisplayMode::WithImportant,
    ];

    /// Modes reachable with the restricted cycle.
    pub const RESTRICTED: usize = 3;

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::ALL.len()]
    }

    pub fn next_restricted(self) -> Self {
        Self::ALL[(self as usize + 1) % Self::RESTRICTED]
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::HighImportanceOnly => "High importance only",
            DisplayMode::All => "All data",
            DisplayMode::WithRates => "High importance + rates",
            DisplayMode::WithImportant => "High importance + key events",
        }
    }

    /// Whether calendar events are limited to high importance.
    pub fn high_events_only(self) -> bool {
        self != DisplayMode::All
    }

    pub fn shows_important(self) -> bool {
        matches!(self, DisplayMode::All | DisplayMode::WithImportant)
    }

    pub fn shows_rates(self) -> bool {
        matches!(self, DisplayMode::All | DisplayMode::WithRates)
    }
}

/// Time left until the next refresh, as shown in the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining(Duration),
    /// The deadline has passed; a refresh is about to run.
    Imminent,
}

impl Countdown {
    pub fn label(self) -> String {
        match self {
            Countdown::Remaining(left) => format!("{:02}s", left.as_secs()),
            Countdown::Imminent => "imminent".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DisplayState {
    pub mode: DisplayMode,
    pub paused: bool,
    pub show_help: bool,
    pub next_refresh_at: Instant,
    pub started_at: DateTime<Local>,
    refresh_interval: Duration,
}

impl DisplayState {
    /// Fresh state; the first refresh is due immediately.
    pub fn new(mode: DisplayMode, refresh_interval: Duration, now: Instant) -> Self {
        Self {
            mode,
            paused: false,
            show_help: false,
            next_refresh_at: now,
            started_at: Local::now(),
            refresh_interval,
        }
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn advance_mode(&mut self) {
        self.mode = self.mode.next();
    }

    pub fn advance_mode_restricted(&mut self) {
        self.mode = self.mode.next_restricted();
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    /// Make the next refresh due right away. This is the only operation that
    /// moves the deadline backwards.
    pub fn force_refresh(&mut self, now: Instant) {
        self.next_refresh_at = now;
    }

    /// Reschedule after a finished cycle.
    pub fn schedule_next(&mut self, now: Instant) {
        self.next_refresh_at = self.next_refresh_at.max(now + self.refresh_interval);
    }

    pub fn is_refresh_due(&self, now: Instant) -> bool {
        now >= self.next_refresh_at
    }

    pub fn countdown(&self, now: Instant) -> Countdown {
        match self.next_refresh_at.checked_duration_since(now) {
            Some(left) if !left.is_zero() => Countdown::Remaining(left),
            _ => Countdown::Imminent,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    pub fn status_label(&self) -> &'static str {
        if self.paused {
            "Paused"
        } else {
            "Running"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn state() -> (DisplayState, Instant) {
        let now = Instant::now();
        (
            DisplayState::new(DisplayMode::HighImportanceOnly, Duration::from_secs(15), now),
            now,
        )
    }

    #[test]
    fn mode_codes_round_trip() {
        for mode in DisplayMode::ALL {
            assert_eq!(DisplayMode::from_code(mode.code()), Some(mode));
        }
        assert_eq!(DisplayMode::from_code(4), None);
    }

    #[test]
    fn full_cycle_visits_every_mode_once() {
        let (mut state, _) = state();
        let start = state.mode;
        let mut seen = HashSet::new();
        for _ in 0..DisplayMode::ALL.len() {
            assert!(seen.insert(state.mode));
            state.advance_mode();
        }
        assert_eq!(state.mode, start);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn restricted_cycle_skips_key_events_mode() {
        let (mut state, _) = state();
        let mut seen = Vec::new();
        for _ in 0..DisplayMode::RESTRICTED {
            seen.push(state.mode);
            state.advance_mode_restricted();
        }
        assert_eq!(state.mode, DisplayMode::HighImportanceOnly);
        assert_eq!(
            seen,
            vec![DisplayMode::HighImportanceOnly, DisplayMode::All, DisplayMode::WithRates]
        );

        state.mode = DisplayMode::WithImportant;
        state.advance_mode_restricted();
        assert_eq!(state.mode, DisplayMode::All);
    }

    #[test]
    fn section_visibility_per_mode() {
        assert!(DisplayMode::HighImportanceOnly.high_events_only());
        assert!(!DisplayMode::All.high_events_only());
        assert!(DisplayMode::All.shows_rates() && DisplayMode::All.shows_important());
        assert!(DisplayMode::WithRates.shows_rates() && !DisplayMode::WithRates.shows_important());
        assert!(DisplayMode::WithImportant.shows_important() && !DisplayMode::WithImportant.shows_rates());
        assert!(!DisplayMode::HighImportanceOnly.shows_rates());
    }

    #[test]
    fn toggles_flip() {
        let (mut state, _) = state();
        state.toggle_pause();
        assert!(state.paused);
        state.toggle_pause();
        assert!(!state.paused);

        state.toggle_help();
        assert!(state.show_help);
        state.close_help();
        assert!(!state.show_help);
    }

    #[test]
    fn schedule_and_force_refresh() {
        let (mut state, now) = state();
        assert!(state.is_refresh_due(now));

        state.schedule_next(now);
        assert_eq!(state.next_refresh_at, now + Duration::from_secs(15));
        assert!(!state.is_refresh_due(now + Duration::from_secs(14)));
        assert!(state.is_refresh_due(now + Duration::from_secs(15)));

        let later = now + Duration::from_secs(3);
        state.force_refresh(later);
        assert_eq!(state.next_refresh_at, later);
        assert!(state.is_refresh_due(later));
    }

    #[test]
    fn schedule_never_moves_deadline_back() {
        let (mut state, now) = state();
        state.schedule_next(now + Duration::from_secs(100));
        let deadline = state.next_refresh_at;
        state.schedule_next(now);
        assert_eq!(state.next_refresh_at, deadline);
    }

    #[test]
    fn countdown_labels() {
        let (mut state, now) = state();
        state.schedule_next(now);
        assert_eq!(state.countdown(now).label(), "15s");
        assert_eq!(state.countdown(now + Duration::from_secs(10)).label(), "05s");
        assert_eq!(state.countdown(now + Duration::from_secs(15)), Countdown::Imminent);
        assert_eq!(state.countdown(now + Duration::from_secs(60)).label(), "imminent");
    }

    proptest! {
        #[test]
        fn countdown_is_never_negative(offset_ms in 0u64..120_000) {
            let (mut state, now) = state();
            state.schedule_next(now);
            let at = now + Duration::from_millis(offset_ms);
            match state.countdown(at) {
                Countdown::Remaining(left) => {
                    prop_assert!(at < state.next_refresh_at);
                    prop_assert!(left <= Duration::from_secs(15));
                }
                Countdown::Imminent => prop_assert!(at >= state.next_refresh_at),
            }
        }

        #[test]
        fn n_advances_return_to_start(code in 0u8..4) {
            let start = DisplayMode::from_code(code).unwrap();
            let mut mode = start;
            let mut seen = HashSet::new();
            for _ in 0..DisplayMode::ALL.len() {
                prop_assert!(seen.insert(mode));
                mode = mode.next();
            }
            prop_assert_eq!(mode, start);
        }
    }
}
