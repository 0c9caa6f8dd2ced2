//! Read-only view handed to renderers.
//!
//! Both backends draw from the same `DashboardView`, so mode filtering and
//! row contents are decided once, here.

use chrono::{DateTime, Local};
use tokio::time::Instant;

use crate::api::{CalendarEvent, ImportantEvent, RateRecord, Snapshot};
use crate::config::UiConfig;
use crate::state::{Countdown, DisplayState};

pub const EVENT_HEADERS: [&str; 6] = ["Time", "Imp.", "Previous", "Forecast", "Actual", "Indicator"];
pub const IMPORTANT_HEADERS: [&str; 3] = ["Time", "Imp.", "Event"];
pub const RATE_HEADERS: [&str; 7] = [
    "Bank / rate",
    "Current",
    "Previous",
    "Change",
    "Changed on",
    "Historical range",
    "Next fcst",
];

pub const EMPTY_EVENTS: &str = "No events to show";

pub struct DashboardView<'a> {
    pub state: &'a DisplayState,
    pub snapshot: &'a Snapshot,
    /// Error from the latest cycle; replaces the body when set.
    pub error: Option<&'a str>,
    pub last_update: Option<DateTime<Local>>,
    pub ui: &'a UiConfig,
    pub now: Instant,
}

impl<'a> DashboardView<'a> {
    /// Calendar events that pass the current mode's filter, in page order.
    pub fn visible_events(&self) -> Vec<&'a CalendarEvent> {
        let high_only = self.state.mode.high_events_only();
        self.snapshot
            .events
            .iter()
            .filter(|event| !high_only || event.is_high())
            .collect()
    }

    /// Highlighted events, or `None` when the mode hides the section or none
    /// pass its filter.
    pub fn visible_important(&self) -> Option<Vec<&'a ImportantEvent>> {
        let mode = self.state.mode;
        if !mode.shows_important() {
            return None;
        }
        let high_only = mode.high_events_only();
        let events: Vec<_> = self
            .snapshot
            .important
            .iter()
            .filter(|event| !high_only || event.is_high())
            .collect();
        (!events.is_empty()).then_some(events)
    }

    /// Rate records, or `None` when the mode hides the section.
    pub fn visible_rates(&self) -> Option<&'a [RateRecord]> {
        self.state
            .mode
            .shows_rates()
            .then_some(self.snapshot.rates.as_slice())
    }

    pub fn countdown(&self) -> Countdown {
        self.state.countdown(self.now)
    }

    pub fn started_label(&self) -> String {
        format!(
            "fxwatch started @ {}",
            self.state.started_at.format("%Y-%m-%d %H:%M:%S")
        )
    }

    pub fn status_text(&self) -> String {
        format!(
            "Mode: {} | Status: {} | Next refresh: {}",
            self.state.mode.label(),
            self.state.status_label(),
            self.countdown().label()
        )
    }

    pub fn last_update_label(&self) -> String {
        match self.last_update {
            Some(at) => format!("Updated {}", at.format("%H:%M:%S")),
            None => "Updated --".to_string(),
        }
    }
}

pub fn event_cells(event: &CalendarEvent) -> [String; 6] {
    let indicator = if event.region.is_empty() {
        event.indicator.clone()
    } else {
        format!("{} {}", event.region, event.indicator)
    };
    [
        event.time.clone(),
        event.importance.clone(),
        event.previous.clone(),
        event.forecast.clone(),
        event.actual.clone(),
        indicator,
    ]
}

pub fn important_cells(event: &ImportantEvent) -> [String; 3] {
    let text = if event.location.is_empty() {
        event.event.clone()
    } else {
        format!("{} ({})", event.event, event.location)
    };
    [event.time.clone(), event.importance.clone(), text]
}

pub fn rate_cells(rate: &RateRecord) -> [String; 7] {
    [
        rate.label(),
        rate.current_rate.clone(),
        rate.previous_rate.clone(),
        rate.change_amount.clone(),
        rate.change_date.clone(),
        rate.history_range(),
        rate.next_forecast.clone(),
    ]
}
