use crate::error::ExtractError;

/// Importance tier of a calendar entry, classified from the page's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importance {
    High,
    Medium,
    Low,
}

impl Importance {
    /// Classify a raw importance label ("高", "中", "high", ...).
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "高" | "high" => Importance::High,
            "中" | "medium" | "med" => Importance::Medium,
            _ => Importance::Low,
        }
    }
}

/// Directional market impact of a released figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    Bullish,
    Bearish,
    Neutral,
}

impl Impact {
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label.contains("利多") || label.contains("bullish") {
            Impact::Bullish
        } else if label.contains("利空") || label.contains("bearish") {
            Impact::Bearish
        } else {
            Impact::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub time: String,
    pub region: String,
    pub indicator: String,
    pub previous: String,
    pub forecast: String,
    pub actual: String,
    pub importance: String, // raw label, e.g. "高"
    pub impact: String,     // raw label, e.g. "利多"
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportantEvent {
    pub time: String,
    pub region: String,
    pub location: String,
    pub importance: String,
    pub event: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRecord {
    pub bank: String,
    pub rate_name: String,
    pub current_rate: String,
    pub previous_rate: String,
    pub last_change: String, // "<amount> <date>" as published
    pub change_amount: String,
    pub change_date: String,
    pub history_high: String,
    pub history_low: String,
    pub next_forecast: String,
    pub latest_cpi: Option<String>,
}

/// Everything one refresh cycle extracts from the page.
///
/// A snapshot is replaced wholesale on every successful cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub events: Vec<CalendarEvent>,
    pub important: Vec<ImportantEvent>,
    pub rates: Vec<RateRecord>,
    /// Secondary tables left out because their header no longer matched.
    pub skipped: Vec<ExtractError>,
}

impl CalendarEvent {
    pub fn importance_tier(&self) -> Importance {
        Importance::from_label(&self.importance)
    }

    pub fn is_high(&self) -> bool {
        self.importance_tier() == Importance::High
    }

    pub fn direction(&self) -> Impact {
        Impact::from_label(&self.impact)
    }
}

impl ImportantEvent {
    pub fn importance_tier(&self) -> Importance {
        Importance::from_label(&self.importance)
    }

    pub fn is_high(&self) -> bool {
        self.importance_tier() == Importance::High
    }
}

impl RateRecord {
    /// Split a last-change field into `(amount, date)` on the first whitespace.
    ///
    /// Fields with fewer than two tokens yield two empty strings.
    pub fn split_last_change(raw: &str) -> (String, String) {
        match raw.trim().split_once(char::is_whitespace) {
            Some((amount, date)) if !amount.is_empty() && !date.trim().is_empty() => {
                (amount.to_string(), date.trim().to_string())
            }
            _ => (String::new(), String::new()),
        }
    }

    /// "Bank - Rate name" label used in the rates table.
    pub fn label(&self) -> String {
        format!("{} - {}", self.bank, self.rate_name)
    }

    /// Historical range formatted as "low - high".
    pub fn history_range(&self) -> String {
        format!("{} - {}", self.history_low, self.history_high)
    }
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.important.is_empty() && self.rates.is_empty()
    }
}
