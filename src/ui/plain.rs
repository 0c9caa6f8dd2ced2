//! Plain ANSI backend.
//!
//! Redraws the whole screen on `render` and rewrites only the first line on
//! `render_status`, so the once-per-second countdown does not flicker the body.

use std::io::{self, Write};

use crossterm::cursor::{MoveTo, RestorePosition, SavePosition};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::queue;
use unicode_width::UnicodeWidthStr;

use super::columns::{calendar_widths, fit, join_cells, rate_widths, rule};
use super::help::KEY_HELP;
use super::view::{
    event_cells, important_cells, rate_cells, DashboardView, EMPTY_EVENTS, EVENT_HEADERS,
    IMPORTANT_HEADERS, RATE_HEADERS,
};
use super::Renderer;

const FALLBACK_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Heading,
    Rule,
    Event,
    Rate,
    Error,
    Muted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainLine {
    pub tone: Tone,
    pub text: String,
}

impl PlainLine {
    fn new(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            tone,
            text: text.into(),
        }
    }

    fn blank() -> Self {
        Self::new(Tone::Plain, "")
    }
}

pub struct PlainRenderer<W: Write> {
    out: W,
    /// Fixed width; `None` asks the terminal on every draw.
    width: Option<usize>,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, width: None }
    }

    pub fn with_width(out: W, width: usize) -> Self {
        Self {
            out,
            width: Some(width),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn width(&self) -> usize {
        self.width.unwrap_or_else(|| {
            terminal::size()
                .map(|(cols, _)| usize::from(cols))
                .unwrap_or(FALLBACK_WIDTH)
        })
    }

    fn write_line(&mut self, line: &PlainLine) -> io::Result<()> {
        if let Some(color) = tone_color(line.tone) {
            queue!(self.out, SetForegroundColor(color))?;
        }
        if line.tone == Tone::Heading {
            queue!(self.out, SetAttribute(Attribute::Bold))?;
        }
        queue!(
            self.out,
            Print(&line.text),
            SetAttribute(Attribute::Reset),
            ResetColor
        )
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn render(&mut self, view: &DashboardView<'_>) -> io::Result<()> {
        let lines = compose(view, self.width());
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        for line in &lines {
            self.write_line(line)?;
            queue!(self.out, Print("\r\n"))?;
        }
        self.out.flush()
    }

    fn render_status(&mut self, view: &DashboardView<'_>) -> io::Result<()> {
        let status = status_line(view, self.width());
        queue!(
            self.out,
            SavePosition,
            MoveTo(0, 0),
            Clear(ClearType::CurrentLine),
            Print(status),
            RestorePosition
        )?;
        self.out.flush()
    }
}

fn tone_color(tone: Tone) -> Option<Color> {
    match tone {
        Tone::Plain => None,
        Tone::Heading => Some(Color::Cyan),
        Tone::Rule | Tone::Muted => Some(Color::DarkGrey),
        Tone::Event => Some(Color::Red),
        Tone::Rate => Some(Color::Yellow),
        Tone::Error => Some(Color::Red),
    }
}

/// Start time on the left, mode/status/countdown on the right.
pub fn status_line(view: &DashboardView<'_>, width: usize) -> String {
    let left = view.started_label();
    let right = view.status_text();
    let padding = width
        .checked_sub(left.width() + right.width())
        .filter(|pad| *pad > 0)
        .unwrap_or(1);
    format!("{left}{}{right}", " ".repeat(padding))
}

/// Every line of a full redraw, top to bottom.
pub fn compose(view: &DashboardView<'_>, width: usize) -> Vec<PlainLine> {
    let mut lines = vec![
        PlainLine::new(Tone::Plain, status_line(view, width)),
        PlainLine::new(Tone::Muted, view.last_update_label()),
        PlainLine::blank(),
    ];

    match view.error {
        Some(error) => lines.push(PlainLine::new(Tone::Error, error)),
        None => {
            push_events(&mut lines, view, width);
            push_important(&mut lines, view, width);
            push_rates(&mut lines, view, width);
        }
    }

    if view.state.show_help {
        lines.push(PlainLine::blank());
        lines.push(PlainLine::new(Tone::Heading, "=== Keys ==="));
        for (keys, description) in KEY_HELP {
            lines.push(PlainLine::new(
                Tone::Plain,
                format!("{}  {description}", fit(keys, 10)),
            ));
        }
    }

    lines
}

fn push_events(lines: &mut Vec<PlainLine>, view: &DashboardView<'_>, width: usize) {
    let widths = calendar_widths(view.ui);
    lines.push(PlainLine::new(Tone::Heading, "=== Economic calendar ==="));
    lines.push(PlainLine::new(Tone::Plain, fitted_row(&EVENT_HEADERS, &widths)));
    lines.push(PlainLine::new(Tone::Rule, rule(width)));

    let events = view.visible_events();
    if events.is_empty() {
        lines.push(PlainLine::new(Tone::Muted, EMPTY_EVENTS));
        return;
    }

    let mut current_time: Option<&str> = None;
    for event in events {
        if current_time.is_some_and(|time| time != event.time) {
            lines.push(PlainLine::new(Tone::Rule, rule(width)));
        }
        current_time = Some(event.time.as_str());
        lines.push(PlainLine::new(Tone::Event, fitted_row(&event_cells(event), &widths)));
    }
}

fn push_important(lines: &mut Vec<PlainLine>, view: &DashboardView<'_>, width: usize) {
    let Some(events) = view.visible_important() else {
        return;
    };
    let widths = [view.ui.time_width, view.ui.importance_width];

    lines.push(PlainLine::blank());
    lines.push(PlainLine::new(Tone::Heading, "=== Key events ==="));
    lines.push(PlainLine::new(Tone::Plain, fitted_row(&IMPORTANT_HEADERS, &widths)));
    lines.push(PlainLine::new(Tone::Rule, rule(width)));
    for event in events {
        lines.push(PlainLine::new(Tone::Event, fitted_row(&important_cells(event), &widths)));
    }
}

fn push_rates(lines: &mut Vec<PlainLine>, view: &DashboardView<'_>, width: usize) {
    let Some(rates) = view.visible_rates() else {
        return;
    };
    let widths = rate_widths();

    lines.push(PlainLine::blank());
    lines.push(PlainLine::new(Tone::Heading, "=== Central bank rates ==="));
    lines.push(PlainLine::new(Tone::Plain, fitted_row(&RATE_HEADERS, &widths)));
    lines.push(PlainLine::new(Tone::Rule, rule(width)));
    for rate in rates {
        let mut text = fitted_row(&rate_cells(rate), &widths);
        if let Some(cpi) = &rate.latest_cpi {
            text.push_str(&format!("  (CPI: {cpi})"));
        }
        lines.push(PlainLine::new(Tone::Rate, text));
        lines.push(PlainLine::new(Tone::Rule, rule(width)));
    }
}

/// Fit every cell that has a width; cells past the last width are appended
/// as they are.
fn fitted_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    let fitted = cells.iter().enumerate().map(|(i, cell)| match widths.get(i) {
        Some(width) => fit(cell.as_ref(), *width),
        None => cell.as_ref().to_string(),
    });
    join_cells(fitted).trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Snapshot;
    use crate::config::UiConfig;
    use crate::state::{DisplayMode, DisplayState};
    use crate::ui::view::fixtures;
    use std::time::Duration;
    use tokio::time::Instant;

    fn state(mode: DisplayMode) -> DisplayState {
        DisplayState::new(mode, Duration::from_secs(15), Instant::now())
    }

    fn view<'a>(
        state: &'a DisplayState,
        snapshot: &'a Snapshot,
        ui: &'a UiConfig,
        error: Option<&'a str>,
    ) -> DashboardView<'a> {
        DashboardView {
            state,
            snapshot,
            error,
            last_update: None,
            ui,
            now: state.next_refresh_at,
        }
    }

    fn event_lines(lines: &[PlainLine]) -> Vec<&str> {
        lines
            .iter()
            .filter(|l| l.tone == Tone::Event)
            .map(|l| l.text.as_str())
            .collect()
    }

    #[test]
    fn two_row_table_under_high_only_renders_one_row() {
        let snapshot = Snapshot {
            events: vec![
                fixtures::event("08:30", "high", "CPI"),
                fixtures::event("10:00", "medium", "PPI"),
            ],
            ..Snapshot::default()
        };
        let ui = UiConfig::default();
        let state = state(DisplayMode::HighImportanceOnly);

        let lines = compose(&view(&state, &snapshot, &ui, None), 120);
        let rows = event_lines(&lines);
        assert_eq!(rows.len(), 1);
        assert!(rows[0].starts_with("08:30"));
    }

    #[test]
    fn rows_use_configured_widths() {
        let snapshot = Snapshot {
            events: vec![fixtures::event("08:30", "high", "CPI")],
            ..Snapshot::default()
        };
        let ui = UiConfig::default();
        let state = state(DisplayMode::All);

        let lines = compose(&view(&state, &snapshot, &ui, None), 120);
        assert_eq!(
            event_lines(&lines),
            vec!["08:30   high  1.0%          1.1%                        CPI"]
        );
    }

    #[test]
    fn time_groups_are_separated_by_rules() {
        let snapshot = Snapshot {
            events: vec![
                fixtures::event("08:30", "high", "A"),
                fixtures::event("08:30", "high", "B"),
                fixtures::event("09:00", "high", "C"),
            ],
            ..Snapshot::default()
        };
        let ui = UiConfig::default();
        let state = state(DisplayMode::All);

        let lines = compose(&view(&state, &snapshot, &ui, None), 40);
        let start = lines.iter().position(|l| l.tone == Tone::Event).unwrap();
        let tones: Vec<Tone> = lines[start..start + 4].iter().map(|l| l.tone).collect();
        assert_eq!(tones, vec![Tone::Event, Tone::Event, Tone::Rule, Tone::Event]);
        assert_eq!(lines[start + 2].text.chars().count(), 40);
    }

    #[test]
    fn error_replaces_body() {
        let snapshot = fixtures::snapshot();
        let ui = UiConfig::default();
        let state = state(DisplayMode::All);

        let lines = compose(&view(&state, &snapshot, &ui, Some("failed to fetch data: timeout")), 80);
        assert!(event_lines(&lines).is_empty());
        assert!(lines
            .iter()
            .any(|l| l.tone == Tone::Error && l.text == "failed to fetch data: timeout"));
        assert!(!lines.iter().any(|l| l.text.contains("Central bank rates")));
    }

    #[test]
    fn empty_day_renders_empty_state_line() {
        let snapshot = Snapshot::default();
        let ui = UiConfig::default();
        let state = state(DisplayMode::HighImportanceOnly);

        let lines = compose(&view(&state, &snapshot, &ui, None), 80);
        assert!(lines.iter().any(|l| l.text == EMPTY_EVENTS));
    }

    #[test]
    fn rates_section_shows_split_change_and_cpi() {
        let snapshot = fixtures::snapshot();
        let ui = UiConfig::default();
        let state = state(DisplayMode::WithRates);

        let lines = compose(&view(&state, &snapshot, &ui, None), 120);
        let rate = lines.iter().find(|l| l.tone == Tone::Rate).unwrap();
        assert!(rate.text.starts_with("Fed - Policy rate"));
        assert!(rate.text.contains("25        2023-07-26"));
        assert!(rate.text.ends_with("(CPI: 3.1%)"));
        assert!(!lines.iter().any(|l| l.text.contains("Key events")));
    }

    #[test]
    fn key_events_heading_needs_visible_rows() {
        let mut snapshot = fixtures::snapshot();
        let ui = UiConfig::default();
        let state = state(DisplayMode::WithImportant);

        let lines = compose(&view(&state, &snapshot, &ui, None), 120);
        assert!(lines.iter().any(|l| l.text == "=== Key events ==="));

        snapshot.important.retain(|event| !event.is_high());
        let lines = compose(&view(&state, &snapshot, &ui, None), 120);
        assert!(!lines.iter().any(|l| l.text.contains("Key events")));
    }

    #[test]
    fn help_lists_keys() {
        let snapshot = Snapshot::default();
        let ui = UiConfig::default();
        let mut state = state(DisplayMode::All);
        state.toggle_help();

        let lines = compose(&view(&state, &snapshot, &ui, None), 80);
        assert!(lines.iter().any(|l| l.text.starts_with("q ") && l.text.ends_with("Quit")));
    }

    #[test]
    fn status_line_spans_width() {
        let snapshot = Snapshot::default();
        let ui = UiConfig::default();
        let state = state(DisplayMode::All);
        let line = status_line(&view(&state, &snapshot, &ui, None), 120);
        assert_eq!(line.width(), 120);
        assert!(line.ends_with("Next refresh: imminent"));

        let narrow = status_line(&view(&state, &snapshot, &ui, None), 10);
        assert!(narrow.contains("started @ "));
    }

    #[test]
    fn render_writes_one_frame() {
        let snapshot = fixtures::snapshot();
        let ui = UiConfig::default();
        let state = state(DisplayMode::All);

        let mut renderer = PlainRenderer::with_width(Vec::new(), 80);
        renderer.render(&view(&state, &snapshot, &ui, None)).unwrap();
        renderer.render_status(&view(&state, &snapshot, &ui, None)).unwrap();

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.contains("=== Economic calendar ==="));
        assert!(out.contains("Fed chair speech"));
        assert!(out.contains("\r\n"));
        assert_eq!(out.matches("Next refresh:").count(), 2);
    }
}
