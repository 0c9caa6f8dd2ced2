use std::io;

use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};

use super::columns::{calendar_widths, rate_widths};
use super::help::{FOOTER_HINTS, KEY_HELP};
use super::view::{
    event_cells, important_cells, rate_cells, DashboardView, EMPTY_EVENTS, EVENT_HEADERS,
    IMPORTANT_HEADERS, RATE_HEADERS,
};
use super::Renderer;
use crate::api::{Impact, Importance};

/// ratatui dashboard. The 1 Hz tick redraws the whole frame; ratatui only
/// flushes the cells that changed.
pub struct WidgetRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> WidgetRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Renderer for WidgetRenderer<B> {
    fn render(&mut self, view: &DashboardView<'_>) -> io::Result<()> {
        self.terminal.draw(|frame| draw(frame, view))?;
        Ok(())
    }
}

fn draw(frame: &mut Frame, view: &DashboardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status bar
            Constraint::Min(0),    // Sections
            Constraint::Length(3), // Footer
        ])
        .split(frame.size());

    render_status_bar(frame, chunks[0], view);

    match view.error {
        Some(error) => render_error(frame, chunks[1], error),
        None => render_sections(frame, chunks[1], view),
    }

    render_footer(frame, chunks[2], view);

    if view.state.show_help {
        render_help(frame);
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let state_indicator = if view.state.paused {
        Span::styled("● Paused", Style::default().fg(Color::Yellow))
    } else {
        Span::styled("● Running", Style::default().fg(Color::Green))
    };

    let line = Line::from(vec![
        state_indicator,
        Span::raw("  │  "),
        Span::styled(
            view.state.mode.label(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  │  "),
        Span::raw(format!("Next: {}", view.countdown().label())),
        Span::raw("  │  "),
        Span::raw(view.last_update_label()),
    ]);

    let title = format!(" FXWATCH · since {} ", view.state.started_at.format("%Y-%m-%d %H:%M:%S"));
    let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, area: Rect, error: &str) {
    let line = Line::from(vec![
        Span::styled("ERROR: ", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
        Span::styled(error, Style::default().fg(Color::Red)),
    ]);
    let paragraph = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(" ECONOMIC CALENDAR "))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_sections(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let important = view.visible_important();
    let rates = view.visible_rates();

    let mut constraints = vec![Constraint::Min(5)];
    if let Some(events) = &important {
        constraints.push(Constraint::Length(section_height(events.len())));
    }
    if let Some(rates) = rates {
        constraints.push(Constraint::Length(section_height(rates.len())));
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    render_events(frame, chunks[0], view);

    let mut next = 1;
    if let Some(events) = important {
        let rows = events.into_iter().map(|event| {
            Row::new(important_cells(event)).style(importance_style(event.importance_tier()))
        });
        let widths = [
            Constraint::Length(view.ui.time_width as u16),
            Constraint::Length(view.ui.importance_width as u16),
            Constraint::Min(10),
        ];
        render_table(frame, chunks[next], " KEY EVENTS ", &IMPORTANT_HEADERS, rows, widths);
        next += 1;
    }
    if let Some(rates) = rates {
        let rows = rates.iter().map(|rate| {
            let mut cells = rate_cells(rate).to_vec();
            if let Some(cpi) = &rate.latest_cpi {
                cells.push(format!("CPI {cpi}"));
            }
            Row::new(cells).style(Style::default().fg(Color::Yellow))
        });
        let mut widths: Vec<Constraint> = rate_widths()
            .iter()
            .map(|w| Constraint::Length(*w as u16))
            .collect();
        widths.push(Constraint::Min(8));
        render_table(frame, chunks[next], " CENTRAL BANK RATES ", &RATE_HEADERS, rows, widths);
    }
}

fn render_events(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let events = view.visible_events();
    if events.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            EMPTY_EVENTS,
            Style::default().fg(Color::DarkGray),
        )))
        .block(Block::default().borders(Borders::ALL).title(" ECONOMIC CALENDAR "));
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = events.into_iter().map(|event| {
        let [time, importance, previous, forecast, actual, indicator] = event_cells(event);
        Row::new(vec![
            Cell::from(time),
            Cell::from(importance),
            Cell::from(previous),
            Cell::from(forecast),
            Cell::from(actual).style(impact_style(event.direction())),
            Cell::from(indicator),
        ])
        .style(importance_style(event.importance_tier()))
    });

    let mut widths: Vec<Constraint> = calendar_widths(view.ui)
        .iter()
        .map(|w| Constraint::Length(*w as u16))
        .collect();
    widths.push(Constraint::Min(10)); // Indicator

    render_table(frame, area, " ECONOMIC CALENDAR ", &EVENT_HEADERS, rows, widths);
}

fn render_table<'a, R, C>(
    frame: &mut Frame,
    area: Rect,
    title: &'a str,
    headers: &[&'a str],
    rows: R,
    widths: C,
) where
    R: IntoIterator<Item = Row<'a>>,
    C: IntoIterator,
    C::Item: Into<Constraint>,
{
    let header = Row::new(headers.to_vec())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));

    frame.render_widget(table, area);
}

/// Borders + header + margin + rows.
fn section_height(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(4)
}

fn importance_style(importance: Importance) -> Style {
    match importance {
        Importance::High => Style::default().fg(Color::LightRed),
        Importance::Medium => Style::default().fg(Color::White),
        Importance::Low => Style::default().fg(Color::Gray),
    }
}

/// Colour of a released figure by its market impact.
fn impact_style(impact: Impact) -> Style {
    match impact {
        Impact::Bullish => Style::default().fg(Color::Green),
        Impact::Bearish => Style::default().fg(Color::Red),
        Impact::Neutral => Style::default(),
    }
}

fn render_footer(frame: &mut Frame, area: Rect, view: &DashboardView<'_>) {
    let mut spans = Vec::new();
    for (key, label) in FOOTER_HINTS {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(label));
    }
    if view.state.paused {
        spans.push(Span::styled("   PAUSED", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame) {
    // Centered popup, 60% wide, sized to its content.
    let area = frame.size();
    let popup_width = (u32::from(area.width) * 60 / 100) as u16;
    let popup_height = (KEY_HELP.len() as u16 + 6).min(area.height);
    let popup_area = Rect {
        x: (area.width - popup_width) / 2,
        y: (area.height - popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "KEYBOARD SHORTCUTS",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    for (keys, description) in KEY_HELP {
        help_text.push(Line::from(vec![
            Span::styled(format!("  [{keys}] "), Style::default().fg(Color::Cyan)),
            Span::raw(description),
        ]));
    }
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(
        "Press [ESC] or [h] to close",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" HELP ")
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Snapshot;
    use crate::config::UiConfig;
    use crate::state::{DisplayMode, DisplayState};
    use crate::ui::view::fixtures;
    use ratatui::backend::TestBackend;
    use std::time::Duration;
    use tokio::time::Instant;

    fn screen(renderer: &WidgetRenderer<TestBackend>) -> String {
        let buffer = renderer.terminal().backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn draw_with(state: &DisplayState, snapshot: &Snapshot, error: Option<&str>) -> String {
        draw_sized(state, snapshot, error, 120, 40)
    }

    fn draw_sized(
        state: &DisplayState,
        snapshot: &Snapshot,
        error: Option<&str>,
        width: u16,
        height: u16,
    ) -> String {
        let ui = UiConfig::default();
        let view = DashboardView {
            state,
            snapshot,
            error,
            last_update: None,
            ui: &ui,
            now: state.next_refresh_at,
        };
        let mut renderer = WidgetRenderer::new(Terminal::new(TestBackend::new(width, height)).unwrap());
        renderer.render(&view).unwrap();
        screen(&renderer)
    }

    fn state(mode: DisplayMode) -> DisplayState {
        DisplayState::new(mode, Duration::from_secs(15), Instant::now())
    }

    #[test]
    fn high_only_mode_draws_high_rows() {
        let screen = draw_with(&state(DisplayMode::HighImportanceOnly), &fixtures::snapshot(), None);
        assert!(screen.contains("CPI"));
        assert!(!screen.contains("PPI"));
        assert!(!screen.contains("CENTRAL BANK RATES"));
        assert!(screen.contains("imminent"));
    }

    #[test]
    fn all_mode_draws_every_section() {
        let screen = draw_with(&state(DisplayMode::All), &fixtures::snapshot(), None);
        assert!(screen.contains("PPI"));
        assert!(screen.contains("KEY EVENTS"));
        assert!(screen.contains("Treasury auction"));
        assert!(screen.contains("CENTRAL BANK RATES"));
        assert!(screen.contains("Fed - Policy rate"));
    }

    #[test]
    fn error_replaces_sections() {
        let screen = draw_with(
            &state(DisplayMode::All),
            &fixtures::snapshot(),
            Some("failed to fetch data: timed out"),
        );
        assert!(screen.contains("ERROR: failed to fetch data: timed out"));
        assert!(!screen.contains("CENTRAL BANK RATES"));
    }

    #[test]
    fn help_overlay_and_pause_marker() {
        let mut state = state(DisplayMode::All);
        state.toggle_help();
        state.toggle_pause();
        let screen = draw_with(&state, &Snapshot::default(), None);
        assert!(screen.contains("KEYBOARD SHORTCUTS"));
        assert!(screen.contains("PAUSED"));
        assert!(screen.contains(EMPTY_EVENTS));
    }

    #[test]
    fn key_events_without_high_rows_are_not_drawn() {
        let mut snapshot = fixtures::snapshot();
        snapshot.important.retain(|event| !event.is_high());
        let screen = draw_with(&state(DisplayMode::WithImportant), &snapshot, None);
        assert!(!screen.contains("KEY EVENTS"));
        assert!(screen.contains("CPI"));
    }

    #[test]
    fn help_popup_fits_very_wide_terminals() {
        let mut state = state(DisplayMode::All);
        state.toggle_help();
        let screen = draw_sized(&state, &Snapshot::default(), None, 1200, 30);
        assert!(screen.contains("KEYBOARD SHORTCUTS"));
    }
}
