use std::time::Duration;

use fxwatch::api::{extract, Importance};
use fxwatch::config::UiConfig;
use fxwatch::state::{DisplayMode, DisplayState};
use fxwatch::ui::plain::{compose, Tone};
use fxwatch::ui::DashboardView;
use tokio::time::Instant;

const PAGE: &str = include_str!("fixtures/calendar.html");

#[test]
fn extracts_every_section_of_a_calendar_page() {
    let snapshot = extract(PAGE).unwrap();

    // The colspan note and the row without a time are not events.
    let times: Vec<&str> = snapshot.events.iter().map(|e| e.time.as_str()).collect();
    assert_eq!(times, ["07:50", "17:00", "17:00", "23:00"]);

    let cpi = &snapshot.events[1];
    assert_eq!(cpi.region, "欧元区");
    assert_eq!(cpi.indicator, "2月CPI年率初值");
    assert_eq!(cpi.actual, "2.6%");
    assert_eq!(cpi.importance_tier(), Importance::High);
    assert_eq!(cpi.description, "通胀回落慢于预期");

    let pmi = &snapshot.events[3];
    assert_eq!(pmi.actual, "");
    assert!(pmi.is_high());

    // Title row, column row and rows without the `|` marker are not events.
    assert_eq!(snapshot.important.len(), 2);
    assert_eq!(snapshot.important[0].time, "00:15");
    assert_eq!(snapshot.important[0].location, "华盛顿");
    assert_eq!(snapshot.important[1].event, "全国政协会议开幕");
    assert!(snapshot.skipped.is_empty());
}

#[test]
fn rates_table_splits_the_last_change() {
    let snapshot = extract(PAGE).unwrap();
    assert_eq!(snapshot.rates.len(), 3);

    let fed = &snapshot.rates[0];
    assert_eq!(fed.label(), "美联储 - 联邦基金利率");
    assert_eq!(fed.change_amount, "25");
    assert_eq!(fed.change_date, "2023-07-26");
    assert_eq!(fed.history_range(), "0.25% - 20.00%");
    assert_eq!(fed.latest_cpi.as_deref(), Some("3.1%"));

    assert_eq!(snapshot.rates[1].latest_cpi, None);

    // A single token cannot be split into amount and date.
    let boj = &snapshot.rates[2];
    assert_eq!(boj.last_change, "维持");
    assert_eq!(boj.change_amount, "");
    assert_eq!(boj.change_date, "");
}

#[test]
fn high_importance_view_of_the_page() {
    let snapshot = extract(PAGE).unwrap();
    let state = DisplayState::new(
        DisplayMode::HighImportanceOnly,
        Duration::from_secs(15),
        Instant::now(),
    );
    let ui = UiConfig::default();
    let view = DashboardView {
        state: &state,
        snapshot: &snapshot,
        error: None,
        last_update: None,
        ui: &ui,
        now: state.next_refresh_at,
    };

    let lines = compose(&view, 100);
    let events: Vec<&str> = lines
        .iter()
        .filter(|line| line.tone == Tone::Event)
        .map(|line| line.text.as_str())
        .collect();

    assert_eq!(events.len(), 2);
    assert!(events[0].starts_with("17:00"));
    assert!(events[0].ends_with("欧元区 2月CPI年率初值"));
    assert!(events[1].starts_with("23:00"));
    assert!(lines.iter().all(|line| line.tone != Tone::Rate));
}

#[test]
fn reparsing_the_page_is_stable() {
    assert_eq!(extract(PAGE).unwrap(), extract(PAGE).unwrap());
}
