//! Calendar page extraction.
//!
//! The page carries one primary table (`table.cjsj_tab`) with the day's
//! releases and several secondary tables (`table.cjsj_tab2`). The last
//! secondary table holds central-bank rates, the earlier ones highlighted
//! events. Rows are mapped positionally once the header row has been checked
//! against a small named schema.
//!
//! Highlighted-event tables open with a title row and a column row, and only
//! rows carrying a `|` in their text are events.

use scraper::{ElementRef, Html};

use super::models::{CalendarEvent, ImportantEvent, RateRecord, Snapshot};
use crate::error::ExtractError;

const PRIMARY_CLASS: &str = "cjsj_tab";
const SECONDARY_CLASS: &str = "cjsj_tab2";

/// Minimal header schema for one table kind.
struct TableSchema {
    name: &'static str,
    min_cells: usize,
    /// `(column index, accepted header fragments)`
    key_columns: &'static [(usize, &'static [&'static str])],
    /// Rows before the data: the column header, possibly after a title row.
    leading_rows: usize,
    /// Text every data row must contain.
    row_marker: Option<char>,
}

const CALENDAR: TableSchema = TableSchema {
    name: "calendar",
    min_cells: 7,
    key_columns: &[
        (0, &["时间", "time"]),
        (2, &["指标", "事件", "数据", "indicator", "event"]),
        (6, &["重要", "星级", "importance"]),
    ],
    leading_rows: 1,
    row_marker: None,
};

const IMPORTANT: TableSchema = TableSchema {
    name: "important events",
    min_cells: 5,
    key_columns: &[(0, &["时间", "time"]), (4, &["事件", "内容", "event"])],
    leading_rows: 2,
    row_marker: Some('|'),
};

const RATES: TableSchema = TableSchema {
    name: "rates",
    min_cells: 9,
    key_columns: &[
        (0, &["央行", "银行", "机构", "bank", "institution"]),
        (1, &["利率", "名称", "rate"]),
    ],
    leading_rows: 1,
    row_marker: None,
};

/// Parse a calendar page into a [`Snapshot`].
///
/// Fails only when the markup is not a document at all or the calendar
/// table's header no longer matches its schema. A secondary table whose header
/// drifted contributes no records and is listed in [`Snapshot::skipped`].
/// Rows that are too short or miss required fields are skipped.
pub fn extract(markup: &str) -> Result<Snapshot, ExtractError> {
    if markup.trim().is_empty() {
        return Err(ExtractError::NotADocument);
    }

    let document = Html::parse_document(markup);
    let root = document.root_element();
    if !has_explicit_elements(root) {
        return Err(ExtractError::NotADocument);
    }

    let primary: Vec<ElementRef> = tables_with_class(root, PRIMARY_CLASS).collect();
    let secondary: Vec<ElementRef> = tables_with_class(root, SECONDARY_CLASS).collect();

    let mut snapshot = Snapshot::default();

    for table in &primary {
        for cells in data_rows(*table, &CALENDAR)? {
            if let Some(event) = calendar_event(&cells) {
                snapshot.events.push(event);
            }
        }
    }

    if let Some((rate_table, event_tables)) = secondary.split_last() {
        for table in event_tables {
            match data_rows(*table, &IMPORTANT) {
                Ok(rows) => snapshot
                    .important
                    .extend(rows.iter().filter_map(|cells| important_event(cells))),
                Err(drift) => snapshot.skipped.push(drift),
            }
        }
        match data_rows(*rate_table, &RATES) {
            Ok(rows) => snapshot
                .rates
                .extend(rows.iter().filter_map(|cells| rate_record(cells))),
            Err(drift) => snapshot.skipped.push(drift),
        }
    }

    Ok(snapshot)
}

fn calendar_event(cells: &[String]) -> Option<CalendarEvent> {
    let event = CalendarEvent {
        time: cell(cells, 0),
        region: cell(cells, 1),
        indicator: cell(cells, 2),
        previous: cell(cells, 3),
        forecast: cell(cells, 4),
        actual: cell(cells, 5),
        importance: cell(cells, 6),
        impact: cell(cells, 7),
        description: cell(cells, 8),
    };
    (!event.time.is_empty() && !event.indicator.is_empty()).then_some(event)
}

fn important_event(cells: &[String]) -> Option<ImportantEvent> {
    let event = ImportantEvent {
        time: cell(cells, 0),
        region: cell(cells, 1),
        location: cell(cells, 2),
        importance: cell(cells, 3),
        event: cell(cells, 4),
    };
    (!event.time.is_empty() && !event.event.is_empty()).then_some(event)
}

fn rate_record(cells: &[String]) -> Option<RateRecord> {
    let last_change = cell(cells, 4);
    let (change_amount, change_date) = RateRecord::split_last_change(&last_change);
    let latest_cpi = cell(cells, 8);

    let rate = RateRecord {
        bank: cell(cells, 0),
        rate_name: cell(cells, 1),
        current_rate: cell(cells, 2),
        previous_rate: cell(cells, 3),
        last_change,
        change_amount,
        change_date,
        history_high: cell(cells, 5),
        history_low: cell(cells, 6),
        next_forecast: cell(cells, 7),
        latest_cpi: (!latest_cpi.is_empty()).then_some(latest_cpi),
    };
    (!rate.bank.is_empty() && !rate.rate_name.is_empty()).then_some(rate)
}

fn cell(cells: &[String], index: usize) -> String {
    cells.get(index).cloned().unwrap_or_default()
}

/// Rows after the leading rows that carry the table's marker and meet its
/// minimum cell count, as trimmed cell texts. The column header among the
/// leading rows is checked against the schema first.
fn data_rows(table: ElementRef<'_>, schema: &TableSchema) -> Result<Vec<Vec<String>>, ExtractError> {
    let mut rows = descendants_named(table, "tr");

    let leading: Vec<ElementRef> = rows.by_ref().take(schema.leading_rows).collect();
    // A title row spans the table in one cell; the column row has the most.
    if let Some(header) = leading.into_iter().max_by_key(|row| header_cells(*row).count()) {
        check_header(header, schema)?;
    }

    Ok(rows
        .filter(|row| {
            schema
                .row_marker
                .map_or(true, |marker| row.text().any(|text| text.contains(marker)))
        })
        .map(|row| descendants_named(row, "td").map(cell_text).collect::<Vec<_>>())
        .filter(|cells| cells.len() >= schema.min_cells)
        .collect())
}

fn header_cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    descendants_named_any(row, &["th", "td"])
}

fn check_header(header: ElementRef<'_>, schema: &TableSchema) -> Result<(), ExtractError> {
    let titles: Vec<String> = header_cells(header).map(cell_text).collect();

    // Headerless tables fall back to plain positional mapping.
    if titles.iter().all(String::is_empty) {
        return Ok(());
    }

    for (column, aliases) in schema.key_columns {
        let found = titles.get(*column).cloned().unwrap_or_default();
        let lowered = found.to_lowercase();
        if !aliases.iter().any(|alias| lowered.contains(alias)) {
            return Err(ExtractError::SchemaDrift {
                table: schema.name,
                column: *column,
                found,
            });
        }
    }
    Ok(())
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn tables_with_class<'a>(
    root: ElementRef<'a>,
    class: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    descendants_named(root, "table").filter(move |table| table.value().classes().any(|c| c == class))
}

fn descendants_named<'a>(
    root: ElementRef<'a>,
    name: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == name)
}

fn descendants_named_any<'a>(
    root: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |el| names.iter().any(|name| *name == el.value().name()))
}

/// The HTML parser always synthesises `html`/`head`/`body`; anything else
/// must have come from the input.
fn has_explicit_elements(root: ElementRef<'_>) -> bool {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .any(|el| !matches!(el.value().name(), "html" | "head" | "body"))
}
