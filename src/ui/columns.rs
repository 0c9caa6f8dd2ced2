//! Fixed-width column formatting.
//!
//! Widths are terminal display cells, so CJK text counts double. Values wider
//! than their column are cut and end with `…`; narrower ones are padded.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::UiConfig;

pub const ELLIPSIS: char = '…';

// Rates table; not configurable.
pub const BANK_WIDTH: usize = 20;
pub const RATE_WIDTH: usize = 10;
pub const CHANGE_WIDTH: usize = 8;
pub const DATE_WIDTH: usize = 12;
pub const HISTORY_WIDTH: usize = 20;

pub const RULE_CHAR: char = '─';

/// Pad or truncate `text` to exactly `width` display cells.
pub fn fit(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let text_width = text.width();
    if text_width <= width {
        let mut out = String::with_capacity(text.len() + width - text_width);
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(width - text_width));
        return out;
    }

    // Leave one cell for the ellipsis.
    let budget = width - 1;
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push(ELLIPSIS);
    used += 1;
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

/// Full-width separator line.
pub fn rule(width: usize) -> String {
    std::iter::repeat(RULE_CHAR).take(width).collect()
}

/// Join already-fitted cells with the two-space gutter used everywhere.
pub fn join_cells<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, cell) in cells.into_iter().enumerate() {
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell.as_ref());
    }
    line
}

/// Widths for the calendar columns: time, importance, previous, forecast,
/// actual. The indicator column takes the rest of the line.
pub fn calendar_widths(ui: &UiConfig) -> [usize; 5] {
    [
        ui.time_width,
        ui.importance_width,
        ui.value_width,
        ui.value_width,
        ui.value_width,
    ]
}

pub fn rate_widths() -> [usize; 7] {
    [
        BANK_WIDTH,
        RATE_WIDTH,
        RATE_WIDTH,
        CHANGE_WIDTH,
        DATE_WIDTH,
        HISTORY_WIDTH,
        RATE_WIDTH,
    ]
}
