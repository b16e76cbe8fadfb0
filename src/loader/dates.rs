//! Best-effort date coercion.
//!
//! A column is a candidate when its name contains a date token. Coercion
//! is all-or-nothing per column: one unparseable non-empty cell leaves
//! the whole column as text.

use crate::models::{ColumnValues, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

/// Parse one cell. Day-first is assumed for slash-separated dates.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    // Offsets are dropped; the wall-clock time written in the file is kept.
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// True when `column_name` contains any of the (lower-case) `tokens`.
pub fn is_date_column(column_name: &str, tokens: &[String]) -> bool {
    let name = column_name.to_lowercase();
    tokens.iter().any(|t| name.contains(t.as_str()))
}

/// Coerce every text value or give up. Empty cells become `None`.
///
/// Returns `None` if any non-empty cell fails or if no cell has a value.
pub fn coerce_values(values: &[String]) -> Option<Vec<Option<NaiveDateTime>>> {
    let mut coerced = Vec::with_capacity(values.len());
    let mut seen_value = false;

    for value in values {
        if value.trim().is_empty() {
            coerced.push(None);
            continue;
        }
        coerced.push(Some(parse_datetime(value)?));
        seen_value = true;
    }

    seen_value.then_some(coerced)
}

/// Apply coercion to every date-named text column of `table`.
pub fn coerce_date_columns(table: &mut Table, tokens: &[String]) {
    for column in &mut table.columns {
        if !is_date_column(&column.name, tokens) {
            continue;
        }

        let ColumnValues::Text(values) = &column.values else {
            continue;
        };

        match coerce_values(values) {
            Some(coerced) => {
                debug!("{}: column '{}' coerced to datetime", table.name, column.name);
                column.values = ColumnValues::DateTime(coerced);
            }
            None => {
                debug!(
                    "{}: column '{}' left as text (not all values are dates)",
                    table.name, column.name
                );
            }
        }
    }
}
