//! CSV parsing into column-oriented tables.

use crate::error::LoadError;
use crate::models::{Column, ColumnValues, Table, TableRole};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

/// Parse a delimited UTF-8 file with a header row.
///
/// Ragged rows and invalid UTF-8 are errors. The file handle is owned by
/// the reader and released when this function returns.
pub fn read_table(path: &Path, role: TableRole, delimiter: u8) -> Result<Table, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| LoadError::new(path, e))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| LoadError::new(path, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::new(path, "missing header row"));
    }

    let mut values: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record.map_err(|e| LoadError::new(path, e))?;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            column.push(field.to_string());
        }
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let columns: Vec<Column> = headers
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column {
            name,
            values: ColumnValues::Text(values),
        })
        .collect();

    debug!(
        "Parsed {}: {} columns, {} rows",
        name,
        columns.len(),
        columns.first().map(|c| c.values.len()).unwrap_or(0)
    );

    Ok(Table {
        name,
        role,
        columns,
    })
}
