//! Table loading.
//!
//! Routes extracted files to their invoice role, parses them as CSV and
//! applies best-effort date coercion.

pub mod classify;
pub mod dates;
pub mod parse;

use crate::error::LoadFailure;
use crate::models::{ExtractedFileSet, InvoiceTables, TableRole};
use tracing::info;

pub use classify::classify;

/// Loader settings.
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Lower-case tokens identifying the header file.
    pub header_tokens: Vec<String>,
    /// Lower-case tokens identifying the items file.
    pub items_tokens: Vec<String>,
    /// Lower-case tokens marking a column as date-like.
    pub date_tokens: Vec<String>,
    /// Field delimiter.
    pub delimiter: u8,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self::from(&crate::config::LoaderConfig::default())
    }
}

impl From<&crate::config::LoaderConfig> for LoadConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        let lower = |tokens: &[String]| -> Vec<String> {
            tokens.iter().map(|t| t.to_lowercase()).collect()
        };
        Self {
            header_tokens: lower(&config.header_tokens),
            items_tokens: lower(&config.items_tokens),
            date_tokens: lower(&config.date_tokens),
            delimiter: config.delimiter_byte(),
        }
    }
}

/// Load both invoice tables from an extracted file set.
///
/// Either both tables are returned or none is.
pub fn load(files: &ExtractedFileSet, config: &LoadConfig) -> Result<InvoiceTables, LoadFailure> {
    let classification = classify(&files.files, config)?;

    let mut header = parse::read_table(&classification.header, TableRole::Header, config.delimiter)?;
    let mut items = parse::read_table(&classification.items, TableRole::Items, config.delimiter)?;

    dates::coerce_date_columns(&mut header, &config.date_tokens);
    dates::coerce_date_columns(&mut items, &config.date_tokens);

    info!(
        "Loaded {} ({} rows) and {} ({} rows)",
        header.name,
        header.row_count(),
        items.name,
        items.row_count()
    );

    Ok(InvoiceTables { header, items })
}
