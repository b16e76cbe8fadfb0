//! Data models for the invoice query pipeline.
//!
//! This module contains the core data structures passed between the
//! extractor, the loader, the inspector and the dispatcher.

use crate::error::AgentErrorKind;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Raw archive payload as received from the user.
#[derive(Debug, Clone)]
pub struct UploadedArchive {
    /// Declared file name (used only for messages).
    pub name: String,
    /// Archive bytes.
    pub bytes: Vec<u8>,
}

impl UploadedArchive {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Read an archive from disk.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

/// A tabular file found after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Absolute path inside the scratch directory.
    pub path: PathBuf,
    /// File extension (without dot).
    pub extension: String,
}

impl ExtractedFile {
    /// File name component, lossily decoded.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Files discovered in one extracted archive.
#[derive(Debug, Clone)]
pub struct ExtractedFileSet {
    /// Scratch directory holding the extracted entries.
    pub root: PathBuf,
    /// Tabular files, in walk order.
    pub files: Vec<ExtractedFile>,
}

/// Semantic role of an invoice table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableRole {
    /// One row per invoice.
    Header,
    /// One row per invoice line item.
    Items,
}

impl TableRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableRole::Header => "header",
            TableRole::Items => "items",
        }
    }
}

impl fmt::Display for TableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which table(s) a question is asked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableSelection {
    /// Invoice headers (cabeçalho)
    #[default]
    Header,
    /// Invoice line items (itens)
    Items,
    /// Both tables
    Both,
}

impl TableSelection {
    /// Roles covered by this selection, header first.
    pub fn roles(&self) -> &'static [TableRole] {
        match self {
            TableSelection::Header => &[TableRole::Header],
            TableSelection::Items => &[TableRole::Items],
            TableSelection::Both => &[TableRole::Header, TableRole::Items],
        }
    }
}

impl std::str::FromStr for TableSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "header" | "cabecalho" | "cabeçalho" => Ok(TableSelection::Header),
            "items" | "itens" => Ok(TableSelection::Items),
            "both" | "ambas" => Ok(TableSelection::Both),
            other => Err(format!(
                "Unknown table '{}': expected header, items or both",
                other
            )),
        }
    }
}

impl fmt::Display for TableSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSelection::Header => write!(f, "header"),
            TableSelection::Items => write!(f, "items"),
            TableSelection::Both => write!(f, "both"),
        }
    }
}

/// Values of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    /// Values as parsed from the file.
    Text(Vec<String>),
    /// Coerced date/time values; `None` marks an empty cell.
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnValues {
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Text(v) => v.len(),
            ColumnValues::DateTime(v) => v.len(),
        }
    }

    /// Render the value at `row` for display.
    pub fn display_at(&self, row: usize) -> String {
        match self {
            ColumnValues::Text(v) => v.get(row).cloned().unwrap_or_default(),
            ColumnValues::DateTime(v) => match v.get(row) {
                Some(Some(dt)) => format_datetime(dt),
                _ => String::new(),
            },
        }
    }
}

/// Canonical textual form of a coerced value.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: ColumnValues,
}

impl Column {
    pub fn is_datetime(&self) -> bool {
        matches!(self.values, ColumnValues::DateTime(_))
    }
}

/// An in-memory table with columns discovered at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Source file name.
    pub name: String,
    pub role: TableRole,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row `index` rendered as display strings.
    pub fn row(&self, index: usize) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.values.display_at(index))
            .collect()
    }
}

/// The header and items tables of one archive. Both or neither.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceTables {
    pub header: Table,
    pub items: Table,
}

impl InvoiceTables {
    pub fn get(&self, role: TableRole) -> &Table {
        match role {
            TableRole::Header => &self.header,
            TableRole::Items => &self.items,
        }
    }

    /// Tables covered by `selection`, header first.
    pub fn select(&self, selection: TableSelection) -> Vec<&Table> {
        selection.roles().iter().map(|r| self.get(*r)).collect()
    }
}

/// Lightweight metadata about a loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub role: TableRole,
    pub row_count: usize,
    pub column_names: Vec<String>,
    pub date_columns: Vec<String>,
}

/// How a question was handled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerStatus {
    /// The agent returned text.
    Answered,
    /// No agent (or no tables) to ask.
    NotInitialized,
    /// The agent call failed; `message` is the failure description.
    AgentFailed {
        kind: AgentErrorKind,
        message: String,
    },
}

/// Text shown to the user in response to a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    #[serde(flatten)]
    pub status: AnswerStatus,
}

impl Answer {
    pub fn answered(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::Answered,
        }
    }

    pub fn not_initialized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: AnswerStatus::NotInitialized,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == AnswerStatus::Answered
    }
}
