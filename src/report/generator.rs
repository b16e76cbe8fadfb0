//! Text and JSON rendering.
//!
//! This module renders table summaries, previews and answers for the
//! terminal, either as aligned plain text or as JSON.

use crate::analysis::{describe, preview};
use crate::models::{Answer, AnswerStatus, InvoiceTables, Table, TableSelection, TableSummary};
use anyhow::Result;
use serde::Serialize;

/// A table summary with its preview rows, as emitted in JSON mode.
#[derive(Debug, Serialize)]
pub struct TableReport {
    #[serde(flatten)]
    pub summary: TableSummary,
    pub preview: Vec<Vec<String>>,
}

/// A question and its answer, as emitted in JSON mode.
#[derive(Debug, Serialize)]
pub struct AnswerReport<'a> {
    pub question: &'a str,
    pub table: TableSelection,
    #[serde(flatten)]
    pub answer: &'a Answer,
}

/// Summaries and previews of both tables as plain text.
pub fn generate_tables_text(tables: &InvoiceTables, preview_rows: usize) -> String {
    let mut output = String::new();

    for table in [&tables.header, &tables.items] {
        output.push_str(&generate_summary_section(&describe(table)));
        if preview_rows > 0 {
            output.push_str(&generate_preview_grid(table, preview_rows));
        }
        output.push('\n');
    }

    output
}

/// Summaries only, as plain text.
pub fn generate_schema_text(summaries: &[TableSummary]) -> String {
    let mut output = String::new();

    for summary in summaries {
        output.push_str(&generate_summary_section(summary));
        output.push('\n');
    }

    output
}

/// Summary block for one table.
fn generate_summary_section(summary: &TableSummary) -> String {
    let mut section = String::new();

    section.push_str(&format!("📄 {} ({})\n", summary.name, summary.role));
    section.push_str(&format!(
        "   Rows: {} | Columns: {}\n",
        summary.row_count,
        summary.column_names.len()
    ));
    section.push_str(&format!("   Columns: {}\n", summary.column_names.join(", ")));
    if !summary.date_columns.is_empty() {
        section.push_str(&format!(
            "   Date columns: {}\n",
            summary.date_columns.join(", ")
        ));
    }

    section
}

/// The first `rows` rows of `table` as an aligned grid.
pub fn generate_preview_grid(table: &Table, rows: usize) -> String {
    let header = table.column_names();
    let body = preview(table, rows);

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut grid = String::new();
    grid.push_str(&format_row(&header, &widths));
    grid.push_str(&format_row(
        &widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>(),
        &widths,
    ));
    for row in &body {
        grid.push_str(&format_row(row, &widths));
    }

    if table.row_count() > body.len() {
        grid.push_str(&format!(
            "   ... {} more row(s)\n",
            table.row_count() - body.len()
        ));
    }

    grid
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    format!("   {}\n", padded.join(" | ").trim_end())
}

/// An answer as plain text.
pub fn generate_answer_text(answer: &Answer) -> String {
    let mut output = String::new();

    match &answer.status {
        AnswerStatus::Answered => output.push_str("💬 "),
        AnswerStatus::NotInitialized => output.push_str("⚠️  "),
        AnswerStatus::AgentFailed { .. } => output.push_str("❌ "),
    }
    output.push_str(answer.text.trim_end());
    output.push('\n');

    output
}

/// Summaries and previews of both tables as JSON; `[]` when nothing is loaded.
pub fn generate_tables_json(tables: Option<&InvoiceTables>, preview_rows: usize) -> Result<String> {
    let reports: Vec<TableReport> = tables
        .into_iter()
        .flat_map(|t| [&t.header, &t.items])
        .map(|table| TableReport {
            summary: describe(table),
            preview: preview(table, preview_rows),
        })
        .collect();

    serde_json::to_string_pretty(&reports).map_err(Into::into)
}

/// A question and its answer as JSON.
pub fn generate_answer_json(
    question: &str,
    selection: TableSelection,
    answer: &Answer,
) -> Result<String> {
    let report = AnswerReport {
        question,
        table: selection,
        answer,
    };
    serde_json::to_string_pretty(&report).map_err(Into::into)
}
