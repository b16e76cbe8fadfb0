//! Prompt assembly.
//!
//! Every question is sent with the full context: the table roles, the
//! columns of each selected table, optionally the whole table as CSV,
//! and finally the question itself.

use crate::models::{Table, TableRole};
use csv::WriterBuilder;
use tracing::warn;

const TABLE_ROLES: &str = "The data comes from two related CSV tables of Brazilian electronic invoices (notas fiscais):
- header (cabeçalho): one row per invoice, with summary fields such as supplier identity, invoice total and issue date.
- items (itens): one row per invoice line item, with product, quantity and line value. Items link to their invoice through the shared invoice key (chave de acesso).";

/// Compose the prompt for `question` over `tables`.
pub fn build_prompt(question: &str, tables: &[&Table], embed_contents: bool) -> String {
    let mut prompt = String::new();

    prompt.push_str(TABLE_ROLES);
    prompt.push_str("\n\n");

    for table in tables {
        prompt.push_str(&table_section(table, embed_contents));
    }

    prompt.push_str("=== QUESTION ===\n");
    prompt.push_str(question);
    prompt
}

fn role_label(role: TableRole) -> &'static str {
    match role {
        TableRole::Header => "header (cabeçalho)",
        TableRole::Items => "items (itens)",
    }
}

fn table_section(table: &Table, embed_contents: bool) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "### TABLE: {} | file: {} | rows: {}\n",
        role_label(table.role),
        table.name,
        table.row_count()
    ));
    section.push_str(&format!("Columns: {}\n", table.column_names().join(", ")));

    if embed_contents {
        match render_csv(table) {
            Ok(csv) => {
                section.push_str("```csv\n");
                section.push_str(&csv);
                section.push_str("```\n");
            }
            Err(e) => warn!("Could not render {} for the prompt: {}", table.name, e),
        }
    }

    section.push('\n');
    section
}

/// Render the whole table, header row included, as CSV text.
pub fn render_csv(table: &Table) -> Result<String, csv::Error> {
    let mut wtr = WriterBuilder::new().from_writer(Vec::new());

    wtr.write_record(table.column_names())?;
    for i in 0..table.row_count() {
        wtr.write_record(table.row(i))?;
    }

    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnValues};

    fn items_table() -> Table {
        Table {
            name: "202401_NFs_Itens.csv".to_string(),
            role: TableRole::Items,
            columns: vec![
                Column {
                    name: "item".to_string(),
                    values: ColumnValues::Text(vec![
                        "parafuso, inox".to_string(),
                        "porca".to_string(),
                    ]),
                },
                Column {
                    name: "quantidade".to_string(),
                    values: ColumnValues::Text(vec!["100".to_string(), "50".to_string()]),
                },
            ],
        }
    }

    #[test]
    fn test_render_csv_quotes_fields() {
        let csv = render_csv(&items_table()).unwrap();
        assert_eq!(csv, "item,quantidade\n\"parafuso, inox\",100\nporca,50\n");
    }

    #[test]
    fn test_prompt_embeds_contents_and_ends_with_question() {
        let table = items_table();
        let prompt = build_prompt("Qual item teve maior quantidade?", &[&table], true);

        assert!(prompt.starts_with("The data comes from two related CSV tables"));
        assert!(prompt.contains("### TABLE: items (itens) | file: 202401_NFs_Itens.csv | rows: 2"));
        assert!(prompt.contains("Columns: item, quantidade"));
        assert!(prompt.contains("porca,50"));
        assert!(prompt.ends_with("=== QUESTION ===\nQual item teve maior quantidade?"));
    }

    #[test]
    fn test_prompt_without_contents_lists_columns_only() {
        let table = items_table();
        let prompt = build_prompt("How many items?", &[&table], false);

        assert!(prompt.contains("Columns: item, quantidade"));
        assert!(!prompt.contains("porca"));
        assert!(!prompt.contains("```csv"));
    }
}
