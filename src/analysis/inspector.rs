//! Schema inspection and previews.
//!
//! Pure helpers that derive display metadata from loaded tables.

use crate::models::{InvoiceTables, Table, TableSummary};

/// Row count, column names and coerced date columns of `table`.
pub fn describe(table: &Table) -> TableSummary {
    TableSummary {
        name: table.name.clone(),
        role: table.role,
        row_count: table.row_count(),
        column_names: table.column_names(),
        date_columns: table
            .columns
            .iter()
            .filter(|c| c.is_datetime())
            .map(|c| c.name.clone())
            .collect(),
    }
}

/// Summaries of both tables, header first.
pub fn describe_all(tables: &InvoiceTables) -> Vec<TableSummary> {
    vec![describe(&tables.header), describe(&tables.items)]
}

/// The first `limit` rows of `table` as display strings.
pub fn preview(table: &Table, limit: usize) -> Vec<Vec<String>> {
    (0..table.row_count().min(limit))
        .map(|i| table.row(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Column, ColumnValues, TableRole};
    use chrono::NaiveDate;

    fn create_test_table() -> Table {
        let day = |d| {
            NaiveDate::from_ymd_opt(2024, 1, d)
                .unwrap()
                .and_hms_opt(0, 0, 0)
        };
        Table {
            name: "202401_NFs_Cabecalho.csv".to_string(),
            role: TableRole::Header,
            columns: vec![
                Column {
                    name: "fornecedor".to_string(),
                    values: ColumnValues::Text(vec![
                        "ACME".to_string(),
                        "Globex".to_string(),
                        "Initech".to_string(),
                    ]),
                },
                Column {
                    name: "data_emissao".to_string(),
                    values: ColumnValues::DateTime(vec![day(1), day(2), day(3)]),
                },
            ],
        }
    }

    #[test]
    fn test_describe() {
        let summary = describe(&create_test_table());

        assert_eq!(summary.row_count, 3);
        assert_eq!(summary.column_names, vec!["fornecedor", "data_emissao"]);
        assert_eq!(summary.date_columns, vec!["data_emissao"]);
        assert_eq!(summary.role, TableRole::Header);
    }

    #[test]
    fn test_describe_is_idempotent() {
        let table = create_test_table();
        let first = describe(&table);
        let _ = preview(&table, 2);
        assert_eq!(first, describe(&table));
    }

    #[test]
    fn test_preview_limits_rows() {
        let table = create_test_table();

        let rows = preview(&table, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["Globex", "2024-01-02 00:00:00"]);

        assert_eq!(preview(&table, 10).len(), 3);
        assert!(preview(&table, 0).is_empty());
    }
}
