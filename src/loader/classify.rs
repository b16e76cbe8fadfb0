//! Filename-based routing of extracted files to invoice roles.

use super::LoadConfig;
use crate::error::SchemaIdentificationError;
use crate::models::{ExtractedFile, TableRole};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Files chosen for each role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub header: PathBuf,
    pub items: PathBuf,
}

/// Determine the role a file name suggests, if any.
///
/// Header tokens are checked before items tokens.
pub fn role_for_name(file_name: &str, config: &LoadConfig) -> Option<TableRole> {
    let name = file_name.to_lowercase();

    if config.header_tokens.iter().any(|t| name.contains(t.as_str())) {
        Some(TableRole::Header)
    } else if config.items_tokens.iter().any(|t| name.contains(t.as_str())) {
        Some(TableRole::Items)
    } else {
        None
    }
}

/// Assign one file to each role.
///
/// When several files match the same role, the last one in walk order
/// replaces the earlier ones.
pub fn classify(
    files: &[ExtractedFile],
    config: &LoadConfig,
) -> Result<Classification, SchemaIdentificationError> {
    let mut header: Option<PathBuf> = None;
    let mut items: Option<PathBuf> = None;

    for file in files {
        let name = file.file_name();
        let slot = match role_for_name(&name, config) {
            Some(TableRole::Header) => &mut header,
            Some(TableRole::Items) => &mut items,
            None => {
                debug!("Ignoring unclassified file: {}", name);
                continue;
            }
        };

        if let Some(previous) = slot.replace(file.path.clone()) {
            warn!(
                "Multiple files match the same table; {} replaces {}",
                file.path.display(),
                previous.display()
            );
        }
    }

    match (header, items) {
        (Some(header), Some(items)) => {
            debug!(
                "Classified header={} items={}",
                header.display(),
                items.display()
            );
            Ok(Classification { header, items })
        }
        (header, items) => {
            let mut missing = Vec::new();
            if header.is_none() {
                missing.push(TableRole::Header.as_str());
            }
            if items.is_none() {
                missing.push(TableRole::Items.as_str());
            }
            Err(SchemaIdentificationError {
                missing,
                candidates: files.iter().map(|f| f.file_name()).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str) -> ExtractedFile {
        ExtractedFile {
            path: PathBuf::from(path),
            extension: "csv".to_string(),
        }
    }

    #[test]
    fn test_role_for_name() {
        let config = LoadConfig::default();
        assert_eq!(
            role_for_name("202401_NFs_Cabecalho.csv", &config),
            Some(TableRole::Header)
        );
        assert_eq!(
            role_for_name("NOTAS_CABEÇALHO.csv", &config),
            Some(TableRole::Header)
        );
        assert_eq!(
            role_for_name("202401_NFs_Itens.csv", &config),
            Some(TableRole::Items)
        );
        assert_eq!(role_for_name("item_list.csv", &config), Some(TableRole::Items));
        assert_eq!(role_for_name("fornecedores.csv", &config), None);
    }

    #[test]
    fn test_decomposed_cedilla_names_header() {
        let config = LoadConfig::default();
        assert_eq!(
            role_for_name("NFs_CABEC\u{327}ALHO.csv", &config),
            Some(TableRole::Header)
        );
        assert_eq!(
            role_for_name("202401_NFs_Cabec\u{327}alho.csv", &config),
            Some(TableRole::Header)
        );
    }

    #[test]
    fn test_header_token_wins_over_items_token() {
        let config = LoadConfig::default();
        assert_eq!(
            role_for_name("cabecalho_dos_itens.csv", &config),
            Some(TableRole::Header)
        );
    }

    #[test]
    fn test_classify_both_roles() {
        let files = vec![
            file("/tmp/x/202401_NFs_Cabecalho.csv"),
            file("/tmp/x/202401_NFs_Itens.csv"),
            file("/tmp/x/outros.csv"),
        ];
        let result = classify(&files, &LoadConfig::default()).unwrap();
        assert_eq!(result.header, PathBuf::from("/tmp/x/202401_NFs_Cabecalho.csv"));
        assert_eq!(result.items, PathBuf::from("/tmp/x/202401_NFs_Itens.csv"));
    }

    #[test]
    fn test_classify_last_match_wins() {
        let files = vec![
            file("/tmp/x/a_cabecalho.csv"),
            file("/tmp/x/b_cabecalho.csv"),
            file("/tmp/x/itens.csv"),
        ];
        let result = classify(&files, &LoadConfig::default()).unwrap();
        assert_eq!(result.header, PathBuf::from("/tmp/x/b_cabecalho.csv"));
    }

    #[test]
    fn test_classify_reports_missing_roles() {
        let err = classify(&[file("/tmp/x/outros.csv")], &LoadConfig::default()).unwrap_err();
        assert_eq!(err.missing, vec!["header", "items"]);
        assert_eq!(err.candidates, vec!["outros.csv"]);
    }
}
