//! ZIP extraction into a scratch directory.
//!
//! The scratch directory is kept after extraction so the loaded files
//! stay inspectable for the whole session. Nothing here deletes it
//! unless [`remove_scratch`] is called explicitly.

use crate::error::ExtractionError;
use crate::models::{ExtractedFile, ExtractedFileSet, UploadedArchive};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Options for extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Extension (without dot) of the files to return.
    pub extension: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            extension: "csv".to_string(),
        }
    }
}

impl From<&crate::config::LoaderConfig> for ExtractConfig {
    fn from(config: &crate::config::LoaderConfig) -> Self {
        Self {
            extension: config.extension.clone(),
        }
    }
}

/// Extract `archive` into a fresh scratch directory.
///
/// No limit is placed on entry count or decompressed size.
pub fn extract(
    archive: &UploadedArchive,
    config: &ExtractConfig,
) -> Result<ExtractedFileSet, ExtractionError> {
    info!(
        "Extracting archive: {} ({} bytes)",
        archive.name,
        archive.bytes.len()
    );

    let scratch_err = |source: std::io::Error| ExtractionError::Scratch {
        name: archive.name.clone(),
        source,
    };

    // Stage the payload on disk; the staging file is removed on drop.
    let mut staged = NamedTempFile::new().map_err(scratch_err)?;
    staged.write_all(&archive.bytes).map_err(scratch_err)?;
    staged.flush().map_err(scratch_err)?;
    let file = staged.reopen().map_err(scratch_err)?;

    let mut zip = ZipArchive::new(file).map_err(|source| ExtractionError::InvalidArchive {
        name: archive.name.clone(),
        source,
    })?;
    debug!("Archive has {} entries", zip.len());

    let scratch = tempfile::Builder::new()
        .prefix("nfquery-")
        .tempdir()
        .map_err(scratch_err)?;

    zip.extract(scratch.path())
        .map_err(|source| ExtractionError::InvalidArchive {
            name: archive.name.clone(),
            source,
        })?;

    // Persist the scratch directory beyond this call.
    let root = scratch.keep();
    debug!("Extracted to: {}", root.display());

    let files = scan_tabular_files(&root, &config.extension)?;
    info!("Found {} .{} file(s)", files.len(), config.extension);

    Ok(ExtractedFileSet { root, files })
}

/// Recursively list regular files under `root` whose extension is `extension`.
fn scan_tabular_files(root: &Path, extension: &str) -> Result<Vec<ExtractedFile>, ExtractionError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| ExtractionError::Walk {
            root: root.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if ext != extension {
            continue;
        }

        debug!("Tabular file: {}", path.display());
        files.push(ExtractedFile {
            path: path.to_path_buf(),
            extension: ext.to_string(),
        });
    }

    Ok(files)
}

/// Delete a scratch directory created by [`extract`].
pub fn remove_scratch(set: &ExtractedFileSet) {
    match std::fs::remove_dir_all(&set.root) {
        Ok(()) => debug!("Removed scratch directory: {}", set.root.display()),
        Err(e) => warn!(
            "Failed to remove scratch directory {}: {}",
            set.root.display(),
            e
        ),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    /// Build an in-memory ZIP from `(entry name, contents)` pairs.
    pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options =
                SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, content) in entries {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::zip_bytes;
    use super::*;

    #[test]
    fn test_extract_lists_csv_files_recursively() {
        let bytes = zip_bytes(&[
            ("202401_NFs_Cabecalho.csv", "fornecedor\nACME\n"),
            ("nested/dir/202401_NFs_Itens.csv", "item\nparafuso\n"),
            ("readme.txt", "ignore me"),
        ]);
        let archive = UploadedArchive::new("202401_NFs.zip", bytes);

        let set = extract(&archive, &ExtractConfig::default()).unwrap();
        let names: Vec<String> = set.files.iter().map(|f| f.file_name()).collect();

        assert_eq!(names.len(), 2);
        assert!(names.contains(&"202401_NFs_Cabecalho.csv".to_string()));
        assert!(names.contains(&"202401_NFs_Itens.csv".to_string()));
        assert!(set.files.iter().all(|f| f.extension == "csv"));
        assert!(set.files.iter().all(|f| f.path.starts_with(&set.root)));

        remove_scratch(&set);
        assert!(!set.root.exists());
    }

    #[test]
    fn test_extract_keeps_scratch_directory() {
        let bytes = zip_bytes(&[("a.csv", "x\n1\n")]);
        let set = extract(&UploadedArchive::new("a.zip", bytes), &ExtractConfig::default())
            .unwrap();

        assert!(set.root.is_dir());
        assert!(set.files[0].path.is_file());

        remove_scratch(&set);
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let bytes = zip_bytes(&[("upper.CSV", "x\n1\n"), ("lower.csv", "x\n1\n")]);
        let set = extract(&UploadedArchive::new("a.zip", bytes), &ExtractConfig::default())
            .unwrap();

        assert_eq!(set.files.len(), 1);
        assert_eq!(set.files[0].file_name(), "lower.csv");

        remove_scratch(&set);
    }

    #[test]
    fn test_extract_rejects_non_zip_payload() {
        let archive = UploadedArchive::new("notes.zip", b"definitely not a zip".to_vec());
        let err = extract(&archive, &ExtractConfig::default()).unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidArchive { .. }));
        assert!(err.to_string().contains("notes.zip"));
    }

    #[test]
    fn test_extract_empty_archive_yields_no_files() {
        let bytes = zip_bytes(&[]);
        let set = extract(&UploadedArchive::new("empty.zip", bytes), &ExtractConfig::default())
            .unwrap();
        assert!(set.files.is_empty());
        remove_scratch(&set);
    }
}
