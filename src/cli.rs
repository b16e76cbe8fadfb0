//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::TableSelection;
use clap::Parser;
use std::path::PathBuf;

/// nfquery - ask questions about invoice CSV archives
///
/// Loads a ZIP holding an invoice header CSV ("cabeçalho") and an
/// invoice items CSV ("itens"), then answers natural-language questions
/// about them with an LLM.
///
/// Examples:
///   nfquery 202401_NFs.zip --describe
///   nfquery 202401_NFs.zip -q "Which supplier had the highest total?"
///   nfquery 202401_NFs.zip --table items -q "What item sold the most units?"
///   nfquery 202401_NFs.zip            (interactive session)
///   nfquery --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// ZIP archive with the header and items CSV files
    #[arg(value_name = "ARCHIVE", required_unless_present = "init_config")]
    pub archive: Option<PathBuf>,

    /// Ask a single question and exit
    ///
    /// Without this flag (and without --describe) an interactive session starts.
    #[arg(short = 'q', long, value_name = "TEXT")]
    pub question: Option<String>,

    /// Table(s) the question is asked against
    #[arg(short, long, default_value = "header", value_name = "TABLE")]
    pub table: TableSelection,

    /// Model to use for answering
    #[arg(short, long, env = "NFQUERY_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, value_name = "URL", env = "NFQUERY_API_URL")]
    pub api_url: Option<String>,

    /// API key for the LLM provider
    #[arg(long, value_name = "KEY", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Request timeout in seconds (default: wait indefinitely)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Send only column names, not full table contents
    #[arg(long)]
    pub no_embed: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .nfquery.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Number of rows shown in table previews
    #[arg(long, value_name = "ROWS")]
    pub preview_rows: Option<usize>,

    /// Load the archive, print table schemas and previews, and exit
    #[arg(long, conflicts_with = "question")]
    pub describe: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(long)]
    pub quiet: bool,

    /// Generate a default .nfquery.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for summaries and answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.archive {
            Some(ref path) if !path.is_file() => {
                return Err(format!("Archive not found: {}", path.display()));
            }
            None => return Err("An archive path is required".to_string()),
            _ => {}
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref question) = self.question {
            if question.trim().is_empty() {
                return Err("Question must not be empty".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The archive path (validated to be present unless --init-config).
    pub fn archive_path(&self) -> PathBuf {
        self.archive.clone().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn make_args(archive: PathBuf) -> Args {
        Args {
            archive: Some(archive),
            question: None,
            table: TableSelection::Header,
            model: None,
            api_url: None,
            api_key: None,
            temperature: None,
            timeout: None,
            no_embed: false,
            config: None,
            format: OutputFormat::Text,
            preview_rows: None,
            describe: false,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_ok() {
        let file = NamedTempFile::new().unwrap();
        let args = make_args(file.path().to_path_buf());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_archive() {
        let args = make_args(PathBuf::from("/definitely/not/here.zip"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.api_url = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_skipped_for_init_config() {
        let mut args = make_args(PathBuf::from("/nope.zip"));
        args.archive = None;
        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_parse_table_selection() {
        let args = Args::try_parse_from(["nfquery", "a.zip", "--table", "both", "-q", "total?"])
            .unwrap();
        assert_eq!(args.table, TableSelection::Both);
        assert_eq!(args.question.as_deref(), Some("total?"));
    }

    #[test]
    fn test_log_level() {
        let file = NamedTempFile::new().unwrap();
        let mut args = make_args(file.path().to_path_buf());
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
