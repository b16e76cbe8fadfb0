//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.nfquery.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".nfquery.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM agent settings.
    #[serde(default)]
    pub agent: AgentSettings,

    /// Loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Display settings.
    #[serde(default)]
    pub display: DisplayConfig,

    /// Session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// LLM agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an OpenAI-compatible API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Questions are disabled when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Embed the full table contents in every prompt.
    #[serde(default = "default_true")]
    pub embed_table_contents: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_url: default_api_url(),
            api_key: None,
            temperature: 0.0,
            timeout_seconds: None,
            embed_table_contents: true,
        }
    }
}

impl AgentSettings {
    /// The API key, if one is set and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_true() -> bool {
    true
}

/// Archive and CSV loading settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Extension of the tabular files inside the archive.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Field delimiter (a single ASCII character).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// File name tokens identifying the header table.
    #[serde(default = "default_header_tokens")]
    pub header_tokens: Vec<String>,

    /// File name tokens identifying the items table.
    #[serde(default = "default_items_tokens")]
    pub items_tokens: Vec<String>,

    /// Column name tokens marking a date column.
    #[serde(default = "default_date_tokens")]
    pub date_tokens: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            delimiter: default_delimiter(),
            header_tokens: default_header_tokens(),
            items_tokens: default_items_tokens(),
            date_tokens: default_date_tokens(),
        }
    }
}

impl LoaderConfig {
    /// The delimiter as a byte. Falls back to a comma for non-ASCII input.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

fn default_extension() -> String {
    "csv".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_header_tokens() -> Vec<String> {
    // Decomposed form covers archives created on macOS.
    vec!["cabecalho", "cabeçalho", "cabec\u{327}alho"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_items_tokens() -> Vec<String> {
    vec!["itens", "item"].into_iter().map(String::from).collect()
}

fn default_date_tokens() -> Vec<String> {
    vec!["data", "date"].into_iter().map(String::from).collect()
}

/// Display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Rows shown in table previews.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_preview_rows() -> usize {
    5
}

/// Session settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Delete the extraction directory when tables are replaced or reset.
    #[serde(default)]
    pub cleanup_scratch: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments (and their env vars) take precedence over config file
    /// settings, but only when explicitly provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.agent.model = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.agent.api_url = api_url.clone();
        }
        if let Some(ref api_key) = args.api_key {
            self.agent.api_key = Some(api_key.clone());
        }
        if let Some(temperature) = args.temperature {
            self.agent.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.agent.timeout_seconds = Some(timeout);
        }
        if args.no_embed {
            self.agent.embed_table_contents = false;
        }

        if let Some(rows) = args.preview_rows {
            self.display.preview_rows = rows;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
