//! Interactive session commands.

use crate::models::TableSelection;
use std::path::PathBuf;

/// Help text printed by `:help`.
pub const HELP: &str = "Commands:
  :load <zip>                  load another archive (replaces the current tables)
  :table <header|items|both>   choose the table(s) questions are asked against
  :preview                     show table summaries and the first rows
  :schema                      show table summaries
  :reset                       drop the loaded tables
  :help                        show this help
  :quit                        exit
Any other line is sent to the agent as a question.";

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Table(TableSelection),
    Preview,
    Schema,
    Reset,
    Help,
    Quit,
    Ask(String),
}

impl Command {
    /// Parse a non-empty, trimmed input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Ask(line.to_string()));
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name {
            "load" | "l" => {
                if arg.is_empty() {
                    Err("Usage: :load <zip>".to_string())
                } else {
                    Ok(Command::Load(PathBuf::from(arg)))
                }
            }
            "table" | "t" => arg.parse().map(Command::Table),
            "preview" | "p" => Ok(Command::Preview),
            "schema" | "s" => Ok(Command::Schema),
            "reset" => Ok(Command::Reset),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(format!("Unknown command ':{}'. Type :help for commands.", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_a_question() {
        assert_eq!(
            Command::parse("Qual fornecedor vendeu mais?"),
            Ok(Command::Ask("Qual fornecedor vendeu mais?".to_string()))
        );
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(":load data/202402_NFs.zip"),
            Ok(Command::Load(PathBuf::from("data/202402_NFs.zip")))
        );
        assert_eq!(
            Command::parse(":table itens"),
            Ok(Command::Table(TableSelection::Items))
        );
        assert_eq!(Command::parse(":preview"), Ok(Command::Preview));
        assert_eq!(Command::parse(":schema"), Ok(Command::Schema));
        assert_eq!(Command::parse(":reset"), Ok(Command::Reset));
        assert_eq!(Command::parse(":q"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(":load").is_err());
        assert!(Command::parse(":table everything").is_err());
        assert!(Command::parse(":frobnicate").unwrap_err().contains(":help"));
    }
}
