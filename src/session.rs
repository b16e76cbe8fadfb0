//! Session state.
//!
//! A session owns the loaded tables and the dispatcher. Tables are only
//! visible once both have loaded; any pipeline failure leaves the
//! session empty.

use crate::agent::QueryDispatcher;
use crate::analysis;
use crate::archive::{self, ExtractConfig};
use crate::config::Config;
use crate::error::PipelineError;
use crate::loader::{self, LoadConfig};
use crate::models::{
    Answer, ExtractedFileSet, InvoiceTables, TableSelection, TableSummary, UploadedArchive,
};
use std::fmt;
use tracing::{debug, info, warn};

/// Answer text when a question arrives before any archive is loaded.
pub const NO_TABLES_ANSWER: &str = "No tables loaded: upload an archive first.";

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    Extracting,
    Loading,
    Ready,
    Answering,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Empty => write!(f, "empty"),
            Phase::Extracting => write!(f, "extracting"),
            Phase::Loading => write!(f, "loading"),
            Phase::Ready => write!(f, "ready"),
            Phase::Answering => write!(f, "answering"),
        }
    }
}

/// One user's tables and agent.
pub struct Session {
    phase: Phase,
    tables: Option<InvoiceTables>,
    scratch: Option<ExtractedFileSet>,
    dispatcher: QueryDispatcher,
    extract_config: ExtractConfig,
    load_config: LoadConfig,
    cleanup_scratch: bool,
}

impl Session {
    pub fn new(config: &Config, dispatcher: QueryDispatcher) -> Self {
        Self {
            phase: Phase::Empty,
            tables: None,
            scratch: None,
            dispatcher,
            extract_config: ExtractConfig::from(&config.loader),
            load_config: LoadConfig::from(&config.loader),
            cleanup_scratch: config.session.cleanup_scratch,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tables(&self) -> Option<&InvoiceTables> {
        self.tables.as_ref()
    }

    pub fn dispatcher(&self) -> &QueryDispatcher {
        &self.dispatcher
    }

    fn transition(&mut self, next: Phase) {
        debug!("Session {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Extract and load `archive`, replacing any previous tables.
    pub fn upload(&mut self, archive: &UploadedArchive) -> Result<&InvoiceTables, PipelineError> {
        self.reset();

        self.transition(Phase::Extracting);
        let files = match archive::extract(archive, &self.extract_config) {
            Ok(files) => files,
            Err(e) => {
                self.transition(Phase::Empty);
                return Err(e.into());
            }
        };

        self.transition(Phase::Loading);
        let tables = match loader::load(&files, &self.load_config) {
            Ok(tables) => tables,
            Err(e) => {
                if self.cleanup_scratch {
                    archive::remove_scratch(&files);
                }
                self.transition(Phase::Empty);
                return Err(e.into());
            }
        };

        info!("Session ready with tables from {}", archive.name);
        self.scratch = Some(files);
        self.transition(Phase::Ready);
        Ok(self.tables.insert(tables))
    }

    /// Ask `question` over `selection`. Never fails.
    pub async fn ask(&mut self, question: &str, selection: TableSelection) -> Answer {
        if self.tables.is_none() {
            warn!("Question asked with no tables loaded");
            return Answer::not_initialized(NO_TABLES_ANSWER);
        }

        self.transition(Phase::Answering);
        let answer = match self.tables.as_ref() {
            Some(tables) => self.dispatcher.answer(question, selection, tables).await,
            None => Answer::not_initialized(NO_TABLES_ANSWER),
        };
        self.transition(Phase::Ready);

        answer
    }

    /// Drop the loaded tables and return to the empty phase.
    pub fn reset(&mut self) {
        self.tables = None;
        if let Some(files) = self.scratch.take() {
            if self.cleanup_scratch {
                archive::remove_scratch(&files);
            } else {
                debug!("Keeping scratch directory: {}", files.root.display());
            }
        }
        if self.phase != Phase::Empty {
            self.transition(Phase::Empty);
        }
    }

    /// Summaries of the loaded tables; empty when nothing is loaded.
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.tables
            .as_ref()
            .map(analysis::describe_all)
            .unwrap_or_default()
    }
}
