//! Question dispatch.
//!
//! The dispatcher never fails: a missing agent or a failed call is
//! reported through [`AnswerStatus`] with a displayable message, and the
//! loaded tables are left untouched.

use super::client::{ChatCompletionAgent, TableAgent};
use super::prompt::build_prompt;
use crate::config::AgentSettings;
use crate::models::{Answer, AnswerStatus, InvoiceTables, TableSelection};
use tracing::{debug, error, info, warn};

/// Answer text when no agent is configured.
pub const NOT_INITIALIZED_ANSWER: &str =
    "Agent not initialized: set OPENAI_API_KEY or [agent] api_key to enable questions.";

/// Routes questions to the external agent.
pub struct QueryDispatcher {
    agent: Option<Box<dyn TableAgent>>,
    embed_table_contents: bool,
}

impl QueryDispatcher {
    pub fn new(agent: Option<Box<dyn TableAgent>>, embed_table_contents: bool) -> Self {
        Self {
            agent,
            embed_table_contents,
        }
    }

    /// Build a dispatcher from settings. Without a credential the
    /// dispatcher stays unconfigured.
    pub fn from_settings(settings: &AgentSettings) -> Self {
        let agent: Option<Box<dyn TableAgent>> = match settings.credential() {
            Some(key) => match ChatCompletionAgent::new(settings, key) {
                Ok(agent) => Some(Box::new(agent)),
                Err(e) => {
                    error!("Failed to initialize agent: {}", e);
                    None
                }
            },
            None => {
                warn!("No API key configured; questions are disabled");
                None
            }
        };

        Self::new(agent, settings.embed_table_contents)
    }

    pub fn is_configured(&self) -> bool {
        self.agent.is_some()
    }

    /// Model name of the configured agent.
    pub fn model(&self) -> Option<&str> {
        self.agent.as_deref().map(|a| a.model())
    }

    /// Answer `question` over the tables in `selection`.
    pub async fn answer(
        &self,
        question: &str,
        selection: TableSelection,
        tables: &InvoiceTables,
    ) -> Answer {
        let Some(agent) = self.agent.as_deref() else {
            return Answer::not_initialized(NOT_INITIALIZED_ANSWER);
        };

        let selected = tables.select(selection);
        let prompt = build_prompt(question, &selected, self.embed_table_contents);
        debug!(
            "Dispatching question over {} ({} chars of context)",
            selection,
            prompt.len()
        );

        match agent.ask(&prompt, &selected).await {
            Ok(text) => {
                info!("Agent answered ({} chars)", text.len());
                Answer::answered(text)
            }
            Err(e) => {
                warn!("Agent call failed: {}", e);
                Answer {
                    text: format!("Error while querying the agent: {}", e.message),
                    status: AnswerStatus::AgentFailed {
                        kind: e.kind,
                        message: e.message,
                    },
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::{AgentError, AgentErrorKind};
    use crate::models::Table;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Records prompts and replies with a fixed answer.
    #[derive(Clone, Default)]
    pub struct RecordingAgent {
        pub prompts: Arc<Mutex<Vec<String>>>,
        pub table_names: Arc<Mutex<Vec<Vec<String>>>>,
    }

    #[async_trait]
    impl TableAgent for RecordingAgent {
        async fn ask(&self, prompt: &str, tables: &[&Table]) -> Result<String, AgentError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.table_names
                .lock()
                .unwrap()
                .push(tables.iter().map(|t| t.name.clone()).collect());
            Ok("42 notas".to_string())
        }

        fn model(&self) -> &str {
            "recording"
        }
    }

    /// Fails the first `failures` calls, then answers.
    pub struct FlakyAgent {
        pub failures: Mutex<usize>,
    }

    #[async_trait]
    impl TableAgent for FlakyAgent {
        async fn ask(&self, _prompt: &str, _tables: &[&Table]) -> Result<String, AgentError> {
            let mut left = self.failures.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(AgentError::new(
                    AgentErrorKind::Status,
                    "LLM API error 500: boom",
                ));
            }
            Ok("recovered".to_string())
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }
}
