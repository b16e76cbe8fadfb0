//! LLM agent boundary.
//!
//! Prompt construction, the HTTP chat-completion client and the
//! never-failing question dispatcher.

pub mod client;
pub mod dispatcher;
pub mod prompt;

pub use dispatcher::QueryDispatcher;
