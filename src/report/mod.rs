//! Terminal output for tables and answers.

mod generator;

pub use generator::*;
