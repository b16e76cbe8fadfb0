//! Archive extraction.
//!
//! Unpacks an uploaded ZIP into a scratch directory and lists the
//! tabular files it contains.

pub mod extractor;

pub use extractor::{extract, remove_scratch, ExtractConfig};
