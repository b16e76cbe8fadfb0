//! Table inspection.
//!
//! Derives row counts, column names and previews for display and for
//! prompt construction.

pub mod inspector;

pub use inspector::*;
