//! Terminal output and result reporting.

pub mod console;
pub mod summary;
