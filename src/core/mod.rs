//! Core types: errors, configuration, per-run settings.

pub mod config;
pub mod errors;
pub mod run;
