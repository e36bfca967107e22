#![forbid(unsafe_code)]

//! io_correctness: a black-box correctness harness for cached file-I/O
//! libraries.
//!
//! The harness drives small programs linked against the library under test
//! (`io300_test`, `byte_cat`, `block_cat`, `reverse_*`, `rot13`, ...) through a
//! shell, compares the files they produce, and guards the read-only input
//! against mutation after every case.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use io_correctness::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use io_correctness::core::config::HarnessConfig;
//! use io_correctness::suite::family::{FamilyParams, basic_suite};
//! ```

pub mod prelude;

pub mod compare;
pub mod core;
pub mod exec;
pub mod logger;
pub mod report;
pub mod suite;
