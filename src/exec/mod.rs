//! Process execution for programs under test.

pub mod shell;
