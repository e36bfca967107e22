//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use io_correctness::prelude::*;
//! ```

// Core
pub use crate::core::config::HarnessConfig;
pub use crate::core::errors::{IocError, Result};
pub use crate::core::run::{OutputMode, RunConfig, SuiteGroup};

// Execution
pub use crate::compare::FileComparator;
pub use crate::exec::shell::{ProcessOutcome, RunOptions, ShellCommand, ShellExecutor};

// Suites
pub use crate::suite::case::{CaseContext, ProgramDir, TestCase};
pub use crate::suite::family::{FamilyParams, InputSource, Suite, SuiteKind, suites_for};
pub use crate::suite::fixtures::{CaseFiles, FixtureSet};
pub use crate::suite::runner::{CaseRecord, SuiteOutcome, TestRunner};

// Reporting
pub use crate::logger::jsonl::EventLog;
pub use crate::report::console::Console;
