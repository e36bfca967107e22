//! Suite runner and input integrity guard.
//!
//! Per suite: create fixtures, then for every case truncate the outputs,
//! execute, verify the input against its snapshot and record the verdict.
//! Fixtures are torn down whether or not the cases completed.

use std::fs;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::core::config::FixtureConfig;
use crate::core::errors::{IocError, Result};
use crate::logger::jsonl::{EventLog, EventType, LogEntry, Severity};
use crate::report::console::Console;
use crate::suite::case::{CaseContext, ProgramDir};
use crate::suite::family::{InputSource, NamedCase, Suite, SuiteKind};
use crate::suite::fixtures::{FixtureSet, GuardedInput};

/// Verdict of one case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    /// Case name, unique within its suite.
    pub name: String,
    /// Final verdict: the case's own result and an intact input.
    pub passed: bool,
    /// What the case itself returned.
    pub self_reported: bool,
    /// Whether the input differed from its snapshot after the case.
    pub integrity_violated: bool,
}

/// Ordered verdicts of one suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteOutcome {
    kind: SuiteKind,
    records: Vec<CaseRecord>,
}

impl SuiteOutcome {
    /// Outcome with no records yet.
    #[must_use]
    pub const fn new(kind: SuiteKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    /// Suite the records belong to.
    #[must_use]
    pub const fn kind(&self) -> SuiteKind {
        self.kind
    }

    /// Records in execution order.
    #[must_use]
    pub fn records(&self) -> &[CaseRecord] {
        &self.records
    }

    /// Append the next case's record.
    pub fn push(&mut self, record: CaseRecord) {
        self.records.push(record);
    }

    /// True when every case passed. An empty suite passes.
    #[must_use]
    pub fn verdict(&self) -> bool {
        self.records.iter().all(|r| r.passed)
    }

    /// Number of failed cases.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.records.iter().filter(|r| !r.passed).count()
    }
}

/// Serializes as `{ "<case>": <passed>, ... }` in execution order.
impl Serialize for SuiteOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.name, &record.passed)?;
        }
        map.end()
    }
}

/// Runs suites against the programs in one directory.
pub struct TestRunner<'a> {
    console: &'a Console,
    programs: &'a ProgramDir,
    fixtures: &'a FixtureConfig,
    seed: u64,
}

impl<'a> TestRunner<'a> {
    /// Runner using `fixtures` geometry and `seed` for the random input.
    #[must_use]
    pub const fn new(
        console: &'a Console,
        programs: &'a ProgramDir,
        fixtures: &'a FixtureConfig,
        seed: u64,
    ) -> Self {
        Self {
            console,
            programs,
            fixtures,
            seed,
        }
    }

    /// Run every case of `suite` in order.
    ///
    /// Errors are fatal to the whole run: fixtures could not be created or
    /// removed, or an integrity snapshot became unreadable or was modified.
    /// Case failures are recorded in the outcome instead.
    pub fn run(&self, suite: &Suite, log: &mut EventLog) -> Result<SuiteOutcome> {
        let fixtures = FixtureSet::create(self.fixtures, self.seed)?;

        let mut start = LogEntry::new(EventType::SuiteStart, Severity::Info);
        start.suite = Some(suite.label().to_string());
        start.seed = Some(self.seed);
        start.input_sha256 = Some(fixtures.shared().snapshot_sha256.clone());
        log.record(&start);

        let result = self.run_cases(suite, &fixtures, log);
        let teardown = fixtures.teardown();
        let outcome = result?;
        teardown?;

        let mut done = LogEntry::new(EventType::SuiteComplete, Severity::Info);
        done.suite = Some(suite.label().to_string());
        done.passed = Some(outcome.verdict());
        done.details = Some(format!(
            "{} of {} cases failed",
            outcome.failed_count(),
            outcome.records().len()
        ));
        log.record(&done);
        Ok(outcome)
    }

    fn run_cases(
        &self,
        suite: &Suite,
        fixtures: &FixtureSet,
        log: &mut EventLog,
    ) -> Result<SuiteOutcome> {
        let ctx = CaseContext::new(self.console, self.programs);
        let mut outcome = SuiteOutcome::new(suite.kind());

        for (index, named) in suite.cases().iter().enumerate() {
            fixtures.truncate_outputs()?;
            self.console.case_header(index, named.name());

            let record = match named.input() {
                InputSource::Shared => {
                    self.guarded_execute(&ctx, named, fixtures, fixtures.shared())?
                }
                InputSource::NonAscii => {
                    let guarded = fixtures.create_non_ascii()?;
                    let record = self.guarded_execute(&ctx, named, fixtures, &guarded);
                    fixtures.remove_guarded(&guarded)?;
                    record?
                }
            };

            if record.integrity_violated {
                let mut entry = LogEntry::new(EventType::IntegrityViolation, Severity::Warning);
                entry.suite = Some(suite.label().to_string());
                entry.case = Some(record.name.clone());
                log.record(&entry);
            }
            if record.passed {
                self.console.case_passed();
            }

            let mut entry = LogEntry::new(EventType::CaseComplete, Severity::Info);
            entry.suite = Some(suite.label().to_string());
            entry.case = Some(record.name.clone());
            entry.passed = Some(record.passed);
            log.record(&entry);

            outcome.push(record);
        }
        Ok(outcome)
    }

    fn guarded_execute(
        &self,
        ctx: &CaseContext<'_>,
        named: &NamedCase,
        fixtures: &FixtureSet,
        guarded: &GuardedInput,
    ) -> Result<CaseRecord> {
        let self_reported = named
            .case()
            .execute(ctx, fixtures.case_files(&guarded.input));
        let intact = self.verify_integrity(ctx, guarded)?;

        Ok(CaseRecord {
            name: named.name().to_string(),
            passed: self_reported && intact,
            self_reported,
            integrity_violated: !intact,
        })
    }

    /// Compare the input with its snapshot. A modified, truncated or missing
    /// input is a violation and is restored from the snapshot so later cases
    /// see the original bytes.
    ///
    /// The snapshot itself must still match its recorded digest; a modified
    /// snapshot aborts the run and is never copied over the input.
    fn verify_integrity(&self, ctx: &CaseContext<'_>, guarded: &GuardedInput) -> Result<bool> {
        guarded.verify_snapshot()?;

        let intact = ctx
            .compare
            .identical(&guarded.integrity, &guarded.input, false)
            .unwrap_or(false);
        if intact {
            return Ok(true);
        }

        self.console.integrity_warning();
        fs::copy(&guarded.integrity, &guarded.input).map_err(|e| {
            IocError::IntegrityUnreadable {
                path: guarded.integrity.clone(),
                details: format!("restoring input: {e}"),
            }
        })?;
        Ok(false)
    }
}
