//! Top-level CLI definition and dispatch.

use std::path::PathBuf;

use clap::Parser;
use colored::control;
use thiserror::Error;

use io_correctness::core::config::HarnessConfig;
use io_correctness::core::errors::IocError;
use io_correctness::core::run::{OutputMode, RunConfig, SuiteGroup};
use io_correctness::logger::jsonl::{EventLog, EventType, LogEntry, Severity};
use io_correctness::report::console::Console;
use io_correctness::report::summary;
use io_correctness::suite::case::ProgramDir;
use io_correctness::suite::family::{FamilyParams, Suite, suites_for};
use io_correctness::suite::runner::TestRunner;

/// Black-box correctness harness for cached file-I/O libraries.
#[derive(Debug, Parser)]
#[command(
    name = "iocheck",
    author,
    version,
    about = "Correctness tests for a cached file-I/O library",
    long_about = None
)]
pub struct Cli {
    /// Test group to run: `all`, `basic` or `e2e`.
    #[arg(value_name = "GROUP", default_value = "all")]
    group: String,
    /// Seed shared by every seeded case; generated when omitted.
    #[arg(long, value_name = "N")]
    seed: Option<u64>,
    /// Machine-readable output for automated grading.
    #[arg(long)]
    grader: bool,
    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
    /// Override config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Directory holding the programs under test.
    #[arg(long, value_name = "DIR")]
    programs_dir: Option<PathBuf>,
    /// Print the selected cases in execution order and exit.
    #[arg(long)]
    list: bool,
}

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// At least one suite had a failing case.
    #[error("failing suites: {0}")]
    SuitesFailed(String),
    /// Bad group, flag or configuration. Nothing was run.
    #[error("{0}")]
    Usage(String),
    /// Fixture or integrity failure that aborted the run.
    #[error("{0}")]
    Runtime(String),
    /// Result document could not be produced.
    #[error("failed to serialize output: {0}")]
    Output(String),
}

impl CliError {
    /// Process exit code contract for the CLI.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::SuitesFailed(_) => 1,
            Self::Usage(_) => 2,
            Self::Runtime(_) => 3,
            Self::Output(_) => 4,
        }
    }
}

impl From<IocError> for CliError {
    fn from(err: IocError) -> Self {
        if err.is_fatal_to_run() {
            Self::Runtime(err.to_string())
        } else if matches!(err, IocError::Serialization { .. }) {
            Self::Output(err.to_string())
        } else {
            Self::Usage(err.to_string())
        }
    }
}

/// Parse, configure, run the selected suites and report.
pub fn run(cli: &Cli) -> Result<(), CliError> {
    // Group first: an unknown group must fail before any config or fixture work.
    let group: SuiteGroup = cli.group.parse()?;

    let mut config = HarnessConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.programs_dir {
        config.programs.dir.clone_from(dir);
    }

    let mode = if cli.grader {
        OutputMode::Machine
    } else {
        OutputMode::Human
    };
    let run_config = RunConfig::new(cli.seed, group, mode);
    if cli.no_color || run_config.is_machine() {
        control::set_override(false);
    }

    let params = FamilyParams::from_config(&run_config, &config);
    let suites = suites_for(group, &params)?;

    if cli.list {
        print_listing(&suites);
        return Ok(());
    }

    let console = Console::stdio(run_config.mode, config.report.max_lines);
    let mut log = EventLog::from_path(config.logging.jsonl_path.as_deref());
    let result = run_suites(&console, &config, &run_config, &suites, &mut log);

    let mut done = LogEntry::new(EventType::RunComplete, Severity::Info);
    done.seed = Some(run_config.seed);
    done.exit_code = Some(result.as_ref().map_or_else(CliError::exit_code, |_| 0));
    if let Err(err) = &result {
        done.details = Some(err.to_string());
    }
    log.record(&done);
    log.flush();
    result
}

fn run_suites(
    console: &Console,
    config: &HarnessConfig,
    run_config: &RunConfig,
    suites: &[Suite],
    log: &mut EventLog,
) -> Result<(), CliError> {
    let mut start = LogEntry::new(EventType::RunStart, Severity::Info);
    start.seed = Some(run_config.seed);
    start.details = Some(format!("group={}", run_config.group));
    log.record(&start);

    let programs = ProgramDir::new(&config.programs.dir);
    let runner = TestRunner::new(console, &programs, &config.fixtures, run_config.seed);
    summary::run_banner(console, run_config.seed);

    let mut failed = Vec::new();
    for suite in suites {
        summary::suite_banner(console, suite.kind());
        let outcome = runner.run(suite, log).map_err(|err| {
            let mut entry = LogEntry::new(EventType::Error, Severity::Critical);
            entry.suite = Some(suite.label().to_string());
            entry.error_code = Some(err.code().to_string());
            entry.details = Some(err.to_string());
            log.record(&entry);
            CliError::from(err)
        })?;

        summary::render_outcome(console, &outcome)?;
        if !outcome.verdict() {
            summary::remediation_hint(console, suite.kind(), run_config.seed);
            failed.push(suite.label());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::SuitesFailed(failed.join(", ")))
    }
}

fn print_listing(suites: &[Suite]) {
    for suite in suites {
        println!("{}:", suite.label());
        for name in suite.names() {
            println!("  {name}");
        }
    }
}
