//! End-of-suite reporting: banners, per-case listing or machine document,
//! and remediation hints.

use colored::Colorize;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::core::errors::Result;
use crate::report::console::Console;
use crate::suite::family::SuiteKind;
use crate::suite::runner::SuiteOutcome;

/// Seed banner printed once at the start of a human-mode run.
pub fn run_banner(console: &Console, seed: u64) {
    console.warn(format!("RANDOM SEED FOR THIS RUN: {seed}"));
}

/// Header printed before a suite's first case.
pub fn suite_banner(console: &Console, kind: SuiteKind) {
    let lead = match kind {
        SuiteKind::Basic => "",
        SuiteKind::EndToEnd => "\n",
    };
    console.log(format!(
        "{lead}======= ({}) {} TESTS =======",
        kind.ordinal(),
        kind.label()
    ));
}

/// Final result listing for one suite.
///
/// Human mode lists `name: PASSED|FAILED` per case followed by the suite
/// verdict. Machine mode prints only the JSON document.
pub fn render_outcome(console: &Console, outcome: &SuiteOutcome) -> Result<()> {
    console.log("\nYour results follow, indicating if each test passed or failed.");
    console.log(format!(
        "======= SUMMARY:  {} CORRECTNESS TESTS =======",
        outcome.kind().label()
    ));

    if console.is_human() {
        for record in outcome.records() {
            console.print(format!("{}: {}", record.name, status(record.passed)));
        }
        console.print(format!(
            "{}: {} ({} of {} cases failed)",
            outcome.kind().label(),
            status(outcome.verdict()),
            outcome.failed_count(),
            outcome.records().len()
        ));
    } else {
        console.print(machine_document(outcome)?);
    }
    Ok(())
}

fn status(passed: bool) -> colored::ColoredString {
    if passed {
        "PASSED".green().bold()
    } else {
        "FAILED".red().bold()
    }
}

/// The suite's `name -> passed` map as JSON indented by four spaces, cases in
/// execution order.
pub fn machine_document(outcome: &SuiteOutcome) -> Result<String> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    outcome.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Debugging advice after a failed suite, human mode only.
pub fn remediation_hint(console: &Console, kind: SuiteKind, seed: u64) {
    let lines: &[&str] = match kind {
        SuiteKind::Basic => &[
            "\nFor failing basic tests, you should debug with a small sample file to see how your output is different!",
            "For example, try running the ./io300_test command for that test, and use the -i option to specify a test file.",
            "Also, if there is sanitizer output, that's a good place to start.",
        ],
        SuiteKind::EndToEnd => &[
            "\nFor failing end-to-end tests, you should debug with a small sample file to see how your output is different!",
            "For example, try running the command for the test using a small file as the input file.",
            "To see what each test does, look at the code for the test in the `test_programs` directory",
            "Also, if there is sanitizer output, that's a good place to start.",
        ],
    };
    for line in lines {
        console.log(line);
    }
    console.log(format!("Random seed for this test run was: {seed}"));
}
