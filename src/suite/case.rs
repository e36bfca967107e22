//! Test cases: one immutable struct per behavioural scenario.
//!
//! A case drives one or more programs under test through the shell and
//! decides pass/fail from exit statuses and file comparisons. Cases never own
//! fixtures; they receive paths through [`CaseFiles`].

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::compare::FileComparator;
use crate::exec::shell::{RunOptions, ShellCommand, ShellExecutor};
use crate::report::console::Console;
use crate::suite::fixtures::CaseFiles;

/// Names of the collaborator programs.
pub mod programs {
    pub const UNIT_VERIFIER: &str = "io300_test";
    pub const BYTE_CAT: &str = "byte_cat";
    pub const DIABOLICAL_BYTE_CAT: &str = "diabolical_byte_cat";
    pub const REVERSE_BYTE_CAT: &str = "reverse_byte_cat";
    pub const BLOCK_CAT: &str = "block_cat";
    pub const REVERSE_BLOCK_CAT: &str = "reverse_block_cat";
    pub const RANDOM_BLOCK_CAT: &str = "random_block_cat";
    pub const ROT13: &str = "rot13";
}

/// Resolves collaborator program names against their directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDir {
    dir: PathBuf,
}

impl ProgramDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self, program: &str) -> PathBuf {
        self.dir.join(program)
    }

    #[must_use]
    pub fn command(&self, program: &str) -> ShellCommand {
        ShellCommand::new(self.path(program))
    }
}

/// Everything a case may use besides its files.
pub struct CaseContext<'a> {
    pub console: &'a Console,
    pub shell: ShellExecutor<'a>,
    pub compare: FileComparator<'a>,
    pub programs: &'a ProgramDir,
}

impl<'a> CaseContext<'a> {
    #[must_use]
    pub const fn new(console: &'a Console, programs: &'a ProgramDir) -> Self {
        Self {
            console,
            shell: ShellExecutor::new(console),
            compare: FileComparator::new(console),
            programs,
        }
    }

    /// Run a command with echo and failure reporting; true on exit 0.
    pub fn run_ok(&self, command: &ShellCommand) -> bool {
        self.shell.run_command(command, RunOptions::LOUD) == 0
    }

    /// True when the files match; mismatches and unreadable files are reported.
    pub fn expect_identical(&self, expected: &Path, actual: &Path) -> bool {
        self.compare
            .identical(expected, actual, true)
            .unwrap_or_else(|err| {
                self.console.failure(&err.to_string());
                false
            })
    }

    /// True when the files differ; otherwise prints `unchanged_note`.
    /// Unreadable files are reported and count as failure.
    pub fn expect_changed(&self, original: &Path, transformed: &Path, unchanged_note: &str) -> bool {
        match self.compare.identical(original, transformed, false) {
            Ok(false) => true,
            Ok(true) => {
                self.console.failure(unchanged_note);
                false
            }
            Err(err) => {
                self.console.failure(&err.to_string());
                false
            }
        }
    }
}

/// One behavioural scenario.
pub trait TestCase {
    /// Drive the programs under test and report whether the contract held.
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool;
}

/// Parameters handed to the unit-style verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitParams {
    pub file_size: u64,
    pub max_file_size: u64,
    pub num_ops: u64,
}

impl Default for UnitParams {
    fn default() -> Self {
        Self {
            file_size: 4096,
            max_file_size: 8192,
            num_ops: 8192,
        }
    }
}

/// Delegates to `io300_test`; its exit status is the verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitCase {
    operations: Vec<String>,
    seed: u64,
    params: UnitParams,
}

impl UnitCase {
    /// `operations` is a whitespace-separated token list such as
    /// `"readc writec"` or `"read=17"`.
    pub fn new(operations: &str, seed: u64, params: UnitParams) -> Self {
        Self {
            operations: operations.split_whitespace().map(str::to_string).collect(),
            seed,
            params,
        }
    }

    /// Verifier invocation for this case.
    #[must_use]
    pub fn command(&self, dir: &ProgramDir) -> ShellCommand {
        dir.command(programs::UNIT_VERIFIER)
            .args(&self.operations)
            .arg("--seed")
            .arg(self.seed)
            .arg("-n")
            .arg(self.params.num_ops)
            .arg("--file-size")
            .arg(self.params.file_size)
            .arg("--max-size")
            .arg(self.params.max_file_size)
    }
}

impl TestCase for UnitCase {
    fn execute(&self, ctx: &CaseContext<'_>, _files: CaseFiles<'_>) -> bool {
        ctx.run_ok(&self.command(ctx.programs))
    }
}

/// Straight copy through `program input output`.
fn straight_copy(ctx: &CaseContext<'_>, program: &str, files: CaseFiles<'_>) -> bool {
    let copy = ctx
        .programs
        .command(program)
        .arg_path(files.input)
        .arg_path(files.output);
    ctx.run_ok(&copy) && ctx.expect_identical(files.input, files.output)
}

/// Byte-at-a-time copy must reproduce the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCat;

impl TestCase for ByteCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        straight_copy(ctx, programs::BYTE_CAT, files)
    }
}

/// Adversarial byte copy. Defined but kept out of the active suite.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiabolicalByteCat;

impl TestCase for DiabolicalByteCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        straight_copy(ctx, programs::DIABOLICAL_BYTE_CAT, files)
    }
}

/// Random-block-size copy must reproduce the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBlockCat;

impl TestCase for RandomBlockCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        straight_copy(ctx, programs::RANDOM_BLOCK_CAT, files)
    }
}

/// Byte reversal applied twice must restore the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReverseByteCat;

impl TestCase for ReverseByteCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        let first = ctx
            .programs
            .command(programs::REVERSE_BYTE_CAT)
            .arg_path(files.input)
            .arg_path(files.output);
        let second = ctx
            .programs
            .command(programs::REVERSE_BYTE_CAT)
            .arg_path(files.output)
            .arg_path(files.output2);
        ctx.run_ok(&first) && ctx.run_ok(&second) && ctx.expect_identical(files.input, files.output2)
    }
}

/// Fixed-block-size copy must reproduce the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCat {
    pub block_size: u64,
}

impl TestCase for BlockCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        let copy = ctx
            .programs
            .command(programs::BLOCK_CAT)
            .arg(self.block_size)
            .arg_path(files.input)
            .arg_path(files.output);
        ctx.run_ok(&copy) && ctx.expect_identical(files.input, files.output)
    }
}

/// Block-order reversal: one pass must change the file whenever a block is
/// smaller than the file, two passes must restore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReverseBlockCat {
    pub block_size: u64,
}

impl TestCase for ReverseBlockCat {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        let first = ctx
            .programs
            .command(programs::REVERSE_BLOCK_CAT)
            .arg(self.block_size)
            .arg_path(files.input)
            .arg_path(files.output);
        if !ctx.run_ok(&first) {
            return false;
        }

        let input_len = match fs::metadata(files.input) {
            Ok(meta) => meta.len(),
            Err(err) => {
                ctx.console
                    .failure(&format!("cannot stat {}: {err}", files.input.display()));
                return false;
            }
        };
        if self.block_size < input_len
            && !ctx.expect_changed(
                files.input,
                files.output,
                "File has not changed after one reversal",
            )
        {
            return false;
        }

        let second = ctx
            .programs
            .command(programs::REVERSE_BLOCK_CAT)
            .arg(self.block_size)
            .arg_path(files.output)
            .arg_path(files.output2);
        ctx.run_ok(&second) && ctx.expect_identical(files.input, files.output2)
    }
}

/// In-place rot13: one pass must change the file, two must restore it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rot13;

impl TestCase for Rot13 {
    fn execute(&self, ctx: &CaseContext<'_>, files: CaseFiles<'_>) -> bool {
        if let Err(err) = fs::copy(files.input, files.output) {
            ctx.console.failure(&format!(
                "cannot copy {} to {}: {err}",
                files.input.display(),
                files.output.display()
            ));
            return false;
        }

        let rotate = ctx.programs.command(programs::ROT13).arg_path(files.output);
        if !ctx.run_ok(&rotate) {
            return false;
        }
        if !ctx.expect_changed(
            files.input,
            files.output,
            "File has not changed after one rotation",
        ) {
            return false;
        }

        ctx.run_ok(&rotate) && ctx.expect_identical(files.input, files.output)
    }
}
