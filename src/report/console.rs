//! Mode-aware terminal output shared by the executor, comparator, and runner.
//!
//! Human mode echoes every step with colour. Machine mode stays silent on
//! stdout except for the final result documents, so a grader can parse it.

use std::cell::RefCell;
use std::fmt::Display;
use std::io::{self, Write};
use std::rc::Rc;

use colored::Colorize;

use crate::core::run::OutputMode;

/// Marker appended when captured output exceeds the line budget.
pub const CLIP_MARKER: &str = "[output clipped]";

/// Warning emitted when a program under test mutated its input.
pub const INTEGRITY_WARNING: &str = "oops, your program modified the input file";

/// Output sink for one run.
pub struct Console {
    mode: OutputMode,
    max_lines: usize,
    out: RefCell<Box<dyn Write>>,
    err: RefCell<Box<dyn Write>>,
}

impl Console {
    /// Console writing to the process stdout and stderr.
    #[must_use]
    pub fn stdio(mode: OutputMode, max_lines: usize) -> Self {
        Self::with_writers(mode, max_lines, io::stdout(), io::stderr())
    }

    /// Console writing to caller-supplied sinks.
    #[must_use]
    pub fn with_writers(
        mode: OutputMode,
        max_lines: usize,
        out: impl Write + 'static,
        err: impl Write + 'static,
    ) -> Self {
        Self {
            mode,
            max_lines,
            out: RefCell::new(Box::new(out)),
            err: RefCell::new(Box::new(err)),
        }
    }

    /// Whether progress and summaries go to stdout.
    #[must_use]
    pub const fn is_human(&self) -> bool {
        matches!(self.mode, OutputMode::Human)
    }

    /// Progress line, human mode only.
    pub fn log(&self, msg: impl Display) {
        if self.is_human() {
            self.print(msg);
        }
    }

    /// Unconditional stdout line.
    pub fn print(&self, msg: impl Display) {
        let mut out = self.out.borrow_mut();
        let _ = writeln!(out, "{msg}");
        let _ = out.flush();
    }

    /// Echo a command line before it runs.
    pub fn echo_command(&self, command_line: &str) {
        self.log(format!("-> {command_line}"));
    }

    /// Clipped failure block for captured program output or a comparator
    /// diagnostic. Empty output prints nothing.
    pub fn failure(&self, output: &str) {
        if let Some(block) = format_failure_block(output, self.max_lines) {
            self.log(block.red());
        }
    }

    /// Numbered case header.
    pub fn case_header(&self, index: usize, name: &str) {
        self.log(format!("{}. {name}", index + 1).blue());
    }

    /// Per-case pass line printed right after execution.
    pub fn case_passed(&self) {
        self.log(format!("\t{}", "PASSED!".green()));
    }

    /// Integrity violation warning. Machine mode routes it to stderr so the
    /// stdout document stays parseable.
    pub fn integrity_warning(&self) {
        if self.is_human() {
            self.print(INTEGRITY_WARNING.yellow());
        } else {
            let mut err = self.err.borrow_mut();
            let _ = writeln!(err, "{INTEGRITY_WARNING}");
        }
    }

    /// Highlighted notice, human mode only.
    pub fn warn(&self, msg: impl Display) {
        if self.is_human() {
            self.print(msg.to_string().yellow());
        }
    }
}

/// Split `output` into at most `max_lines` lines, appending [`CLIP_MARKER`]
/// when anything was dropped.
#[must_use]
pub fn clip_lines(output: &str, max_lines: usize) -> Vec<&str> {
    let mut lines: Vec<&str> = output.split('\n').collect();
    if lines.len() > max_lines {
        lines.truncate(max_lines);
        lines.push(CLIP_MARKER);
    }
    lines
}

/// Render the tab-indented `Test failed:` block, or `None` for blank output.
#[must_use]
pub fn format_failure_block(output: &str, max_lines: usize) -> Option<String> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lines = clip_lines(trimmed, max_lines);
    Some(format!("\tTest failed:\n\t{}", lines.join("\n\t")))
}

/// Cloneable in-memory sink, used to capture console output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    /// Empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
