//! Subshell execution with merged stdout/stderr capture.
//!
//! Commands run through `sh -c` with stderr redirected onto the stdout pipe at
//! the descriptor level, so interleaving is preserved. The executor never
//! decides pass/fail; it returns the exit status and optionally prints a
//! clipped diagnostic for non-zero exits.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::report::console::Console;

/// Status reported when the shell itself could not be spawned.
pub const SPAWN_FAILURE_STATUS: i32 = 127;

/// Prefix placed before output that was not valid UTF-8.
pub const UNDECODABLE_MARKER: &str = "[undecodable output]";

/// Echo and diagnostic policy for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip the `-> command` echo line.
    pub suppress_echo: bool,
    /// Print clipped output when the exit status is non-zero.
    pub report_on_failure: bool,
}

impl RunOptions {
    /// Echo the command and report failures.
    pub const LOUD: Self = Self {
        suppress_echo: false,
        report_on_failure: true,
    };

    /// Report failures without echoing.
    pub const QUIET: Self = Self {
        suppress_echo: true,
        report_on_failure: true,
    };

    /// Neither echo nor report.
    pub const SILENT: Self = Self {
        suppress_echo: true,
        report_on_failure: false,
    };
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::LOUD
    }
}

/// A program plus arguments, rendered as a shell-quoted command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
}

impl ShellCommand {
    /// Command running `program` with no arguments.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_string_lossy().into_owned(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Append a path argument, lossily converted to UTF-8.
    #[must_use]
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Append every item of `args`.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    /// Command line as echoed and as handed to `sh -c`.
    #[must_use]
    pub fn render(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(String::as_str)
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Captured merged output of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedOutput {
    /// Valid UTF-8 output.
    Text(String),
    /// Output with invalid UTF-8, decoded lossily.
    Undecodable(String),
}

impl CapturedOutput {
    fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(err) => Self::Undecodable(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }

    /// Text suitable for a diagnostic block.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Undecodable(lossy) => format!("{UNDECODABLE_MARKER}\n{lossy}"),
        }
    }
}

/// Exit status plus captured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, 127 when the shell could not be spawned, 128+N on signal N.
    pub status: i32,
    /// Merged stdout and stderr.
    pub output: CapturedOutput,
}

impl ProcessOutcome {
    /// Exit status 0.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs command lines on behalf of test cases.
pub struct ShellExecutor<'a> {
    console: &'a Console,
}

impl<'a> ShellExecutor<'a> {
    /// Executor echoing through `console`.
    #[must_use]
    pub const fn new(console: &'a Console) -> Self {
        Self { console }
    }

    /// Run `command` and return its exit status.
    pub fn run(&self, command: &str, opts: RunOptions) -> i32 {
        self.capture(command, opts).status
    }

    /// Run a [`ShellCommand`] and return its exit status.
    pub fn run_command(&self, command: &ShellCommand, opts: RunOptions) -> i32 {
        self.run(&command.render(), opts)
    }

    /// Run `command`, returning status and captured output.
    pub fn capture(&self, command: &str, opts: RunOptions) -> ProcessOutcome {
        if !opts.suppress_echo {
            self.console.echo_command(command);
        }

        let outcome = spawn_merged(command);

        if opts.report_on_failure && !outcome.success() {
            self.console.failure(&outcome.output.render());
        }
        outcome
    }
}

fn spawn_merged(command: &str) -> ProcessOutcome {
    let script = format!("exec 2>&1\n{command}");
    match Command::new("sh")
        .arg("-c")
        .arg(&script)
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) => {
            let mut merged = output.stdout;
            merged.extend_from_slice(&output.stderr);
            ProcessOutcome {
                status: exit_code(output.status),
                output: CapturedOutput::from_bytes(merged),
            }
        }
        Err(err) => ProcessOutcome {
            status: SPAWN_FAILURE_STATUS,
            output: CapturedOutput::Text(format!("failed to spawn sh: {err}")),
        },
    }
}

/// Map a process status onto a shell-style integer: the exit code, or
/// 128 + signal number for signal deaths.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Quote `word` for POSIX sh when it contains anything beyond a safe set.
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"_-./=:,+@%".contains(&b));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::run::OutputMode;
    use crate::report::console::{CLIP_MARKER, SharedBuffer};

    fn human() -> (Console, SharedBuffer) {
        let out = SharedBuffer::new();
        (
            Console::with_writers(OutputMode::Human, 20, out.clone(), SharedBuffer::new()),
            out,
        )
    }

    #[test]
    fn zero_exit_is_returned() {
        let (console, _) = human();
        let shell = ShellExecutor::new(&console);
        assert_eq!(shell.run("true", RunOptions::SILENT), 0);
    }

    #[test]
    fn nonzero_exit_is_returned_raw() {
        let (console, _) = human();
        let shell = ShellExecutor::new(&console);
        assert_eq!(shell.run("exit 3", RunOptions::SILENT), 3);
    }

    #[test]
    fn stdout_and_stderr_are_merged_in_order() {
        let (console, _) = human();
        let shell = ShellExecutor::new(&console);
        let outcome = shell.capture("echo one; echo two >&2; echo three", RunOptions::SILENT);
        assert_eq!(
            outcome.output,
            CapturedOutput::Text("one\ntwo\nthree\n".to_string())
        );
    }

    #[test]
    fn failure_output_is_reported_and_clipped() {
        let (console, out) = human();
        let shell = ShellExecutor::new(&console);
        let status = shell.run(
            "i=0; while [ $i -lt 30 ]; do echo line$i; i=$((i+1)); done; exit 1",
            RunOptions::QUIET,
        );
        assert_eq!(status, 1);
        let text = out.contents();
        assert!(text.contains("Test failed:"), "{text}");
        assert!(text.contains("line19"), "{text}");
        assert!(!text.contains("line20"), "{text}");
        assert!(text.contains(CLIP_MARKER), "{text}");
    }

    #[test]
    fn success_output_is_not_reported() {
        let (console, out) = human();
        let shell = ShellExecutor::new(&console);
        shell.run("echo fine", RunOptions::QUIET);
        assert!(out.contents().is_empty());
    }

    #[test]
    fn echo_respects_suppression() {
        let (console, out) = human();
        let shell = ShellExecutor::new(&console);
        shell.run("true", RunOptions::LOUD);
        assert!(out.contents().contains("-> true"));

        let (console, out) = human();
        let shell = ShellExecutor::new(&console);
        shell.run("true", RunOptions::QUIET);
        assert!(out.contents().is_empty());
    }

    #[test]
    fn gibberish_output_keeps_exit_status() {
        let (console, out) = human();
        let shell = ShellExecutor::new(&console);
        let outcome = shell.capture(r"printf '\377\376ok'; exit 4", RunOptions::QUIET);
        assert_eq!(outcome.status, 4);
        assert!(matches!(outcome.output, CapturedOutput::Undecodable(_)));
        assert!(out.contents().contains(UNDECODABLE_MARKER));
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_maps_above_128() {
        let (console, _) = human();
        let shell = ShellExecutor::new(&console);
        assert_eq!(shell.run("kill -9 $$", RunOptions::SILENT), 128 + 9);
    }

    #[test]
    fn quoting_leaves_plain_words_alone() {
        assert_eq!(shell_quote("./block_cat"), "./block_cat");
        assert_eq!(shell_quote("read=17"), "read=17");
        assert_eq!(shell_quote("/tmp/a b"), "'/tmp/a b'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn rendered_command_survives_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with space.txt");
        std::fs::write(&path, b"hi").unwrap();

        let (console, _) = human();
        let shell = ShellExecutor::new(&console);
        let cmd = ShellCommand::new("cat").arg_path(&path);
        let outcome = shell.capture(&cmd.render(), RunOptions::SILENT);
        assert_eq!(outcome.output, CapturedOutput::Text("hi".to_string()));
    }
}
