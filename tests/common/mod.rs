#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_iocheck") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "iocheck.exe" } else { "iocheck" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve iocheck binary path for integration test"),
    }
}

/// Run the binary with `args` and extra environment, logging the exchange.
pub fn run_cli_case(case_name: &str, args: &[&str], env: &[(String, String)]) -> CmdResult {
    let root = std::env::temp_dir().join("iocheck-test-logs");
    fs::create_dir_all(&root).expect("create temp test log dir");

    let log_path = root.join(format!("{}-{}.log", sanitize(case_name), now_millis()));
    let bin_path = resolve_bin_path();

    let mut command = Command::new(&bin_path);
    command.args(args).env("RUST_BACKTRACE", "1");
    for (key, value) in env {
        command.env(key, value);
    }
    let output = command.output().expect("execute iocheck command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}

/// Scratch layout for one integration test: a programs dir of shell-script
/// stand-ins and an empty fixture scratch dir.
pub struct Workspace {
    root: tempfile::TempDir,
    pub programs: PathBuf,
    pub scratch: PathBuf,
}

impl Workspace {
    /// Well-behaved stand-ins for every collaborator program.
    pub fn well_behaved() -> Self {
        let root = tempfile::tempdir().expect("create workspace");
        let programs = root.path().join("programs");
        let scratch = root.path().join("scratch");
        fs::create_dir_all(&programs).expect("create programs dir");
        fs::create_dir_all(&scratch).expect("create scratch dir");

        let ws = Self {
            root,
            programs,
            scratch,
        };
        ws.program("io300_test", "exit 0");
        ws.program("byte_cat", r#"cat "$1" > "$2""#);
        ws.program("reverse_byte_cat", r#"cat "$1" > "$2""#);
        ws.program("random_block_cat", r#"cat "$1" > "$2""#);
        ws.program("block_cat", r#"cat "$2" > "$3""#);
        ws.program("reverse_block_cat", r#"dd if="$2" of="$3" conv=swab 2>/dev/null"#);
        ws.program(
            "rot13",
            r#"LC_ALL=C tr 'A-Za-z' 'N-ZA-Mn-za-m' < "$1" > "$1.tmp" && mv "$1.tmp" "$1""#,
        );
        ws
    }

    /// Replace (or add) one program with a script body.
    pub fn program(&self, name: &str, body: &str) {
        #[cfg(unix)]
        use std::os::unix::fs::PermissionsExt;

        let path = self.programs.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake program");
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&path).expect("stat fake program").permissions();
            perms.set_mode(0o755);
            fs::set_permissions(&path, perms).expect("chmod fake program");
        }
    }

    /// Environment pointing the harness at this workspace.
    pub fn env(&self) -> Vec<(String, String)> {
        vec![
            (
                "IOC_PROGRAMS_DIR".to_string(),
                self.programs.display().to_string(),
            ),
            (
                "IOC_SCRATCH_DIR".to_string(),
                self.scratch.display().to_string(),
            ),
        ]
    }

    /// A path inside the workspace, outside both the programs and scratch dirs.
    pub fn path(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    /// Whether the scratch dir is empty.
    pub fn scratch_is_empty(&self) -> bool {
        fs::read_dir(&self.scratch)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

/// Parse a stream of concatenated JSON documents.
pub fn json_documents(stdout: &str) -> Vec<serde_json::Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<serde_json::Value>()
        .map(|doc| doc.expect("valid JSON document"))
        .collect()
}
