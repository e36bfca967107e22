//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{IocError, Result};

/// File name looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "iocheck.toml";

/// Full harness configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct HarnessConfig {
    pub programs: ProgramsConfig,
    pub fixtures: FixtureConfig,
    pub unit: UnitConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

/// Where the programs under test live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProgramsConfig {
    /// Directory holding `io300_test`, `byte_cat`, `block_cat`, ...
    pub dir: PathBuf,
}

/// Shared fixture geometry and location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixtureConfig {
    /// Parent directory for the per-run fixture directory.
    pub scratch_dir: PathBuf,
    /// Generation unit for the random input file.
    pub block_size: u64,
    /// Number of generation units in the random input file.
    pub block_count: u64,
}

/// Defaults handed to the unit-style verifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UnitConfig {
    pub file_size: u64,
    pub max_file_size: u64,
    pub num_ops: u64,
}

/// Human report knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportConfig {
    /// Lines of captured output shown before `[output clipped]`.
    pub max_lines: usize,
}

/// Structured event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// JSONL event log path; `None` disables the log.
    pub jsonl_path: Option<PathBuf>,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            scratch_dir: env::temp_dir(),
            block_size: 4096,
            block_count: 20,
        }
    }
}

impl FixtureConfig {
    /// Total byte length of the generated input fixture.
    #[must_use]
    pub const fn input_len(&self) -> u64 {
        self.block_size.saturating_mul(self.block_count)
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self {
            file_size: 4096,
            max_file_size: 8192,
            num_ops: 8192,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { max_lines: 20 }
    }
}

impl HarnessConfig {
    /// Default configuration path (relative to the working directory).
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| IocError::Io {
                path: path_buf.clone(),
                source,
            })?;
            toml::from_str::<Self>(&raw)?
        } else if path.is_some() {
            return Err(IocError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(env_var)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("IOC_PROGRAMS_DIR") {
            self.programs.dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("IOC_SCRATCH_DIR") {
            self.fixtures.scratch_dir = PathBuf::from(raw);
        }
        if let Some(raw) = lookup("IOC_FIXTURE_BLOCK_SIZE") {
            self.fixtures.block_size = parse_env_u64("IOC_FIXTURE_BLOCK_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("IOC_FIXTURE_BLOCK_COUNT") {
            self.fixtures.block_count = parse_env_u64("IOC_FIXTURE_BLOCK_COUNT", &raw)?;
        }
        if let Some(raw) = lookup("IOC_UNIT_FILE_SIZE") {
            self.unit.file_size = parse_env_u64("IOC_UNIT_FILE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("IOC_UNIT_MAX_FILE_SIZE") {
            self.unit.max_file_size = parse_env_u64("IOC_UNIT_MAX_FILE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("IOC_UNIT_NUM_OPS") {
            self.unit.num_ops = parse_env_u64("IOC_UNIT_NUM_OPS", &raw)?;
        }
        if let Some(raw) = lookup("IOC_MAX_LINES") {
            self.report.max_lines = parse_env_usize("IOC_MAX_LINES", &raw)?;
        }
        if let Some(raw) = lookup("IOC_JSONL_LOG") {
            self.logging.jsonl_path = Some(PathBuf::from(raw));
        }
        Ok(())
    }

    /// Reject configurations under which no case could be evaluated.
    pub fn validate(&self) -> Result<()> {
        for (name, val) in [
            ("fixtures.block_size", self.fixtures.block_size),
            ("fixtures.block_count", self.fixtures.block_count),
            ("unit.num_ops", self.unit.num_ops),
        ] {
            if val == 0 {
                return Err(IocError::InvalidConfig {
                    details: format!("{name} must be > 0"),
                });
            }
        }

        if self.report.max_lines == 0 {
            return Err(IocError::InvalidConfig {
                details: "report.max_lines must be > 0".to_string(),
            });
        }

        if self.unit.max_file_size < self.unit.file_size {
            return Err(IocError::InvalidConfig {
                details: format!(
                    "unit.max_file_size ({}) must be >= unit.file_size ({})",
                    self.unit.max_file_size, self.unit.file_size
                ),
            });
        }

        if self.fixtures.scratch_dir.as_os_str().is_empty() {
            return Err(IocError::InvalidConfig {
                details: "fixtures.scratch_dir must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_env_u64(name: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|error| IocError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

fn parse_env_usize(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|error| IocError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })
}

#[cfg(test)]
mod tests {
    use super::{HarnessConfig, IocError};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let cfg = HarnessConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.fixtures.input_len(), 20 * 4096);
        assert_eq!(cfg.report.max_lines, 20);
    }

    #[test]
    fn zero_block_count_rejected() {
        let mut cfg = HarnessConfig::default();
        cfg.fixtures.block_count = 0;
        let err = cfg.validate().expect_err("expected invalid block count");
        match err {
            IocError::InvalidConfig { details } => {
                assert!(details.contains("block_count"), "{details}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_max_lines_rejected() {
        let mut cfg = HarnessConfig::default();
        cfg.report.max_lines = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unit_max_size_below_file_size_rejected() {
        let mut cfg = HarnessConfig::default();
        cfg.unit.file_size = 9000;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_file_size"));
    }

    #[test]
    fn env_overrides_replace_defaults() {
        let env = vars(&[
            ("IOC_PROGRAMS_DIR", "/opt/io300"),
            ("IOC_FIXTURE_BLOCK_COUNT", "3"),
            ("IOC_MAX_LINES", "5"),
            ("IOC_JSONL_LOG", "/tmp/ioc.jsonl"),
        ]);
        let mut cfg = HarnessConfig::default();
        cfg.apply_env_overrides_from(|name| env.get(name).cloned())
            .expect("overrides apply");

        assert_eq!(cfg.programs.dir, PathBuf::from("/opt/io300"));
        assert_eq!(cfg.fixtures.block_count, 3);
        assert_eq!(cfg.fixtures.block_size, 4096);
        assert_eq!(cfg.report.max_lines, 5);
        assert_eq!(
            cfg.logging.jsonl_path,
            Some(PathBuf::from("/tmp/ioc.jsonl"))
        );
    }

    #[test]
    fn env_invalid_number_rejected() {
        let env = vars(&[("IOC_UNIT_NUM_OPS", "lots")]);
        let mut cfg = HarnessConfig::default();
        let err = cfg
            .apply_env_overrides_from(|name| env.get(name).cloned())
            .expect_err("expected parse failure");
        assert_eq!(err.code(), "IOC-1003");
        assert!(err.to_string().contains("IOC_UNIT_NUM_OPS"));
    }

    #[test]
    fn toml_sections_are_partial() {
        let cfg: HarnessConfig = toml::from_str(
            r#"
            [programs]
            dir = "build"

            [unit]
            num_ops = 100
            "#,
        )
        .expect("parse");
        assert_eq!(cfg.programs.dir, PathBuf::from("build"));
        assert_eq!(cfg.unit.num_ops, 100);
        assert_eq!(cfg.unit.file_size, 4096);
        assert_eq!(cfg.fixtures.block_count, 20);
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("iocheck.toml");
        std::fs::write(&path, "[report]\nmax_lines = 7\n").unwrap();
        let cfg = HarnessConfig::load(Some(&path)).expect("load");
        assert_eq!(cfg.report.max_lines, 7);
    }

    #[test]
    fn load_returns_error_for_explicit_missing_path() {
        let result = HarnessConfig::load(Some(Path::new("/nonexistent/iocheck/iocheck.toml")));
        assert!(matches!(result, Err(IocError::MissingConfig { .. })));
    }
}
