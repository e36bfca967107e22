//! IOC-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, IocError>;

/// Top-level error type for the correctness harness.
#[derive(Debug, Error)]
pub enum IocError {
    #[error("[IOC-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[IOC-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[IOC-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[IOC-1101] unrecognized test group: {group}")]
    UnknownGroup { group: String },

    #[error("[IOC-1201] duplicate test case {name:?} in suite {suite}")]
    DuplicateCase { suite: String, name: String },

    #[error("[IOC-2001] fixture setup failed for {path}: {details}")]
    FixtureSetup { path: PathBuf, details: String },

    #[error("[IOC-2002] fixture teardown failed for {path}: {details}")]
    FixtureTeardown { path: PathBuf, details: String },

    #[error("[IOC-2003] integrity check could not read {path}: {details}")]
    IntegrityUnreadable { path: PathBuf, details: String },

    #[error("[IOC-2004] integrity snapshot modified: {path}")]
    SnapshotModified { path: PathBuf },

    #[error("[IOC-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[IOC-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IocError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "IOC-1001",
            Self::MissingConfig { .. } => "IOC-1002",
            Self::ConfigParse { .. } => "IOC-1003",
            Self::UnknownGroup { .. } => "IOC-1101",
            Self::DuplicateCase { .. } => "IOC-1201",
            Self::FixtureSetup { .. } => "IOC-2001",
            Self::FixtureTeardown { .. } => "IOC-2002",
            Self::IntegrityUnreadable { .. } => "IOC-2003",
            Self::SnapshotModified { .. } => "IOC-2004",
            Self::Serialization { .. } => "IOC-2101",
            Self::Io { .. } => "IOC-3002",
        }
    }

    /// Whether the error invalidates every later case of the run.
    ///
    /// Fixture-level failures abort the run; nothing evaluated afterwards
    /// would mean anything.
    #[must_use]
    pub const fn is_fatal_to_run(&self) -> bool {
        matches!(
            self,
            Self::FixtureSetup { .. }
                | Self::FixtureTeardown { .. }
                | Self::IntegrityUnreadable { .. }
                | Self::SnapshotModified { .. }
                | Self::Io { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for fixture setup failures.
    #[must_use]
    pub fn fixture_setup(path: impl AsRef<Path>, source: &std::io::Error) -> Self {
        Self::FixtureSetup {
            path: path.as_ref().to_path_buf(),
            details: source.to_string(),
        }
    }
}

impl From<serde_json::Error> for IocError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for IocError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn every_variant() -> Vec<IocError> {
        vec![
            IocError::InvalidConfig {
                details: String::new(),
            },
            IocError::MissingConfig {
                path: PathBuf::new(),
            },
            IocError::ConfigParse {
                context: "",
                details: String::new(),
            },
            IocError::UnknownGroup {
                group: String::new(),
            },
            IocError::DuplicateCase {
                suite: String::new(),
                name: String::new(),
            },
            IocError::FixtureSetup {
                path: PathBuf::new(),
                details: String::new(),
            },
            IocError::FixtureTeardown {
                path: PathBuf::new(),
                details: String::new(),
            },
            IocError::IntegrityUnreadable {
                path: PathBuf::new(),
                details: String::new(),
            },
            IocError::SnapshotModified {
                path: PathBuf::new(),
            },
            IocError::Serialization {
                context: "",
                details: String::new(),
            },
            IocError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = every_variant();
        let codes: Vec<&str> = errors.iter().map(IocError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn display_carries_code_prefix() {
        for err in every_variant() {
            let msg = err.to_string();
            assert!(
                msg.starts_with(&format!("[{}]", err.code())),
                "display should lead with code: {msg}"
            );
        }
    }

    #[test]
    fn fixture_errors_are_fatal_case_errors_are_not() {
        assert!(
            IocError::FixtureSetup {
                path: PathBuf::new(),
                details: String::new()
            }
            .is_fatal_to_run()
        );
        assert!(
            IocError::IntegrityUnreadable {
                path: PathBuf::new(),
                details: String::new()
            }
            .is_fatal_to_run()
        );
        assert!(
            IocError::SnapshotModified {
                path: PathBuf::new()
            }
            .is_fatal_to_run()
        );
        assert!(
            !IocError::UnknownGroup {
                group: "bogus".to_string()
            }
            .is_fatal_to_run()
        );
        assert!(
            !IocError::InvalidConfig {
                details: String::new()
            }
            .is_fatal_to_run()
        );
    }

    #[test]
    fn unknown_group_names_the_group() {
        let err = IocError::UnknownGroup {
            group: "everything".to_string(),
        };
        assert!(err.to_string().contains("everything"));
    }

    #[test]
    fn io_convenience_constructor() {
        let err = IocError::io(
            "/tmp/infile",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "IOC-3002");
        assert!(err.to_string().contains("/tmp/infile"));
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: IocError = json_err.into();
        assert_eq!(err.code(), "IOC-2101");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: IocError = toml_err.into();
        assert_eq!(err.code(), "IOC-1003");
    }
}
