//! Shared fixture files owned by the runner.
//!
//! Layout under `<scratch>/iocheck-<pid>/`:
//! - `input`      random bytes, `block_size * block_count` long
//! - `output`     scratch target, truncated before every case
//! - `output2`    second scratch target for round trips
//! - `integrity`  pristine copy of `input`, compared after every case
//!
//! Every failure here is a setup failure; the run cannot continue without
//! fixtures.

#![allow(clippy::cast_possible_truncation)]

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};

use crate::core::config::FixtureConfig;
use crate::core::errors::{IocError, Result};

/// Content of the substitute input for the content-agnosticism case:
/// embedded NULs plus Hangul, Devanagari and Afrikaans text.
pub const NON_ASCII_CONTENT: &str = "Make\0sure\0your\0cache\0can\0handle\0null\0bytes! \
가정하는 것은 안전하지 않습니다 प्रत्येकं पात्रं इति 'n ASCII-karakter.";

/// The three paths a test case may touch.
#[derive(Debug, Clone, Copy)]
pub struct CaseFiles<'a> {
    /// Read-only input. Must be byte-identical after the case.
    pub input: &'a Path,
    /// Scratch output, empty when the case starts.
    pub output: &'a Path,
    /// Second scratch output for round trips, empty when the case starts.
    pub output2: &'a Path,
}

/// Input file paired with the snapshot it is checked against.
#[derive(Debug, Clone)]
pub struct GuardedInput {
    /// File handed to the case.
    pub input: PathBuf,
    /// Pristine copy of `input`.
    pub integrity: PathBuf,
    /// SHA-256 of the snapshot taken when it was written. A snapshot that no
    /// longer hashes to this is never used to restore `input`.
    pub snapshot_sha256: String,
}

impl GuardedInput {
    /// Check that the snapshot still hashes to the digest recorded when it
    /// was taken.
    pub fn verify_snapshot(&self) -> Result<()> {
        let data = fs::read(&self.integrity).map_err(|e| IocError::IntegrityUnreadable {
            path: self.integrity.clone(),
            details: e.to_string(),
        })?;
        if digest_hex(&data) == self.snapshot_sha256 {
            Ok(())
        } else {
            Err(IocError::SnapshotModified {
                path: self.integrity.clone(),
            })
        }
    }
}

/// Shared fixtures for one suite run.
#[derive(Debug)]
pub struct FixtureSet {
    root: PathBuf,
    shared: GuardedInput,
    output: PathBuf,
    output2: PathBuf,
}

impl FixtureSet {
    /// Create the fixture directory, random input and its integrity copy.
    ///
    /// On failure the partially populated directory is removed.
    pub fn create(geometry: &FixtureConfig, seed: u64) -> Result<Self> {
        let root = geometry
            .scratch_dir
            .join(format!("iocheck-{}", std::process::id()));
        fs::create_dir_all(&root).map_err(|e| IocError::fixture_setup(&root, &e))?;

        Self::populate(root.clone(), geometry, seed).inspect_err(|_| {
            let _ = fs::remove_dir_all(&root);
        })
    }

    fn populate(root: PathBuf, geometry: &FixtureConfig, seed: u64) -> Result<Self> {
        let input = root.join("input");
        let integrity = root.join("integrity");
        write_random(&input, geometry, seed)?;
        let snapshot_sha256 = take_snapshot(&input, &integrity)?;

        let set = Self {
            shared: GuardedInput {
                input,
                integrity,
                snapshot_sha256,
            },
            output: root.join("output"),
            output2: root.join("output2"),
            root,
        };
        set.truncate_outputs()?;
        Ok(set)
    }

    /// The `iocheck-<pid>` directory holding every fixture.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The random input shared by every case reading [`InputSource::Shared`].
    ///
    /// [`InputSource::Shared`]: crate::suite::family::InputSource::Shared
    #[must_use]
    pub const fn shared(&self) -> &GuardedInput {
        &self.shared
    }

    /// First scratch output.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Second scratch output.
    #[must_use]
    pub fn output2(&self) -> &Path {
        &self.output2
    }

    /// Paths handed to a case reading `input`.
    #[must_use]
    pub fn case_files<'a>(&'a self, input: &'a Path) -> CaseFiles<'a> {
        CaseFiles {
            input,
            output: &self.output,
            output2: &self.output2,
        }
    }

    /// Empty both scratch outputs.
    pub fn truncate_outputs(&self) -> Result<()> {
        for path in [&self.output, &self.output2] {
            File::create(path).map_err(|e| IocError::fixture_setup(path, &e))?;
        }
        Ok(())
    }

    /// Write the non-ASCII substitute input and its snapshot.
    pub fn create_non_ascii(&self) -> Result<GuardedInput> {
        let input = self.root.join("nonascii.txt");
        let integrity = self.root.join("nonascii.integrity");
        fs::write(&input, NON_ASCII_CONTENT.as_bytes())
            .map_err(|e| IocError::fixture_setup(&input, &e))?;
        let snapshot_sha256 = take_snapshot(&input, &integrity)?;
        Ok(GuardedInput {
            input,
            integrity,
            snapshot_sha256,
        })
    }

    /// Remove a substitute input created by [`Self::create_non_ascii`].
    pub fn remove_guarded(&self, guarded: &GuardedInput) -> Result<()> {
        for path in [&guarded.input, &guarded.integrity] {
            fs::remove_file(path).map_err(|e| IocError::FixtureTeardown {
                path: path.clone(),
                details: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Delete every fixture.
    pub fn teardown(self) -> Result<()> {
        fs::remove_dir_all(&self.root).map_err(|e| IocError::FixtureTeardown {
            path: self.root.clone(),
            details: e.to_string(),
        })
    }
}

fn write_random(path: &Path, geometry: &FixtureConfig, seed: u64) -> Result<()> {
    let file = File::create(path).map_err(|e| IocError::fixture_setup(path, &e))?;
    let mut writer = BufWriter::new(file);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut block = vec![0u8; geometry.block_size as usize];

    for _ in 0..geometry.block_count {
        rng.fill_bytes(&mut block);
        writer
            .write_all(&block)
            .map_err(|e| IocError::fixture_setup(path, &e))?;
    }
    writer
        .flush()
        .map_err(|e| IocError::fixture_setup(path, &e))?;
    Ok(())
}

/// Copy `input` to `integrity` and return the digest of the copy.
fn take_snapshot(input: &Path, integrity: &Path) -> Result<String> {
    fs::copy(input, integrity).map_err(|e| IocError::fixture_setup(integrity, &e))?;
    let data = fs::read(integrity).map_err(|e| IocError::fixture_setup(integrity, &e))?;
    Ok(digest_hex(&data))
}

/// Lowercase hex SHA-256.
fn digest_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}
