//! File comparison: size check first, then chunked byte comparison.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

use crate::core::errors::{IocError, Result};
use crate::report::console::Console;

const CHUNK_SIZE: usize = 64 * 1024;

/// Compares fixture and output files, printing diagnostics through the console.
pub struct FileComparator<'a> {
    console: &'a Console,
}

impl<'a> FileComparator<'a> {
    /// Comparator reporting mismatches through `console`.
    #[must_use]
    pub const fn new(console: &'a Console) -> Self {
        Self { console }
    }

    /// Whether `expected` and `actual` have the same byte length.
    pub fn same_size(&self, expected: &Path, actual: &Path, report: bool) -> Result<bool> {
        let expected_len = file_len(expected)?;
        let actual_len = file_len(actual)?;

        if expected_len == actual_len {
            return Ok(true);
        }
        if report {
            self.console.failure(&format!(
                "File sizes differ:  expected {expected_len} ({}), got {actual_len} ({})",
                expected.display(),
                actual.display()
            ));
        }
        Ok(false)
    }

    /// Whether `expected` and `actual` hold identical bytes.
    pub fn identical(&self, expected: &Path, actual: &Path, report: bool) -> Result<bool> {
        if !self.same_size(expected, actual, report)? {
            return Ok(false);
        }

        match first_difference(expected, actual)? {
            None => Ok(true),
            Some(offset) => {
                if report {
                    self.console.failure(&format!(
                        "Files differ at byte {offset}: expected {}, got {}",
                        expected.display(),
                        actual.display()
                    ));
                }
                Ok(false)
            }
        }
    }
}

fn file_len(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|meta| meta.len())
        .map_err(|source| IocError::io(path, source))
}

/// Offset of the first differing byte, or `None` if the files are equal.
/// A file that is a strict prefix of the other differs at its length.
pub fn first_difference(a: &Path, b: &Path) -> Result<Option<u64>> {
    let mut left = BufReader::new(File::open(a).map_err(|e| IocError::io(a, e))?);
    let mut right = BufReader::new(File::open(b).map_err(|e| IocError::io(b, e))?);
    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];
    let mut offset: u64 = 0;

    loop {
        let left_n = fill(&mut left, &mut left_buf).map_err(|e| IocError::io(a, e))?;
        let right_n = fill(&mut right, &mut right_buf).map_err(|e| IocError::io(b, e))?;
        let common = left_n.min(right_n);

        if let Some(pos) = left_buf[..common]
            .iter()
            .zip(&right_buf[..common])
            .position(|(l, r)| l != r)
        {
            return Ok(Some(offset + pos as u64));
        }
        if left_n != right_n {
            return Ok(Some(offset + common as u64));
        }
        if left_n == 0 {
            return Ok(None);
        }
        offset += left_n as u64;
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
