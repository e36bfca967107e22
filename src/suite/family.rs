//! Suites and the parameterized families that populate them.
//!
//! A [`Suite`] is an ordered list of uniquely named cases. Insertion order is
//! execution order and report order.

#![allow(missing_docs)]

use serde::Serialize;

use crate::core::config::HarnessConfig;
use crate::core::errors::{IocError, Result};
use crate::core::run::{RunConfig, SuiteGroup};
use crate::suite::case::{
    BlockCat, ByteCat, DiabolicalByteCat, RandomBlockCat, ReverseBlockCat, ReverseByteCat, Rot13,
    TestCase, UnitCase, UnitParams,
};

/// Which input a case reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// The suite's random `input` fixture.
    Shared,
    /// A dedicated file with NUL bytes and multi-script text, guarded by
    /// its own snapshot.
    NonAscii,
}

/// Suite category, used for headers and remediation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuiteKind {
    Basic,
    EndToEnd,
}

impl SuiteKind {
    /// Label used in the summary banner.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "BASIC FUNCTIONALITY",
            Self::EndToEnd => "END-TO-END",
        }
    }

    /// Position in the run banner (`(1)`, `(2)`).
    #[must_use]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Basic => 1,
            Self::EndToEnd => 2,
        }
    }
}

/// A case bound to its name and input.
pub struct NamedCase {
    name: String,
    input: InputSource,
    case: Box<dyn TestCase>,
}

impl NamedCase {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn input(&self) -> InputSource {
        self.input
    }

    #[must_use]
    pub fn case(&self) -> &dyn TestCase {
        self.case.as_ref()
    }
}

/// Ordered, uniquely named collection of cases.
pub struct Suite {
    kind: SuiteKind,
    cases: Vec<NamedCase>,
}

impl Suite {
    #[must_use]
    pub const fn new(kind: SuiteKind) -> Self {
        Self {
            kind,
            cases: Vec::new(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SuiteKind {
        self.kind
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.kind.label()
    }

    #[must_use]
    pub fn cases(&self) -> &[NamedCase] {
        &self.cases
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.iter().map(NamedCase::name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Append a case reading the shared input.
    pub fn push(&mut self, name: &str, case: impl TestCase + 'static) -> Result<()> {
        self.push_with_input(name, InputSource::Shared, case)
    }

    /// Append a case with an explicit input source. Names must be unique.
    pub fn push_with_input(
        &mut self,
        name: &str,
        input: InputSource,
        case: impl TestCase + 'static,
    ) -> Result<()> {
        if self.cases.iter().any(|c| c.name == name) {
            return Err(IocError::DuplicateCase {
                suite: self.label().to_string(),
                name: name.to_string(),
            });
        }
        self.cases.push(NamedCase {
            name: name.to_string(),
            input,
            case: Box::new(case),
        });
        Ok(())
    }
}

/// Axes shared by every family in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamilyParams {
    /// Seed handed to every unit-style case.
    pub seed: u64,
    /// Baseline verifier parameters.
    pub unit: UnitParams,
    /// Byte length of the shared input fixture.
    pub fixture_len: u64,
}

impl FamilyParams {
    #[must_use]
    pub const fn from_config(run: &RunConfig, cfg: &HarnessConfig) -> Self {
        Self {
            seed: run.seed,
            unit: UnitParams {
                file_size: cfg.unit.file_size,
                max_file_size: cfg.unit.max_file_size,
                num_ops: cfg.unit.num_ops,
            },
            fixture_len: cfg.fixtures.input_len(),
        }
    }

    fn unit(&self, operations: &str) -> UnitCase {
        UnitCase::new(operations, self.seed, self.unit)
    }

    fn unit_with(&self, operations: &str, params: UnitParams) -> UnitCase {
        UnitCase::new(operations, self.seed, params)
    }

    /// Verifier parameters with an odd starting size, so reads and writes
    /// straddle cache-block boundaries.
    const fn odd_sized(&self) -> UnitParams {
        UnitParams {
            file_size: 4129,
            ..self.unit
        }
    }
}

/// Block sizes for the chunked-copy family: per-byte, prime, mid-size, two
/// larger than the fixture's generation block, and one larger than the
/// whole file.
#[must_use]
pub fn block_cat_sizes(fixture_len: u64) -> Vec<(String, u64)> {
    vec![
        ("block_cat_1".to_string(), 1),
        ("block_cat_17".to_string(), 17),
        ("block_cat_334".to_string(), 334),
        ("block_cat_huge".to_string(), 8192),
        ("block_cat_gargantuan".to_string(), 32768),
        (
            "block_cat_whole_file".to_string(),
            fixture_len.saturating_mul(2).max(1),
        ),
    ]
}

/// Block sizes for the reversal family.
#[must_use]
pub fn reverse_block_cat_sizes() -> Vec<(String, u64)> {
    vec![
        ("reverse_block_cat_1".to_string(), 1),
        ("reverse_block_cat_13".to_string(), 13),
        ("reverse_block_cat_987".to_string(), 987),
        ("reverse_block_cat_huge".to_string(), 8192),
    ]
}

/// Unit-style verifier cases plus the content-agnosticism check.
pub fn basic_suite(p: &FamilyParams) -> Result<Suite> {
    let mut suite = Suite::new(SuiteKind::Basic);
    suite.push("readc", p.unit("readc"))?;
    suite.push("writec", p.unit("writec"))?;
    suite.push("readc/writec", p.unit("readc writec"))?;
    suite.push("read", p.unit("read=17"))?;
    suite.push("read_random", p.unit_with("read", p.odd_sized()))?;
    suite.push("write", p.unit("write=17"))?;
    suite.push("write_random", p.unit_with("write", p.odd_sized()))?;
    suite.push("read/write", p.unit("read write"))?;
    suite.push_with_input(
        "ascii_independence",
        InputSource::NonAscii,
        BlockCat { block_size: 17 },
    )?;
    suite.push("read/write/seek", p.unit("read write seek"))?;
    suite.push(
        "seek_beyond_eof",
        p.unit_with(
            "readc writec seek",
            UnitParams {
                file_size: 0,
                max_file_size: 4096,
                num_ops: 1000,
            },
        ),
    )?;
    suite.push("all_read_write", p.unit("readc writec read write"))?;
    Ok(suite)
}

/// File-transformation round trips driven through whole programs.
pub fn e2e_suite(p: &FamilyParams) -> Result<Suite> {
    let mut suite = Suite::new(SuiteKind::EndToEnd);
    suite.push("all_interaction", p.unit("readc writec read write seek"))?;
    suite.push("byte_cat", ByteCat)?;
    suite.push("reverse_byte_cat", ReverseByteCat)?;
    for (name, block_size) in block_cat_sizes(p.fixture_len) {
        suite.push(&name, BlockCat { block_size })?;
    }
    for (name, block_size) in reverse_block_cat_sizes() {
        suite.push(&name, ReverseBlockCat { block_size })?;
    }
    suite.push("random_block_cat", RandomBlockCat)?;
    suite.push("rot13", Rot13)?;
    Ok(suite)
}

/// The adversarial byte-copy case. Not part of [`e2e_suite`].
#[must_use]
pub const fn diabolical_byte_cat() -> DiabolicalByteCat {
    DiabolicalByteCat
}

/// Suites selected by `group`, in execution order.
pub fn suites_for(group: SuiteGroup, p: &FamilyParams) -> Result<Vec<Suite>> {
    let mut suites = Vec::with_capacity(2);
    if group.includes_basic() {
        suites.push(basic_suite(p)?);
    }
    if group.includes_e2e() {
        suites.push(e2e_suite(p)?);
    }
    Ok(suites)
}
