//! Structured JSONL event log for harness runs.

pub mod jsonl;
