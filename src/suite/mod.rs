//! Test cases, suites, fixtures and the runner that ties them together.

pub mod case;
pub mod family;
pub mod fixtures;
pub mod runner;
