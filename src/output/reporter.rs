//! Reporter interface
//!
//! The runner emits structured events; reporters decide how to render them.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};

use super::{DotReporter, ListReporter};
use crate::models::{RunReport, TestKind, TestOutcome};

/// Receives run events in execution order
pub trait Reporter {
    fn run_started(&mut self) {}

    /// A group with `tests` direct tests is about to run
    fn group_started(&mut self, _name: &str, _tests: usize) {}

    fn test_started(&mut self, _name: &str, _kind: TestKind) {}

    /// `failure_number` is the 1-based position in the failure list
    fn test_finished(&mut self, outcome: &TestOutcome, failure_number: Option<usize>);

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn test_finished(&mut self, _outcome: &TestOutcome, _failure_number: Option<usize>) {}
}

/// Built-in console reporters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    /// One line per test, grouped by describe block
    #[default]
    List,
    /// One glyph per test
    Dot,
}

impl ReporterKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "list" => Some(ReporterKind::List),
            "dot" => Some(ReporterKind::Dot),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReporterKind::List => "list",
            ReporterKind::Dot => "dot",
        }
    }

    /// Build a reporter writing to stdout
    pub fn create(self, colorize: bool) -> Box<dyn Reporter> {
        self.create_with(io::stdout(), colorize)
    }

    /// Build a reporter writing to `out`
    pub fn create_with<W: Write + 'static>(self, out: W, colorize: bool) -> Box<dyn Reporter> {
        match self {
            ReporterKind::List => Box::new(ListReporter::new(out, colorize)),
            ReporterKind::Dot => Box::new(DotReporter::new(out, colorize)),
        }
    }
}

impl fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
