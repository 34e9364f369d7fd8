//! Compact reporter: one dot per test

use std::io::Write;
use tracing::warn;

use super::formatter::{ResultFormatter, BLUE, GREEN, RED};
use super::Reporter;
use crate::models::{RunReport, TestKind, TestOutcome, TestStatus};

#[derive(Debug)]
pub struct DotReporter<W: Write> {
    out: W,
    formatter: ResultFormatter,
}

impl<W: Write> DotReporter<W> {
    pub fn new(out: W, colorize: bool) -> Self {
        Self {
            out,
            formatter: ResultFormatter::new(colorize),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|_| self.out.flush())
        {
            warn!("Failed to write report output: {}", e);
        }
    }
}

impl<W: Write> Reporter for DotReporter<W> {
    fn run_started(&mut self) {
        self.emit("\n\n");
    }

    fn test_finished(&mut self, outcome: &TestOutcome, _failure_number: Option<usize>) {
        let color = match (outcome.status, outcome.kind) {
            (TestStatus::Skipped, _) => BLUE,
            (TestStatus::Passed, _) => GREEN,
            (TestStatus::Failed, TestKind::Test) => RED,
            // Failed hooks only show up in the failure list
            (TestStatus::Failed, _) => return,
        };
        let dot = self.formatter.paint(color, ".");
        self.emit(&dot);
    }

    fn run_finished(&mut self, report: &RunReport) {
        let text = self.formatter.format_report(report);
        self.emit(&text);
    }
}
