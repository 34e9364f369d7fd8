//! One line per test, grouped under each describe block

use std::io::Write;
use tracing::warn;

use super::formatter::{ResultFormatter, BLUE, GREEN, GREY, RED, RESET};
use super::Reporter;
use crate::models::{RunReport, TestKind, TestOutcome, TestStatus};

const CLEAR_LINE: &str = "\r\x1b[2K";

/// Line-per-test console reporter
#[derive(Debug)]
pub struct ListReporter<W: Write> {
    out: W,
    formatter: ResultFormatter,
}

impl<W: Write> ListReporter<W> {
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

impl<W: Write> Reporter for ListReporter<W> {
    fn run_started(&mut self) {
        self.emit("\n\n");
    }

    fn group_started(&mut self, name: &str, _tests: usize) {
        self.emit(&format!("  {name}\n"));
    }

    fn test_started(&mut self, name: &str, _kind: TestKind) {
        // The pending marker is rewritten in place, which needs a terminal
        if self.formatter.colorize() {
            self.emit(&format!("    {GREY}? {name}{RESET}"));
        }
    }

    fn test_finished(&mut self, outcome: &TestOutcome, failure_number: Option<usize>) {
        let prefix = if self.formatter.colorize() && outcome.status != TestStatus::Skipped {
            CLEAR_LINE
        } else {
            ""
        };
        let name = &outcome.name;

        let line = match (outcome.status, self.formatter.colorize()) {
            (TestStatus::Skipped, true) => format!("    {BLUE}- {name}{RESET}\n"),
            (TestStatus::Skipped, false) => format!("    - {name}\n"),
            (TestStatus::Passed, true) => format!("    {GREEN}√{GREY} {name}{RESET}\n"),
            (TestStatus::Passed, false) => format!("    √ {name}\n"),
            (TestStatus::Failed, colorize) => match (outcome.kind, failure_number) {
                (TestKind::Test, Some(n)) if colorize => format!("    {RED}{n}) {name}{RESET}\n"),
                (TestKind::Test, Some(n)) => format!("    {n}) {name}\n"),
                _ => String::new(),
            },
        };

        self.emit(&format!("{prefix}{line}"));
    }

    fn run_finished(&mut self, report: &RunReport) {
        let text = self.formatter.format_report(report);
        self.emit(&text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorKind, FailedTest, Stats, TestError};

    fn render(colorize: bool, events: impl FnOnce(&mut ListReporter<Vec<u8>>)) -> String {
        let mut reporter = ListReporter::new(Vec::new(), colorize);
        events(&mut reporter);
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_plain_lines() {
        let err = TestError::new(ErrorKind::Failure, "boom");
        let output = render(false, |r| {
            r.group_started("Math", 3);
            r.test_started("Math adds", TestKind::Test);
            r.test_finished(&TestOutcome::pass("Math adds", TestKind::Test, 1), None);
            r.test_finished(&TestOutcome::skip("Math later"), None);
            r.test_finished(
                &TestOutcome::fail("Math breaks", TestKind::Test, 1, err.clone()),
                Some(1),
            );
            r.test_finished(
                &TestOutcome::fail("After: Math", TestKind::After, 1, err),
                Some(2),
            );
        });

        assert_eq!(
            output,
            "  Math\n    √ Math adds\n    - Math later\n    1) Math breaks\n"
        );
    }

    #[test]
    fn test_colored_pending_marker_is_cleared() {
        let output = render(true, |r| {
            r.test_started("t", TestKind::Test);
            r.test_finished(&TestOutcome::pass("t", TestKind::Test, 1), None);
        });

        assert_eq!(
            output,
            "    \x1b[90m? t\x1b[0m\r\x1b[2K    \x1b[32m√\x1b[90m t\x1b[0m\n"
        );
    }

    #[test]
    fn test_summary_and_failures() {
        let report = RunReport {
            stats: Stats::new(1, 1, 0),
            duration_ms: 4,
            outcomes: Vec::new(),
            failures: vec![FailedTest {
                name: "g broken".to_string(),
                kind: TestKind::Test,
                error: TestError::new(ErrorKind::Failure, "boom"),
            }],
        };

        let output = render(false, |r| {
            r.run_started();
            r.run_finished(&report);
        });

        assert_eq!(
            output,
            "\n\n\n\n  1 passing (4ms)\n  1 failing\n\n  1) g broken:\n     boom\n\n"
        );
    }
}
