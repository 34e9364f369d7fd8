//! Text formatting shared by the console reporters
//!
//! Provides the run summary, failure listing and error rendering.

use crate::models::{FailedTest, RunReport, Stats, TestError};

pub(crate) const RESET: &str = "\x1b[0m";
pub(crate) const GREY: &str = "\x1b[90m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const BLUE: &str = "\x1b[94m";

/// Summary and failure formatter
#[derive(Clone, Copy, Debug)]
pub struct ResultFormatter {
    colorize: bool,
}

impl ResultFormatter {
    pub fn new(colorize: bool) -> Self {
        Self { colorize }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    pub fn colorize(&self) -> bool {
        self.colorize
    }

    /// Wrap `text` in an ANSI color when colors are on
    pub fn paint(&self, color: &str, text: &str) -> String {
        if self.colorize {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Passing/failing/pending lines; each only appears when non-zero
    pub fn format_stats(&self, stats: &Stats, duration_ms: u64) -> String {
        let mut output = String::new();

        if stats.passed > 0 {
            let timing = if self.colorize {
                format!("{GREY}({duration_ms}ms){RESET}")
            } else {
                format!("({duration_ms}ms)")
            };
            output.push_str(&format!(
                "  {} {}\n",
                self.paint(GREEN, &format!("{} passing", stats.passed)),
                timing
            ));
        }
        if stats.failed > 0 {
            output.push_str(&format!(
                "  {}\n",
                self.paint(RED, &format!("{} failing", stats.failed))
            ));
        }
        if stats.skipped > 0 {
            output.push_str(&format!(
                "  {}\n",
                self.paint(BLUE, &format!("{} pending", stats.skipped))
            ));
        }
        output.push('\n');
        output
    }

    /// Numbered list of every failure with its error
    pub fn format_failures(&self, failures: &[FailedTest]) -> String {
        let mut output = String::new();
        for (index, failure) in failures.iter().enumerate() {
            output.push_str(&format!("  {}) {}:\n", index + 1, failure.name));
            output.push_str(&self.format_error(&failure.error));
        }
        output
    }

    /// Indented error message, its causes, and the raw rejected value
    pub fn format_error(&self, error: &TestError) -> String {
        let mut output = String::new();
        for line in error.message.lines() {
            output.push_str(&format!("     {}\n", self.paint(RED, line)));
        }
        for cause in &error.causes {
            output.push_str(&format!("       caused by: {cause}\n"));
        }
        if let Some(original) = &error.original {
            output.push_str(&format!("       rejected value: {original}\n"));
        }
        output.push('\n');
        output
    }

    /// Summary followed by the failure list
    pub fn format_report(&self, report: &RunReport) -> String {
        let mut output = String::from("\n\n");
        output.push_str(&self.format_stats(&report.stats, report.duration_ms));
        output.push_str(&self.format_failures(&report.failures));
        output
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}
