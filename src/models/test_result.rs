//! Test result models
//!
//! Defines outcome, status, error and statistics types produced by a run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of node produced an outcome
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Test,
    Before,
    After,
}

impl TestKind {
    /// Label used when normalizing rejections ("Test promise rejected with ...")
    pub fn label(&self) -> &'static str {
        match self {
            TestKind::Test => "Test",
            TestKind::Before => "Before",
            TestKind::After => "After",
        }
    }

    pub fn is_hook(&self) -> bool {
        !matches!(self, TestKind::Test)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Test execution status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            TestStatus::Passed => "√",
            TestStatus::Failed => "✗",
            TestStatus::Skipped => "-",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TestStatus::Passed)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "PASS"),
            TestStatus::Failed => write!(f, "FAIL"),
            TestStatus::Skipped => write!(f, "SKIP"),
        }
    }
}

/// Why a test failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The body returned an error, rejected, or called `done.fail(..)`
    Failure,
    /// The body panicked
    Panic,
    /// The deadline elapsed before the body settled
    Timeout,
}

/// Normalized failure stored on a test after it settles.
///
/// Every rejection, whatever its shape, ends up here so that reporters can
/// rely on a message and an optional list of causes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    /// The raw rejected value when it was not error-shaped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<serde_json::Value>,
}

impl TestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            causes: Vec::new(),
            original: None,
        }
    }

    pub fn timeout(ms: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!(
                "timeout of {ms}ms exceeded. Ensure the done() callback is being called in this test."
            ),
        )
    }

    pub fn with_causes(mut self, causes: Vec<String>) -> Self {
        self.causes = causes;
        self
    }

    pub fn with_original(mut self, original: serde_json::Value) -> Self {
        self.original = Some(original);
        self
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for cause in &self.causes {
            write!(f, ": {cause}")?;
        }
        Ok(())
    }
}

/// Result of a single test or hook execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestOutcome {
    pub name: String,
    pub kind: TestKind,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub error: Option<TestError>,
}

impl TestOutcome {
    pub fn pass(name: impl Into<String>, kind: TestKind, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            kind,
            status: TestStatus::Passed,
            duration_ms,
            error: None,
        }
    }

    pub fn fail(name: impl Into<String>, kind: TestKind, duration_ms: u64, error: TestError) -> Self {
        Self {
            name: name.into(),
            kind,
            status: TestStatus::Failed,
            duration_ms,
            error: Some(error),
        }
    }

    pub fn skip(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TestKind::Test,
            status: TestStatus::Skipped,
            duration_ms: 0,
            error: None,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.name,
            self.duration_ms
        )?;
        if let Some(err) = &self.error {
            write!(f, " - {err}")?;
        }
        Ok(())
    }
}

/// Aggregate counters; hooks never contribute to these
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Stats {
    pub fn new(passed: usize, failed: usize, skipped: usize) -> Self {
        Self {
            passed,
            failed,
            skipped,
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub(crate) fn record(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pass: {} | Fail: {} | Skip: {}",
            self.passed, self.failed, self.skipped
        )
    }
}

/// A recorded failure, in the order failures happened
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FailedTest {
    pub name: String,
    pub kind: TestKind,
    pub error: TestError,
}

/// Everything a run produced
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub stats: Stats,
    pub duration_ms: u64,
    pub outcomes: Vec<TestOutcome>,
    pub failures: Vec<FailedTest>,
}

impl RunReport {
    pub fn is_all_passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Outcome for a fully-qualified test name, if it ran or was skipped
    pub fn outcome(&self, name: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }
}
