//! Eltro - a small sequential test runner
//!
//! Tests are declared on an explicit [`Eltro`] context, nested in groups,
//! and run strictly one at a time with a per-test deadline.
//!
//! ## Features
//!
//! - Nested groups with `before`/`after` hooks
//! - `skip` and `only` on tests and groups, with exclusivity propagated
//!   through ancestors
//! - Synchronous, async and callback-style test bodies behind one contract
//! - Per-test, per-group and default timeouts
//! - `list` and `dot` console reporters
//! - A command-line [`Harness`] with glob target selection
//!
//! ## Usage
//!
//! ```bash
//! # Run everything under test/
//! cargo run --bin my-tests
//!
//! # Run one directory with the dot reporter
//! cargo run --bin my-tests -- -r dot test/folder1/
//!
//! # Run every file matching a pattern
//! cargo run --bin my-tests -- 'test/**/*.test.rs'
//! ```

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod harness;
pub mod models;
pub mod output;
pub mod registry;
pub mod utils;

pub use error::{HarnessError, RegistrationError};
pub use harness::{Harness, RunOptions};
pub use models::{
    Done, ErrorKind, FailedTest, IntoBodyResult, Rejection, RunReport, Stats, TestBody, TestError,
    TestKind, TestOutcome, TestStatus,
};
pub use output::{DotReporter, ListReporter, Reporter, ReporterKind, SilentReporter};
pub use registry::{Eltro, GroupHandle, HookHandle, TestHandle, DEFAULT_TIMEOUT_MS};
