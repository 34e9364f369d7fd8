//! Registration API and run lifecycle
//!
//! [`Eltro`] is the explicit context test authors declare groups and tests
//! on. Declarations build a [`TestTree`]; [`Eltro::run`] hands the tree to
//! the executor.
//!
//! ```no_run
//! use eltro::{Eltro, SilentReporter};
//!
//! # async fn demo() -> Result<(), eltro::RegistrationError> {
//! let mut t = Eltro::new();
//! t.describe("Math", |t| {
//!     t.test("adds", || assert_eq!(1 + 1, 2))?;
//!     t.test_async("waits", || async { Ok::<(), String>(()) })?;
//!     Ok(())
//! })?;
//!
//! let report = t.run(&mut SilentReporter).await;
//! assert_eq!(report.stats.passed, 2);
//! # Ok(())
//! # }
//! ```

mod handle;

use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, warn};

use crate::error::RegistrationError;
use crate::executor::Runner;
use crate::models::{
    Done, GroupId, IntoBodyResult, RunReport, TestBody, TestId, TestKind, TestNode, TestTree,
};
use crate::output::Reporter;

pub use handle::{GroupHandle, HookHandle, TestHandle};

/// Deadline used when neither a test nor its groups set one
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Modifiers set on the context itself and consumed by the next declaration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Pending {
    timeout: Option<u64>,
    skip: bool,
    only: bool,
}

/// Test registry and run context
#[derive(Debug)]
pub struct Eltro {
    tree: TestTree,
    active: Option<GroupId>,
    pending: Pending,
    files: HashMap<String, GroupId>,
    failed: Vec<TestId>,
    default_timeout: u64,
    started: bool,
}

impl Default for Eltro {
    fn default() -> Self {
        Self::new()
    }
}

impl Eltro {
    /// Create an empty context
    pub fn new() -> Self {
        Self {
            tree: TestTree::new(),
            active: None,
            pending: Pending::default(),
            files: HashMap::new(),
            failed: Vec::new(),
            default_timeout: DEFAULT_TIMEOUT_MS,
            started: false,
        }
    }

    /// Set the process-wide default timeout in milliseconds
    pub fn with_default_timeout(mut self, ms: u64) -> Self {
        self.set_default_timeout(ms);
        self
    }

    pub fn set_default_timeout(&mut self, ms: u64) {
        if ms > 0 {
            self.default_timeout = ms;
        }
    }

    pub fn default_timeout(&self) -> u64 {
        self.default_timeout
    }

    /// Start a registration phase, clearing everything registered so far.
    ///
    /// A second call without an intervening [`Eltro::reset`] only warns.
    pub fn begin(&mut self) {
        if self.started {
            warn!("Multiple calls to begin were done.");
            return;
        }
        self.clear();
        self.started = true;
    }

    /// Clear all registered groups, tests and results unconditionally
    pub fn reset(&mut self) {
        self.clear();
        self.started = false;
    }

    fn clear(&mut self) {
        self.tree.clear();
        self.active = None;
        self.pending = Pending::default();
        self.files.clear();
        self.failed.clear();
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn tree(&self) -> &TestTree {
        &self.tree
    }

    /// Tests and hooks that failed in the last run, in failure order
    pub fn failed_tests(&self) -> impl Iterator<Item = &TestNode> + '_ {
        self.failed.iter().map(|id| self.tree.test(*id))
    }

    /// Make the next `describe`/`test` time out after `ms` milliseconds
    pub fn timeout(&mut self, ms: u64) -> &mut Self {
        self.pending.timeout = (ms > 0).then_some(ms);
        self
    }

    /// Make the next `describe`/`test` skipped
    pub fn skip(&mut self) -> &mut Self {
        self.pending.skip = true;
        self
    }

    /// Make the next `describe`/`test` exclusive
    pub fn only(&mut self) -> &mut Self {
        self.pending.only = true;
        self
    }

    /// Scope top-level declarations into a root group named `"<filename>:"`.
    ///
    /// The group is created once per filename and reused afterwards.
    pub fn set_filename(&mut self, filename: &str) {
        let id = match self.files.get(filename) {
            Some(id) => *id,
            None => {
                let id = self.tree.add_group(None, &format!("{filename}:"));
                self.files.insert(filename.to_string(), id);
                id
            }
        };
        self.active = Some(id);
    }

    pub fn reset_filename(&mut self) {
        self.active = None;
    }

    /// Declare a group and run `body` to declare its contents
    pub fn describe<F>(&mut self, name: &str, body: F) -> Result<GroupHandle<'_>, RegistrationError>
    where
        F: FnOnce(&mut Eltro) -> Result<(), RegistrationError>,
    {
        let parent = self.active;
        let id = self.tree.add_group(parent, name);
        let pending = std::mem::take(&mut self.pending);

        if let Some(ms) = pending.timeout {
            self.tree.group_mut(id).custom_timeout = Some(ms);
        }
        if pending.skip {
            self.tree.group_mut(id).skip = true;
        }
        if pending.only {
            self.tree.mark_group_exclusive(id);
        }
        debug!(group = %self.tree.group(id).name, "Registered group");

        self.active = Some(id);
        let result = body(self);
        self.active = parent;
        result?;

        Ok(GroupHandle::new(self, id))
    }

    /// Declare a synchronous test
    pub fn test<F, R>(&mut self, name: &str, f: F) -> Result<TestHandle<'_>, RegistrationError>
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoBodyResult,
    {
        self.test_body(name, TestBody::sync(f))
    }

    /// Declare a test whose body returns a future
    pub fn test_async<F, Fut, R>(
        &mut self,
        name: &str,
        f: F,
    ) -> Result<TestHandle<'_>, RegistrationError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoBodyResult,
    {
        self.test_body(name, TestBody::future(f))
    }

    /// Declare a test that settles through a [`Done`] handle
    pub fn test_with_callback<F>(
        &mut self,
        name: &str,
        f: F,
    ) -> Result<TestHandle<'_>, RegistrationError>
    where
        F: Fn(Done) + Send + Sync + 'static,
    {
        self.test_body(name, TestBody::callback(f))
    }

    /// Declare a test from an already-built body
    pub fn test_body(
        &mut self,
        name: &str,
        body: TestBody,
    ) -> Result<TestHandle<'_>, RegistrationError> {
        let group = self
            .active
            .ok_or(RegistrationError::OutsideGroup { call: "test" })?;
        let id = self.tree.add_test(group, name, body);
        let pending = std::mem::take(&mut self.pending);

        if pending.only && !pending.skip {
            self.tree.mark_test_exclusive(id);
        }
        if pending.skip {
            self.tree.test_mut(id).skip = true;
        }
        let timeout = pending.timeout.or(self.tree.group(group).custom_timeout);
        self.tree.test_mut(id).custom_timeout = timeout;
        debug!(test = %self.tree.test(id).name, "Registered test");

        Ok(TestHandle::new(self, id))
    }

    /// Attach a hook run once before the active group's tests and subgroups
    pub fn before(&mut self, body: TestBody) -> Result<HookHandle<'_>, RegistrationError> {
        self.hook(TestKind::Before, body)
    }

    /// Attach a hook run once after the active group's tests and subgroups
    pub fn after(&mut self, body: TestBody) -> Result<HookHandle<'_>, RegistrationError> {
        self.hook(TestKind::After, body)
    }

    fn hook(&mut self, kind: TestKind, body: TestBody) -> Result<HookHandle<'_>, RegistrationError> {
        let call = match kind {
            TestKind::Before => "before",
            _ => "after",
        };
        let group = self.active.ok_or(RegistrationError::OutsideGroup { call })?;
        let id = self.tree.set_hook(group, kind, body);

        let timeout = self
            .pending
            .timeout
            .take()
            .or(self.tree.group(group).custom_timeout);
        self.tree.test_mut(id).custom_timeout = timeout;

        Ok(HookHandle::new(self, id))
    }

    /// Execute every selected test and report through `reporter`
    pub async fn run(&mut self, reporter: &mut dyn Reporter) -> RunReport {
        let runner = Runner::new(self.default_timeout);
        let (report, failed) = runner.run(&mut self.tree, reporter).await;
        self.failed = failed;
        report
    }

    pub(crate) fn tree_mut(&mut self) -> &mut TestTree {
        &mut self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_group_is_rejected() {
        let mut t = Eltro::new();
        let err = t.test("loose", || ()).unwrap_err();
        assert_eq!(err, RegistrationError::OutsideGroup { call: "test" });

        assert!(t.before(TestBody::sync(|| ())).is_err());
        assert!(t.after(TestBody::sync(|| ())).is_err());
    }

    #[test]
    fn test_describe_nests_and_restores_active_group() {
        let mut t = Eltro::new();
        t.describe("outer", |t| {
            t.describe("inner", |t| {
                t.test("deep", || ())?;
                Ok(())
            })?;
            t.test("shallow", || ())?;
            Ok(())
        })
        .unwrap();

        assert!(t.tree().find_test("outer inner deep").is_some());
        assert!(t.tree().find_test("outer shallow").is_some());
        assert!(t.test("after", || ()).is_err());
    }

    #[test]
    fn test_describe_restores_active_group_on_error() {
        let mut t = Eltro::new();
        t.set_filename("file.rs");
        let result = t.describe("broken", |t| {
            t.reset_filename();
            t.test("nope", || ())?;
            Ok(())
        });
        assert!(result.is_err());
        assert!(t.test("still in file", || ()).is_ok());
    }

    #[test]
    fn test_pending_modifiers_apply_once() {
        let mut t = Eltro::new();
        t.describe("g", |t| {
            t.timeout(50).skip().test("first", || ())?;
            t.test("second", || ())?;
            Ok(())
        })
        .unwrap();

        let tree = t.tree();
        let first = tree.test(tree.find_test("g first").unwrap());
        let second = tree.test(tree.find_test("g second").unwrap());
        assert!(first.skip);
        assert_eq!(first.custom_timeout, Some(50));
        assert!(!second.skip);
        assert_eq!(second.custom_timeout, None);
    }

    #[test]
    fn test_pending_only_ignored_when_skipped() {
        let mut t = Eltro::new();
        t.describe("g", |t| {
            t.only().skip().test("both", || ())?;
            t.test("plain", || ())?;
            Ok(())
        })
        .unwrap();

        let tree = t.tree();
        let both = tree.test(tree.find_test("g both").unwrap());
        assert!(both.skip);
        assert!(!both.is_exclusive);
        assert!(!tree.has_exclusive());
    }

    #[test]
    fn test_group_timeout_is_inherited() {
        let mut t = Eltro::new();
        t.timeout(300)
            .describe("slow", |t| {
                t.describe("slower", |t| {
                    t.test("inherits", || ())?;
                    t.timeout(10).test("overrides", || ())?;
                    t.before(TestBody::sync(|| ()))?;
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();

        let tree = t.tree();
        let inherits = tree.test(tree.find_test("slow slower inherits").unwrap());
        let overrides = tree.test(tree.find_test("slow slower overrides").unwrap());
        let slower = tree.group(tree.find_group("slow slower").unwrap());
        assert_eq!(inherits.custom_timeout, Some(300));
        assert_eq!(overrides.custom_timeout, Some(10));
        assert_eq!(tree.test(slower.before.unwrap()).custom_timeout, Some(300));
    }

    #[test]
    fn test_handle_only_propagates() {
        let mut t = Eltro::new();
        t.describe("g", |t| {
            t.test("a", || ())?.only();
            t.test("b", || ())?;
            Ok(())
        })
        .unwrap();

        let tree = t.tree();
        assert!(tree.has_exclusive());
        assert!(tree.group(tree.find_group("g").unwrap()).has_exclusive);
        assert!(tree.test(tree.find_test("g a").unwrap()).is_exclusive);
        assert!(!tree.test(tree.find_test("g b").unwrap()).is_exclusive);
    }

    #[test]
    fn test_only_inside_skipped_group_does_not_leak() {
        let mut t = Eltro::new();
        t.skip()
            .describe("skipped", |t| {
                t.only().test("wants focus", || ())?;
                Ok(())
            })
            .unwrap();

        assert!(!t.tree().has_exclusive());
    }

    #[test]
    fn test_set_filename_reuses_group() {
        let mut t = Eltro::new();
        t.set_filename("test/a.rs");
        t.test("one", || ()).unwrap();
        t.reset_filename();
        t.set_filename("test/a.rs");
        t.test("two", || ()).unwrap();
        t.reset_filename();

        let tree = t.tree();
        assert_eq!(tree.roots().len(), 1);
        assert!(tree.find_test("test/a.rs: one").is_some());
        assert!(tree.find_test("test/a.rs: two").is_some());
    }

    #[test]
    fn test_begin_twice_is_noop() {
        let mut t = Eltro::new();
        t.begin();
        t.set_filename("x");
        t.test("kept", || ()).unwrap();
        t.begin();

        assert!(t.is_started());
        assert!(t.tree().find_test("x: kept").is_some());

        t.reset();
        assert!(!t.is_started());
        assert!(t.tree().is_empty());
        t.begin();
        assert!(t.is_started());
    }

    #[test]
    fn test_default_timeout_ignores_zero() {
        let mut t = Eltro::new().with_default_timeout(500);
        assert_eq!(t.default_timeout(), 500);
        t.set_default_timeout(0);
        assert_eq!(t.default_timeout(), 500);
    }
}
