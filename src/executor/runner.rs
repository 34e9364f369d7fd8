//! Test execution runner
//!
//! Walks the group tree in declaration order, applying the skip and
//! exclusivity filters, running hooks around each group and settling every
//! test strictly one at a time.

use futures::future::{FutureExt, LocalBoxFuture};
use std::time::Duration;
use tracing::{debug, info};

use super::settle::settle;
use crate::models::{
    FailedTest, GroupId, RunReport, Stats, TestId, TestKind, TestOutcome, TestStatus, TestTree,
};
use crate::output::Reporter;
use crate::utils::Timer;

/// Sequential test runner
#[derive(Clone, Copy, Debug)]
pub struct Runner {
    default_timeout_ms: u64,
}

impl Runner {
    pub fn new(default_timeout_ms: u64) -> Self {
        Self { default_timeout_ms }
    }

    /// Run every selected test in `tree`.
    ///
    /// Individual failures never abort the run. Returns the report and the
    /// ids of failed tests and hooks in the order they failed.
    pub async fn run(
        &self,
        tree: &mut TestTree,
        reporter: &mut dyn Reporter,
    ) -> (RunReport, Vec<TestId>) {
        info!(
            groups = tree.roots().len(),
            exclusive = tree.has_exclusive(),
            "Starting test run"
        );
        reporter.run_started();

        let timer = Timer::start("test run");
        let roots = tree.roots().to_vec();
        let mut execution = Execution {
            tree,
            reporter,
            default_timeout_ms: self.default_timeout_ms,
            stats: Stats::default(),
            outcomes: Vec::new(),
            failures: Vec::new(),
            failed: Vec::new(),
        };

        for root in roots {
            if execution.tree.root_eligible(root) {
                execution.run_group(root).await;
            } else {
                debug!(group = %execution.tree.group(root).name, "Group not selected");
            }
        }

        let duration_ms = timer.stop();
        let Execution {
            reporter,
            stats,
            outcomes,
            failures,
            failed,
            ..
        } = execution;

        let report = RunReport {
            stats,
            duration_ms,
            outcomes,
            failures,
        };

        info!(
            "Test run completed in {}ms - {}",
            report.duration_ms, report.stats
        );
        reporter.run_finished(&report);

        (report, failed)
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new(crate::registry::DEFAULT_TIMEOUT_MS)
    }
}

/// State of one traversal; only ever touched between awaits
struct Execution<'r> {
    tree: &'r mut TestTree,
    reporter: &'r mut dyn Reporter,
    default_timeout_ms: u64,
    stats: Stats,
    outcomes: Vec<TestOutcome>,
    failures: Vec<FailedTest>,
    failed: Vec<TestId>,
}

impl Execution<'_> {
    fn run_group(&mut self, id: GroupId) -> LocalBoxFuture<'_, ()> {
        async move {
            let group = self.tree.group(id);
            let name = group.name.clone();
            let tests = group.tests.clone();
            let children = group.groups.clone();
            let (before, after) = (group.before, group.after);

            if !tests.is_empty() {
                self.reporter.group_started(&name, tests.len());
            }

            if let Some(hook) = before {
                if !self.run_test(hook).await {
                    debug!(group = %name, "Before hook failed, skipping rest of group");
                    return;
                }
            }

            for test in tests {
                if self.tree.test_selected(id, test) {
                    self.run_test(test).await;
                }
            }

            for child in children {
                if self.tree.child_group_eligible(id, child) {
                    self.run_group(child).await;
                }
            }

            if let Some(hook) = after {
                self.run_test(hook).await;
            }
        }
        .boxed_local()
    }

    /// Settle one test or hook. Returns false only when it failed.
    async fn run_test(&mut self, id: TestId) -> bool {
        let node = self.tree.test(id);
        let name = node.name.clone();
        let kind = node.kind;

        if node.skip && kind == TestKind::Test {
            debug!(test = %name, "Skipped");
            self.stats.record(TestStatus::Skipped);
            let outcome = TestOutcome::skip(name);
            self.reporter.test_finished(&outcome, None);
            self.outcomes.push(outcome);
            return true;
        }

        let limit_ms = node
            .custom_timeout
            .or(self.tree.group(node.group).custom_timeout)
            .filter(|ms| *ms > 0)
            .unwrap_or(self.default_timeout_ms);
        let body = node.body.clone();

        self.reporter.test_started(&name, kind);
        let timer = Timer::start(name.as_str());
        let settlement = settle(&body, Duration::from_millis(limit_ms)).await;
        let duration_ms = timer.elapsed_ms();

        let error = settlement.into_error(kind, limit_ms);
        self.tree.test_mut(id).error = error.clone();

        let (outcome, failure_number) = match error {
            None => {
                debug!(test = %name, duration_ms, "Passed");
                (TestOutcome::pass(name, kind, duration_ms), None)
            }
            Some(err) => {
                debug!(test = %name, duration_ms, error = %err, "Failed");
                self.failures.push(FailedTest {
                    name: name.clone(),
                    kind,
                    error: err.clone(),
                });
                self.failed.push(id);
                (
                    TestOutcome::fail(name, kind, duration_ms, err),
                    Some(self.failures.len()),
                )
            }
        };

        if kind == TestKind::Test {
            self.stats.record(outcome.status);
        }
        let passed = outcome.status.is_success();
        self.reporter.test_finished(&outcome, failure_number);
        self.outcomes.push(outcome);
        passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TestBody;
    use crate::output::SilentReporter;

    fn tree_with(bodies: Vec<(&str, TestBody)>) -> TestTree {
        let mut tree = TestTree::new();
        let root = tree.add_group(None, "root");
        for (name, body) in bodies {
            tree.add_test(root, name, body);
        }
        tree
    }

    #[tokio::test]
    async fn test_runner_counts_outcomes() {
        let mut tree = tree_with(vec![
            ("ok", TestBody::sync(|| ())),
            ("bad", TestBody::sync(|| Err::<(), _>("nope"))),
        ]);
        let ok = tree.find_test("root ok").unwrap();
        let extra = tree.add_test(tree.roots()[0], "later", TestBody::sync(|| ()));
        tree.test_mut(extra).skip = true;

        let (report, failed) = Runner::default().run(&mut tree, &mut SilentReporter).await;

        assert_eq!(report.stats, Stats::new(1, 1, 1));
        assert_eq!(failed.len(), 1);
        assert!(tree.test(ok).error.is_none());
        assert!(tree.test(failed[0]).error.is_some());
        assert_eq!(report.failures[0].name, "root bad");
    }

    #[tokio::test]
    async fn test_runner_uses_default_timeout() {
        let mut tree = tree_with(vec![(
            "hangs",
            TestBody::callback(|_done| {}),
        )]);

        let (report, _) = Runner::new(20).run(&mut tree, &mut SilentReporter).await;

        let error = report.failures[0].error.clone();
        assert!(error.is_timeout());
        assert!(error.message.contains("timeout of 20ms"));
    }

    #[tokio::test]
    async fn test_runner_group_timeout_applies() {
        let mut tree = tree_with(vec![(
            "hangs",
            TestBody::callback(|_done| {}),
        )]);
        let root = tree.roots()[0];
        tree.group_mut(root).custom_timeout = Some(15);

        let (report, _) = Runner::new(5_000).run(&mut tree, &mut SilentReporter).await;

        assert!(report.failures[0].error.message.contains("timeout of 15ms"));
    }
}
