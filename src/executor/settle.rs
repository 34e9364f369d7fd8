//! Timeout-bound execution of a single body
//!
//! Each calling convention is turned into one future that resolves with the
//! body's first settlement. That future races a deadline; whichever finishes
//! first decides the outcome and the loser is dropped.

use futures::future::{self, BoxFuture, FutureExt};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinError};
use tokio::time::{timeout_at, Instant};

use crate::models::{BodyResult, Done, Rejection, TestBody, TestError, TestKind};

/// How a single execution ended
#[derive(Debug)]
pub enum Settlement {
    Passed,
    Failed(Rejection),
    TimedOut,
}

impl Settlement {
    /// Normalize into the error stored on the test, `None` on success
    pub fn into_error(self, kind: TestKind, limit_ms: u64) -> Option<TestError> {
        match self {
            Settlement::Passed => None,
            Settlement::Failed(rejection) => Some(rejection.into_test_error(kind)),
            Settlement::TimedOut => Some(TestError::timeout(limit_ms)),
        }
    }
}

/// Run `body` once, waiting at most `limit` for it to settle.
///
/// A body still running when the deadline fires is not aborted: spawned
/// work keeps going detached and whatever it eventually produces is dropped.
pub async fn settle(body: &TestBody, limit: Duration) -> Settlement {
    let deadline = Instant::now() + limit;
    let pending = invoke(body);

    match timeout_at(deadline, pending).await {
        Ok(Ok(())) => Settlement::Passed,
        Ok(Err(rejection)) => Settlement::Failed(rejection),
        Err(_) => Settlement::TimedOut,
    }
}

/// Start the body and return a future for its first settlement
fn invoke(body: &TestBody) -> BoxFuture<'static, BodyResult> {
    match body {
        TestBody::Sync(f) => {
            let f = Arc::clone(f);
            let handle = task::spawn_blocking(move || f());
            async move { handle.await.unwrap_or_else(|e| Err(join_rejection(e))) }.boxed()
        }
        TestBody::Async(f) => match catch_unwind(AssertUnwindSafe(|| f())) {
            Ok(fut) => {
                let handle = tokio::spawn(fut);
                async move { handle.await.unwrap_or_else(|e| Err(join_rejection(e))) }.boxed()
            }
            Err(payload) => future::ready(Err(Rejection::from_panic(payload))).boxed(),
        },
        TestBody::Callback(f) => {
            let (done, mut rx) = Done::channel();
            match catch_unwind(AssertUnwindSafe(|| f(done))) {
                Ok(()) => async move {
                    match rx.await {
                        Ok(result) => result,
                        // Every handle dropped unsettled: only the deadline can end it
                        Err(_) => future::pending().await,
                    }
                }
                .boxed(),
                // A settlement delivered before the panic still wins
                Err(payload) => {
                    let result = rx
                        .try_recv()
                        .unwrap_or_else(|_| Err(Rejection::from_panic(payload)));
                    future::ready(result).boxed()
                }
            }
        }
    }
}

fn join_rejection(err: JoinError) -> Rejection {
    if err.is_panic() {
        Rejection::from_panic(err.into_panic())
    } else {
        Rejection::Error(anyhow::anyhow!("test task was cancelled"))
    }
}
