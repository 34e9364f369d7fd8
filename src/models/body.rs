//! Test bodies and the values they settle with
//!
//! A body is declared in one of three calling conventions, chosen at
//! registration time: synchronous, future-returning, or callback-style with
//! an explicit [`Done`] handle.

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::any::Any;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::test_result::{ErrorKind, TestError, TestKind};

/// What a body settles with
pub type BodyResult = Result<(), Rejection>;

/// A failed settlement, before normalization into a [`TestError`]
#[derive(Debug)]
pub enum Rejection {
    /// An error-shaped failure
    Error(anyhow::Error),
    /// The body panicked; carries the panic payload text
    Panic(String),
    /// A plain value was rejected
    Value(serde_json::Value),
    /// A plain value that could not be turned into JSON
    Unserializable { repr: String, reason: String },
}

impl Rejection {
    /// Reject with an arbitrary serializable value
    pub fn value<T: Serialize + Debug>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Rejection::Value(v),
            Err(e) => Rejection::Unserializable {
                repr: format!("{value:?}"),
                reason: e.to_string(),
            },
        }
    }

    /// Reject without any value at all
    pub fn empty() -> Self {
        Rejection::Value(serde_json::Value::Null)
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        Rejection::Panic(panic_payload_as_string(payload))
    }

    /// Normalize into the error stored on a test.
    ///
    /// Falsy values become `"<label> promise rejected with empty message"`,
    /// other plain values are embedded as JSON and kept in `original`.
    pub fn into_test_error(self, kind: TestKind) -> TestError {
        let label = kind.label();
        match self {
            Rejection::Error(err) => {
                let causes = err.chain().skip(1).map(|c| c.to_string()).collect();
                TestError::new(ErrorKind::Failure, err.to_string()).with_causes(causes)
            }
            Rejection::Panic(message) => TestError::new(ErrorKind::Panic, message),
            Rejection::Value(value) if is_falsy(&value) => TestError::new(
                ErrorKind::Failure,
                format!("{label} promise rejected with empty message"),
            ),
            Rejection::Value(value) => TestError::new(
                ErrorKind::Failure,
                format!("{label} promise rejected with {value}"),
            )
            .with_original(value),
            Rejection::Unserializable { repr, reason } => TestError::new(
                ErrorKind::Failure,
                format!("{label} promise rejected with {repr} (Error stringifying: {reason})"),
            )
            .with_original(serde_json::Value::String(repr)),
        }
    }
}

fn is_falsy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert a panic payload into a string.
///
/// Matches the payload types produced by `panic!` (`&'static str` and
/// `String`); anything else becomes a generic placeholder.
pub(crate) fn panic_payload_as_string(payload: Box<dyn Any + Send + 'static>) -> String {
    payload
        .downcast::<&'static str>()
        .map(|s| s.to_string())
        .or_else(|payload| payload.downcast::<String>().map(|s| *s))
        .unwrap_or_else(|_| String::from("Box<dyn Any>"))
}

impl From<anyhow::Error> for Rejection {
    fn from(err: anyhow::Error) -> Self {
        Rejection::Error(err)
    }
}

impl From<std::io::Error> for Rejection {
    fn from(err: std::io::Error) -> Self {
        Rejection::Error(err.into())
    }
}

impl From<serde_json::Value> for Rejection {
    fn from(value: serde_json::Value) -> Self {
        Rejection::Value(value)
    }
}

impl From<String> for Rejection {
    fn from(value: String) -> Self {
        Rejection::Value(serde_json::Value::String(value))
    }
}

impl From<&str> for Rejection {
    fn from(value: &str) -> Self {
        Rejection::Value(serde_json::Value::String(value.to_string()))
    }
}

/// Anything a body may return
pub trait IntoBodyResult {
    fn into_body_result(self) -> BodyResult;
}

impl IntoBodyResult for () {
    fn into_body_result(self) -> BodyResult {
        Ok(())
    }
}

impl<E: Into<Rejection>> IntoBodyResult for Result<(), E> {
    fn into_body_result(self) -> BodyResult {
        self.map_err(Into::into)
    }
}

/// Completion handle handed to callback-style bodies.
///
/// Clones share one settlement: the first call to [`Done::ok`],
/// [`Done::fail`] or [`Done::finish`] wins and every later call is ignored.
/// Dropping all clones without settling leaves the test to time out.
#[derive(Clone)]
pub struct Done {
    tx: Arc<Mutex<Option<oneshot::Sender<BodyResult>>>>,
}

impl Done {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<BodyResult>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    /// Settle successfully
    pub fn ok(&self) {
        self.settle(Ok(()));
    }

    /// Settle with a failure
    pub fn fail(&self, err: impl Into<Rejection>) {
        self.settle(Err(err.into()));
    }

    /// Settle with whatever the caller computed
    pub fn finish<R: IntoBodyResult>(&self, result: R) {
        self.settle(result.into_body_result());
    }

    /// Whether a settlement has already been delivered
    pub fn is_settled(&self) -> bool {
        self.tx
            .lock()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }

    fn settle(&self, result: BodyResult) {
        let sender = match self.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(sender) = sender {
            // The engine may have stopped listening after a timeout
            let _ = sender.send(result);
        }
    }
}

impl Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("settled", &self.is_settled())
            .finish()
    }
}

pub type SyncBody = Arc<dyn Fn() -> BodyResult + Send + Sync>;
pub type AsyncBody = Arc<dyn Fn() -> BoxFuture<'static, BodyResult> + Send + Sync>;
pub type CallbackBody = Arc<dyn Fn(Done) + Send + Sync>;

/// A test or hook body in one of the three calling conventions
#[derive(Clone)]
pub enum TestBody {
    /// Runs to completion on invocation; passes as soon as it returns
    Sync(SyncBody),
    /// Returns a future that is awaited
    Async(AsyncBody),
    /// Receives a [`Done`] handle and settles through it
    Callback(CallbackBody),
}

impl TestBody {
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: IntoBodyResult,
    {
        Self::Sync(Arc::new(move || f().into_body_result()))
    }

    pub fn future<F, Fut, R>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoBodyResult,
    {
        Self::Async(Arc::new(move || {
            f().map(|r| r.into_body_result()).boxed()
        }))
    }

    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(Done) + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }
}

impl Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => write!(f, "Sync(...)"),
            Self::Async(_) => write!(f, "Async(...)"),
            Self::Callback(_) => write!(f, "Callback(...)"),
        }
    }
}
