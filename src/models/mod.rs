//! Data models for the test engine
//!
//! The group/test arena, test bodies, and the results a run produces.

mod body;
mod test_result;
mod tree;

pub use body::{
    AsyncBody, BodyResult, CallbackBody, Done, IntoBodyResult, Rejection, SyncBody, TestBody,
};
pub use test_result::{
    ErrorKind, FailedTest, RunReport, Stats, TestError, TestKind, TestOutcome, TestStatus,
};
pub use tree::{GroupId, GroupNode, TestId, TestNode, TestTree};
