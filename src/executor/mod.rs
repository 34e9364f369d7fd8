//! Test execution engine
//!
//! Provides the sequential tree walk and the timeout-bound settlement of a
//! single test body.

mod runner;
mod settle;

pub use runner::Runner;
pub use settle::{settle, Settlement};
