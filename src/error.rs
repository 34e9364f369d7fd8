//! Structural errors
//!
//! Test failures are not errors; they are recorded on the test and reported.
//! These types cover misuse of the registration API and harness plumbing.

use thiserror::Error;

/// Misuse of the registration API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Tests outside groups are not allowed. (`{call}` called with no active group)")]
    OutsideGroup { call: &'static str },
}

/// Failures of the host harness around a run
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("No files were found with pattern {0}")]
    NoFiles(String),

    #[error("No suite registered for file: {0}")]
    UnknownSuite(String),

    #[error("Error while registering tests from {file}: {source}")]
    Registration {
        file: String,
        #[source]
        source: RegistrationError,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T, E = HarnessError> = std::result::Result<T, E>;
