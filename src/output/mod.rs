//! Output module
//!
//! Console reporters that render run events as they happen.

mod dot;
mod formatter;
mod list;
mod reporter;

pub use dot::DotReporter;
pub use formatter::ResultFormatter;
pub use list::ListReporter;
pub use reporter::{Reporter, ReporterKind, SilentReporter};
