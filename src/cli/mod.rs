//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::output::ReporterKind;

/// Run registered test suites
#[derive(Parser, Debug)]
#[command(name = "eltro")]
#[command(version)]
#[command(about = "Tiny sequential test runner")]
#[command(after_help = "Examples:\n  eltro\n  eltro test/mytest.rs\n  eltro -r dot test/**/*.test.rs")]
pub struct Args {
    /// Files, directories or patterns to run (`*` and `**` supported)
    pub targets: Vec<String>,

    /// Reporter to use
    #[arg(short, long, value_enum)]
    pub reporter: Option<ReporterKind>,

    /// Default per-test timeout in milliseconds
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Disable ANSI colors
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
