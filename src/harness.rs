//! Command-line harness
//!
//! Test files cannot be loaded at runtime, so a test binary registers each
//! file's suite function up front and lets the harness pick the ones the
//! command line selects:
//!
//! ```no_run
//! use eltro::{Eltro, Harness, RegistrationError};
//!
//! fn math(t: &mut Eltro) -> Result<(), RegistrationError> {
//!     t.describe("Math", |t| {
//!         t.test("adds", || assert_eq!(1 + 1, 2))?;
//!         Ok(())
//!     })?;
//!     Ok(())
//! }
//!
//! fn main() {
//!     Harness::new().suite("test/math.test.rs", math).main()
//! }
//! ```

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::cli::Args;
use crate::config::{EltroConfig, EnvConfig};
use crate::discovery::FileSelector;
use crate::error::{HarnessError, RegistrationError, Result};
use crate::models::RunReport;
use crate::output::{Reporter, ReporterKind};
use crate::registry::Eltro;
use crate::utils::{init_logger, LogLevel};

/// Registration function for one test file
pub type SuiteFn = Box<dyn Fn(&mut Eltro) -> std::result::Result<(), RegistrationError>>;

/// Settings for one harness run, after merging CLI, environment and file
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    pub targets: Vec<String>,
    pub reporter: ReporterKind,
    pub timeout_ms: u64,
    pub color: bool,
    pub log_level: Option<LogLevel>,
}

impl RunOptions {
    /// Command-line flags win over the resolved configuration
    pub fn from_args(args: &Args, config: &EltroConfig) -> Result<Self> {
        let reporter = match args.reporter {
            Some(kind) => kind,
            None => config
                .reporter_kind()
                .map_err(|e| HarnessError::Config(e.to_string()))?,
        };
        let targets = if args.targets.is_empty() {
            config.targets.clone()
        } else {
            args.targets.clone()
        };
        let log_level = if args.verbose {
            Some(LogLevel::Debug)
        } else {
            config.log_level
        };

        Ok(Self {
            targets,
            reporter,
            timeout_ms: args.timeout.unwrap_or(config.timeout_ms),
            color: config.color && !args.no_color,
            log_level,
        })
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        let config = EltroConfig::default();
        Self {
            targets: config.targets,
            reporter: ReporterKind::default(),
            timeout_ms: config.timeout_ms,
            color: config.color,
            log_level: None,
        }
    }
}

/// Maps test file paths to their registration functions
pub struct Harness {
    suites: Vec<(String, SuiteFn)>,
    root: PathBuf,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            suites: Vec::new(),
            root: PathBuf::new(),
        }
    }

    /// Resolve target patterns against `root` instead of the working directory
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Register the suite for the file at `path`
    pub fn suite<F>(mut self, path: impl AsRef<str>, register: F) -> Self
    where
        F: Fn(&mut Eltro) -> std::result::Result<(), RegistrationError> + 'static,
    {
        self.suites
            .push((normalize(path.as_ref()), Box::new(register)));
        self
    }

    pub fn suite_count(&self) -> usize {
        self.suites.len()
    }

    /// Run with the process arguments and exit with the resulting code
    pub fn main(self) -> ! {
        let code = self.run_with_args(std::env::args_os());
        std::process::exit(code)
    }

    /// Parse `args`, run, and return the process exit code.
    ///
    /// Test failures still exit with 0; only argument, configuration,
    /// discovery and registration problems produce 1.
    pub fn run_with_args<I, T>(&self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = match Args::try_parse_from(args) {
            Ok(args) => args,
            Err(e) => {
                let _ = e.print();
                return match e.kind() {
                    ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => 0,
                    _ => 1,
                };
            }
        };

        match self.run_args(&args) {
            Ok(_) => 0,
            Err(e) => {
                eprintln!("{e}");
                1
            }
        }
    }

    /// Resolve configuration for `args` and run with a stdout reporter
    pub fn run_args(&self, args: &Args) -> Result<RunReport> {
        let env = EnvConfig::load();
        let config = EltroConfig::resolve(args.config.as_deref(), &env)
            .map_err(|e| HarnessError::Config(format!("{e:#}")))?;
        let options = RunOptions::from_args(args, &config)?;

        if let Some(level) = options.log_level {
            init_logger(level);
        }

        let mut reporter = options.reporter.create(options.color);
        self.execute(&options, reporter.as_mut())
    }

    /// Select files, register their suites and run them on a fresh runtime
    pub fn execute(&self, options: &RunOptions, reporter: &mut dyn Reporter) -> Result<RunReport> {
        let mut eltro = self.register(options)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(eltro.run(reporter));
        // Sync bodies that missed their deadline may still hold blocking threads
        runtime.shutdown_background();

        info!(
            passed = report.stats.passed,
            failed = report.stats.failed,
            skipped = report.stats.skipped,
            "Run finished"
        );
        Ok(report)
    }

    /// Build the test tree for every file `options` selects
    pub fn register(&self, options: &RunOptions) -> Result<Eltro> {
        let files = FileSelector::new(&self.root).select(&options.targets)?;
        if files.is_empty() {
            return Err(HarnessError::NoFiles(options.targets.join(",")));
        }
        debug!(files = files.len(), "Selected test files");

        let mut eltro = Eltro::new().with_default_timeout(options.timeout_ms);
        eltro.begin();

        for file in files {
            let register = self
                .suites
                .iter()
                .find(|(path, _)| *path == file)
                .map(|(_, register)| register);
            let register = match register {
                Some(register) => register,
                None => {
                    warn!(file = %file, "No suite registered for selected file");
                    return Err(HarnessError::UnknownSuite(file));
                }
            };

            eltro.set_filename(&file);
            let result = register(&mut eltro);
            eltro.reset_filename();
            result.map_err(|source| HarnessError::Registration {
                file: file.clone(),
                source,
            })?;
        }

        Ok(eltro)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field(
                "suites",
                &self.suites.iter().map(|(p, _)| p).collect::<Vec<_>>(),
            )
            .field("root", &self.root)
            .finish()
    }
}

fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.strip_prefix("./").unwrap_or(&path).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Stats, TestBody};
    use crate::output::{ListReporter, SilentReporter};
    use std::fs;
    use tempfile::TempDir;

    fn math(t: &mut Eltro) -> std::result::Result<(), RegistrationError> {
        t.describe("Math", |t| {
            t.test("adds", || assert_eq!(1 + 1, 2))?;
            t.test("breaks", || Err::<(), _>("boom"))?;
            Ok(())
        })?;
        Ok(())
    }

    fn strings(t: &mut Eltro) -> std::result::Result<(), RegistrationError> {
        t.test("top-level", || ())?;
        t.after(TestBody::sync(|| ()))?;
        Ok(())
    }

    fn workspace(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for file in files {
            let path = tmp.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        tmp
    }

    fn options(targets: &[&str]) -> RunOptions {
        RunOptions {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            color: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_run_options_precedence() {
        let config = EltroConfig {
            timeout_ms: 700,
            reporter: "dot".to_string(),
            ..Default::default()
        };
        let args = Args::parse_from(["eltro", "-t", "50", "--no-color"]);
        let options = RunOptions::from_args(&args, &config).unwrap();

        assert_eq!(options.timeout_ms, 50);
        assert_eq!(options.reporter, ReporterKind::Dot);
        assert_eq!(options.targets, vec!["test/**"]);
        assert!(!options.color);
        assert_eq!(options.log_level, None);
    }

    #[test]
    fn test_execute_selected_files() {
        let tmp = workspace(&["test/math.test.rs", "test/strings.test.rs"]);
        let harness = Harness::new()
            .root(tmp.path())
            .suite("./test/math.test.rs", math)
            .suite("test/strings.test.rs", strings);

        let mut reporter = ListReporter::new(Vec::new(), false);
        let report = harness
            .execute(&options(&["test/*.rs"]), &mut reporter)
            .unwrap();

        assert_eq!(report.stats, Stats::new(2, 1, 0));
        assert!(report.outcome("test/math.test.rs: Math adds").is_some());
        assert!(report.outcome("test/strings.test.rs: top-level").is_some());
        assert!(report.outcome("After: test/strings.test.rs:").is_some());

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(output.contains("  test/math.test.rs: Math\n"));
        assert!(output.contains("    1) test/math.test.rs: Math breaks\n"));
        assert!(output.contains("  2 passing"));
    }

    #[test]
    fn test_execute_returns_after_sync_timeout() {
        let tmp = workspace(&["test/slow.test.rs"]);
        let harness = Harness::new()
            .root(tmp.path())
            .suite("test/slow.test.rs", |t| {
                t.timeout(50).test("sleeps", || {
                    std::thread::sleep(std::time::Duration::from_secs(3))
                })?;
                Ok(())
            });

        let timer = std::time::Instant::now();
        let report = harness
            .execute(&options(&["test/slow.test.rs"]), &mut SilentReporter)
            .unwrap();

        assert!(timer.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(report.stats, Stats::new(0, 1, 0));
        assert_eq!(
            report.failures[0].error.message,
            "timeout of 50ms exceeded. Ensure the done() callback is being called in this test."
        );
    }

    #[test]
    fn test_no_files_found() {
        let tmp = workspace(&["test/folder1/a.rs"]);
        let harness = Harness::new().root(tmp.path()).suite("test/folder1/a.rs", math);

        let err = harness
            .execute(&options(&["test/folder1/*.txt"]), &mut SilentReporter)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No files were found with pattern test/folder1/*.txt"
        );
    }

    #[test]
    fn test_unknown_suite() {
        let tmp = workspace(&["test/a.rs", "test/b.rs"]);
        let harness = Harness::new().root(tmp.path()).suite("test/a.rs", math);

        let err = harness
            .execute(&options(&["test/"]), &mut SilentReporter)
            .unwrap_err();
        assert!(matches!(err, HarnessError::UnknownSuite(ref f) if f == "test/b.rs"));
    }

    #[test]
    fn test_registration_error() {
        let tmp = workspace(&["test/a.rs"]);
        let harness = Harness::new().root(tmp.path()).suite("test/a.rs", |t| {
            t.reset_filename();
            t.test("orphan", || ())?;
            Ok(())
        });

        let err = harness
            .execute(&options(&["test/a.rs"]), &mut SilentReporter)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Registration { .. }));
    }

    #[test]
    fn test_exit_codes() {
        let tmp = workspace(&["test/math.test.rs"]);
        let harness = Harness::new()
            .root(tmp.path())
            .suite("test/math.test.rs", math);

        assert_eq!(harness.run_with_args(["eltro", "--asdf"]), 1);
        assert_eq!(harness.run_with_args(["eltro", "-r"]), 1);
        assert_eq!(harness.run_with_args(["eltro", "--no-color", "nothing/*.rs"]), 1);
        // Failing tests do not change the exit code
        assert_eq!(
            harness.run_with_args(["eltro", "-r", "dot", "--no-color", "test/math.test.rs"]),
            0
        );
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./test/a.rs"), "test/a.rs");
        assert_eq!(normalize("test\\a.rs"), "test/a.rs");
    }
}
