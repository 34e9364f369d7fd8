//! Test file discovery
//!
//! Expands target patterns into the list of files to load. A pattern is
//! split on `/` and walked one segment at a time:
//!
//! - `**` matches zero or more directory levels
//! - a segment containing `*` matches entries of one directory by name
//! - anything else must name an existing entry
//!
//! A pattern that ends on a directory (literally, or with a trailing `/`)
//! selects every file below it. A wildcard in last position selects files
//! only.

mod pattern;

pub use pattern::file_matches;

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::utils::Timer;
use pattern::is_wildcard;

/// Resolves target patterns relative to a root directory
#[derive(Clone, Debug)]
pub struct FileSelector {
    root: PathBuf,
}

impl FileSelector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Selector rooted at the working directory
    pub fn current_dir() -> Self {
        Self::new(PathBuf::new())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expand every pattern, keeping the first occurrence of each file.
    ///
    /// Returned paths are relative to the root and use `/` separators.
    pub fn select<S: AsRef<str>>(&self, patterns: &[S]) -> io::Result<Vec<String>> {
        let timer = Timer::start("file discovery");
        let mut files = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let before = files.len();
            self.expand(pattern, &mut files)?;
            debug!(pattern, matched = files.len() - before, "Expanded target");
        }

        let mut seen = std::collections::HashSet::new();
        files.retain(|f| seen.insert(f.clone()));

        debug!(files = files.len(), "Discovery completed in {}ms", timer.elapsed_ms());
        Ok(files)
    }

    fn expand(&self, pattern: &str, out: &mut Vec<String>) -> io::Result<()> {
        let trailing_slash = pattern.ends_with('/');
        let segments: Vec<&str> = pattern
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        let prefix = if pattern.starts_with('/') { "/" } else { "" };
        let walk = Walk {
            root: &self.root,
            trailing_slash,
        };
        walk.segments(prefix, &segments, out)
    }
}

impl Default for FileSelector {
    fn default() -> Self {
        Self::current_dir()
    }
}

/// Select files matching `patterns` below the working directory
pub fn select_files<S: AsRef<str>>(patterns: &[S]) -> io::Result<Vec<String>> {
    FileSelector::current_dir().select(patterns)
}

struct Walk<'a> {
    root: &'a Path,
    trailing_slash: bool,
}

impl Walk<'_> {
    /// Match `segments` against the directory at relative path `dir`
    fn segments(&self, dir: &str, segments: &[&str], out: &mut Vec<String>) -> io::Result<()> {
        let (segment, rest) = match segments.split_first() {
            Some(split) => split,
            None => return self.all_files(dir, out),
        };
        let last = rest.is_empty();

        if *segment == "**" {
            if last {
                return self.all_files(dir, out);
            }
            for sub in self.subdirectories(dir)? {
                self.segments(&sub, rest, out)?;
            }
            return Ok(());
        }

        if is_wildcard(segment) {
            for (name, is_dir) in self.entries(dir)? {
                if !file_matches(&name, segment) {
                    continue;
                }
                let path = join(dir, &name);
                if last && !self.trailing_slash {
                    if !is_dir {
                        out.push(path);
                    }
                } else if is_dir {
                    self.segments(&path, rest, out)?;
                }
            }
            return Ok(());
        }

        let path = join(dir, segment);
        let disk = self.disk_path(&path);
        if disk.is_dir() {
            self.segments(&path, rest, out)
        } else {
            if last && !self.trailing_slash && disk.is_file() {
                out.push(path);
            }
            Ok(())
        }
    }

    /// Every file below `dir`, recursively, sorted by name per directory
    fn all_files(&self, dir: &str, out: &mut Vec<String>) -> io::Result<()> {
        let disk = self.disk_path(dir);
        if !disk.is_dir() {
            return Ok(());
        }

        for entry in WalkDir::new(&disk).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_file() {
                out.push(join(dir, &relative(&disk, entry.path())));
            }
        }
        Ok(())
    }

    /// `dir` itself followed by every directory below it
    fn subdirectories(&self, dir: &str) -> io::Result<Vec<String>> {
        let disk = self.disk_path(dir);
        if !disk.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in WalkDir::new(&disk).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                dirs.push(join(dir, &relative(&disk, entry.path())));
            }
        }
        Ok(dirs)
    }

    /// Direct children of `dir` as `(name, is_dir)`, sorted by name
    fn entries(&self, dir: &str) -> io::Result<Vec<(String, bool)>> {
        let disk = self.disk_path(dir);
        if !disk.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&disk)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push((name, entry.file_type().is_dir()));
        }
        Ok(entries)
    }

    fn disk_path(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            if self.root.as_os_str().is_empty() {
                PathBuf::from(".")
            } else {
                self.root.to_path_buf()
            }
        } else {
            self.root.join(relative)
        }
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else if name.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// `path` relative to `base`, with `/` separators
fn relative(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sample_tree() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("test/folder1")).unwrap();
        fs::create_dir_all(root.join("test/folder2")).unwrap();
        for file in [
            "test/cli.test.mjs",
            "test/eltro.test.mjs",
            "test/folder1/sampletest1.temp.mjs",
            "test/folder1/sampletest2.temp.mjs",
            "test/folder2/sampletest3.temp.mjs",
            "test/folder2/sampletest4.temp.mjs",
            "test/folder2/sampletest5.temp.txt",
        ] {
            fs::write(root.join(file), "").unwrap();
        }
        tmp
    }

    fn select(tmp: &TempDir, pattern: &str) -> Vec<String> {
        FileSelector::new(tmp.path()).select(&[pattern]).unwrap()
    }

    #[test]
    fn test_no_match_is_empty() {
        let tmp = sample_tree();
        assert!(select(&tmp, "test/folder1/*.txt").is_empty());
        assert!(select(&tmp, "missing/**").is_empty());
    }

    #[test]
    fn test_single_file() {
        let tmp = sample_tree();
        assert_eq!(
            select(&tmp, "test/folder1/sampletest1.temp.mjs"),
            vec!["test/folder1/sampletest1.temp.mjs"]
        );
    }

    #[test]
    fn test_directory_selects_all_files() {
        let tmp = sample_tree();
        let expected = vec![
            "test/folder1/sampletest1.temp.mjs",
            "test/folder1/sampletest2.temp.mjs",
        ];
        assert_eq!(select(&tmp, "test/folder1/"), expected);
        assert_eq!(select(&tmp, "test/folder1"), expected);
        assert_eq!(select(&tmp, "*/folder1/"), expected);
    }

    #[test]
    fn test_star_selects_files_only() {
        let tmp = sample_tree();
        assert_eq!(
            select(&tmp, "test/*"),
            vec!["test/cli.test.mjs", "test/eltro.test.mjs"]
        );
        assert_eq!(select(&tmp, "test/*.test.mjs").len(), 2);
    }

    #[test]
    fn test_star_directory_segment() {
        let tmp = sample_tree();
        let expected = vec![
            "test/folder1/sampletest1.temp.mjs",
            "test/folder1/sampletest2.temp.mjs",
            "test/folder2/sampletest3.temp.mjs",
            "test/folder2/sampletest4.temp.mjs",
        ];
        assert_eq!(select(&tmp, "test/*/*.mjs"), expected);
        assert_eq!(select(&tmp, "test/*/sampletest*.mjs"), expected);
    }

    #[test]
    fn test_double_star_with_file_pattern() {
        let tmp = sample_tree();
        let files = select(&tmp, "test/**/*.mjs");

        assert_eq!(files.len(), 6);
        assert_eq!(files[0], "test/cli.test.mjs");
        assert!(files.contains(&"test/folder2/sampletest4.temp.mjs".to_string()));
        assert!(!files.contains(&"test/folder2/sampletest5.temp.txt".to_string()));
    }

    #[test]
    fn test_double_star_end_selects_everything() {
        let tmp = sample_tree();
        let files = select(&tmp, "test/**");

        assert_eq!(files.len(), 7);
        assert!(files.contains(&"test/folder2/sampletest5.temp.txt".to_string()));
        assert!(files.contains(&"test/cli.test.mjs".to_string()));
    }

    #[test]
    fn test_overlapping_patterns_are_deduplicated() {
        let tmp = sample_tree();
        let files = FileSelector::new(tmp.path())
            .select(&["test/folder1/sampletest2.temp.mjs", "test/folder1/"])
            .unwrap();

        assert_eq!(
            files,
            vec![
                "test/folder1/sampletest2.temp.mjs",
                "test/folder1/sampletest1.temp.mjs",
            ]
        );
    }
}
