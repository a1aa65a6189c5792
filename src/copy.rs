//! Filtered recursive copy.
//!
//! Every copy into the aggregate tree goes through [`copy_filtered`]. It
//! mirrors a source directory into a destination, and for each file decides
//! one [`CopyOutcome`]:
//!
//! 1. **Ignored**: the name is in the ignore set (`.git`, `desktop.ini`, ...).
//!    An ignored directory skips its whole subtree and is recorded once.
//! 2. **Filtered**: the caller's predicate rejected the file.
//! 3. **TooLarge**: the file exceeds the size ceiling.
//! 4. **Copied**: contents copied, modification time carried over.
//! 5. **Failed**: any I/O error on that entry.
//!
//! A copy never returns an error. Failures are data in the [`CopyReport`], so
//! one unreadable file costs exactly that file and callers (and tests) can see
//! why something is missing from the output.

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Why a file did or did not reach the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied {
        bytes: u64,
        /// Set when the contents landed but the source modification time
        /// could not be carried over.
        #[serde(skip_serializing_if = "Option::is_none")]
        timestamp_error: Option<String>,
    },
    Ignored,
    Filtered,
    TooLarge { size: u64 },
    Failed { error: String },
}

/// One decided entry, with its path relative to the copy source.
#[derive(Debug, Clone, Serialize)]
pub struct CopyEntry {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: CopyOutcome,
}

/// Everything a single [`copy_filtered`] call decided.
#[derive(Debug, Clone, Serialize)]
pub struct CopyReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub entries: Vec<CopyEntry>,
}

impl CopyReport {
    fn new(source: &Path, destination: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            entries: Vec::new(),
        }
    }

    fn record(&mut self, path: PathBuf, outcome: CopyOutcome) {
        self.entries.push(CopyEntry { path, outcome });
    }

    pub fn copied(&self) -> usize {
        self.count(|o| matches!(o, CopyOutcome::Copied { .. }))
    }

    /// Entries left out on purpose (ignored, filtered, or too large).
    pub fn skipped(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                CopyOutcome::Ignored | CopyOutcome::Filtered | CopyOutcome::TooLarge { .. }
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, CopyOutcome::Failed { .. }))
    }

    pub fn bytes_copied(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| match e.outcome {
                CopyOutcome::Copied { bytes, .. } => bytes,
                _ => 0,
            })
            .sum()
    }

    /// Outcome recorded for a source-relative path, if any.
    pub fn outcome_of(&self, path: impl AsRef<Path>) -> Option<&CopyOutcome> {
        let path = path.as_ref();
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CopyEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, CopyOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&CopyOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}

/// Fixed rules applied to every file of one copy.
#[derive(Debug, Clone, Copy)]
pub struct CopyRules<'a> {
    /// Names skipped outright (files and directories).
    pub ignored_names: &'a [String],
    /// Size ceiling in bytes; larger files are never copied.
    pub max_file_size: u64,
}

/// Recursively mirror `src` into `dst`.
///
/// `accept` is consulted for every file that is not ignored; returning `false`
/// records [`CopyOutcome::Filtered`]. A missing `src` produces an empty report.
pub fn copy_filtered(
    src: &Path,
    dst: &Path,
    rules: CopyRules<'_>,
    accept: Option<&dyn Fn(&Path) -> bool>,
) -> CopyReport {
    let mut report = CopyReport::new(src, dst);
    if !src.is_dir() {
        return report;
    }

    if let Err(e) = fs::create_dir_all(dst) {
        report.record(PathBuf::new(), failed(e));
        return report;
    }

    let is_ignored = |name: &std::ffi::OsStr| {
        let name = name.to_string_lossy();
        rules.ignored_names.iter().any(|n| *n == name)
    };

    let mut walker = WalkDir::new(src)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(next) = walker.next() {
        let entry = match next {
            Ok(entry) => entry,
            Err(e) => {
                let rel = e
                    .path()
                    .and_then(|p| p.strip_prefix(src).ok())
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                report.record(rel, failed(e.into()));
                continue;
            }
        };

        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let target = dst.join(&rel);

        if is_ignored(entry.file_name()) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            report.record(rel, CopyOutcome::Ignored);
            continue;
        }

        if entry.file_type().is_dir() {
            if let Err(e) = fs::create_dir_all(&target) {
                // Nothing below can land; record the directory and move on.
                walker.skip_current_dir();
                report.record(rel, failed(e));
            }
            continue;
        }

        if accept.is_some_and(|accept| !accept(entry.path())) {
            report.record(rel, CopyOutcome::Filtered);
            continue;
        }

        let outcome = match entry.metadata() {
            Ok(meta) if meta.len() > rules.max_file_size => {
                CopyOutcome::TooLarge { size: meta.len() }
            }
            Ok(_) => copy_preserving_mtime(entry.path(), &target).unwrap_or_else(failed),
            Err(e) => failed(e.into()),
        };
        report.record(rel, outcome);
    }

    report
}

/// Build an `accept` predicate rejecting the given extensions, case-insensitively.
///
/// Extensions are given with their leading dot (`".mp4"`).
pub fn reject_extensions(extensions: &[String]) -> impl Fn(&Path) -> bool + '_ {
    move |path: &Path| match extension_with_dot(path) {
        Some(ext) => !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)),
        None => true,
    }
}

/// Lowercased extension with its leading dot, e.g. `".mp4"`.
pub fn extension_with_dot(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
}

/// Copy contents, then carry the source mtime over.
///
/// Setting the time needs a handle with write access on Windows. A copied
/// file that is read-only on Unix still accepts the change through a read
/// handle, so that is the fallback. A timestamp failure does not undo the
/// copy; it is recorded on the outcome.
fn copy_preserving_mtime(src: &Path, dst: &Path) -> io::Result<CopyOutcome> {
    let bytes = fs::copy(src, dst)?;
    let timestamp_error = fs::metadata(src)
        .and_then(|m| m.modified())
        .and_then(|modified| {
            let file = fs::File::options()
                .write(true)
                .open(dst)
                .or_else(|_| fs::File::open(dst))?;
            file.set_modified(modified)
        })
        .err()
        .map(|e| e.to_string());
    Ok(CopyOutcome::Copied {
        bytes,
        timestamp_error,
    })
}

fn failed(e: io::Error) -> CopyOutcome {
    CopyOutcome::Failed {
        error: e.to_string(),
    }
}
