//! Aggregate tree hygiene validation.
//!
//! The deployable tree must contain only browser-servable assets, never
//! authoring sources. [`validate`] walks it after a build and collects every
//! violation instead of stopping at the first, so one run tells the author
//! everything to fix:
//!
//! - **Forbidden name**: a file whose exact name is listed (e.g.
//!   `presentation.json`, `Thumbs.db`).
//! - **Forbidden extension**: a file whose extension is listed (e.g. `.typ`,
//!   `.py`), matched case-insensitively. A file that already matched by name
//!   is not reported a second time.
//! - **Nested engine folder**: a lesson folder holding its own copy of an
//!   engine folder (`dist/lesson1/plugin/`), meaning shared assets were
//!   copied per lesson instead of once at the root.
//!
//! All rule sets come from [`HygieneConfig`]; adding a pattern never touches
//! the walk.

use crate::config::HygieneConfig;
use crate::copy::extension_with_dot;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum HygieneError {
    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: io::Error,
    },
}

/// A single rule breach, with the offending path as found under the walked root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    ForbiddenName { path: PathBuf },
    ForbiddenExtension { path: PathBuf, extension: String },
    NestedEngineFolder { lesson: PathBuf, folder: String },
    /// Part of the tree could not be read, so it was not checked.
    Unreadable { path: PathBuf, error: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ForbiddenName { path } => {
                write!(f, "FORBIDDEN: authoring file found in distribution: {}", path.display())
            }
            Violation::ForbiddenExtension { path, extension } => write!(
                f,
                "FORBIDDEN: {extension} file found in distribution: {}",
                path.display()
            ),
            Violation::NestedEngineFolder { lesson, folder } => write!(
                f,
                "FORBIDDEN: Duplicate engine folder '{folder}' found in: {}",
                lesson.display()
            ),
            Violation::Unreadable { path, error } => write!(
                f,
                "UNCHECKED: cannot read {} ({error})",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HygieneReport {
    /// Files examined by the walk.
    pub files_checked: usize,
    pub violations: Vec<Violation>,
}

impl HygieneReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum HygieneOutcome {
    /// The aggregate root does not exist; there is nothing to deploy.
    NoDist { path: PathBuf },
    Checked(HygieneReport),
}

impl HygieneOutcome {
    pub fn passed(&self) -> bool {
        match self {
            HygieneOutcome::NoDist { .. } => true,
            HygieneOutcome::Checked(report) => report.is_clean(),
        }
    }
}

/// Check the tree under `dist` against `rules`.
///
/// `reserved` lists the shared top-level folders (engine + global images)
/// that are exempt from the nested-folder check, together with
/// [`HygieneConfig::exempt_folders`]. A part of the tree that cannot be read
/// is reported as [`Violation::Unreadable`] and fails the check.
pub fn validate(
    dist: &Path,
    rules: &HygieneConfig,
    reserved: &[String],
) -> Result<HygieneOutcome, HygieneError> {
    if !dist.is_dir() {
        return Ok(HygieneOutcome::NoDist {
            path: dist.to_path_buf(),
        });
    }

    let mut report = HygieneReport::default();
    check_files(dist, rules, &mut report);
    check_nested_engine_folders(dist, rules, reserved, &mut report)?;
    Ok(HygieneOutcome::Checked(report))
}

/// Unreadable entries are recorded and the walk moves on to their siblings.
fn check_files(dist: &Path, rules: &HygieneConfig, report: &mut HygieneReport) {
    for entry in WalkDir::new(dist).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.violations.push(Violation::Unreadable {
                    path: e.path().unwrap_or(dist).to_path_buf(),
                    error: io::Error::from(e).to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        report.files_checked += 1;
        if let Some(violation) = file_violation(entry.path(), rules) {
            report.violations.push(violation);
        }
    }
}

/// The violation a single file commits, if any. Names take precedence over extensions.
pub fn file_violation(path: &Path, rules: &HygieneConfig) -> Option<Violation> {
    let name = path.file_name()?.to_string_lossy();
    if rules.forbidden_names.iter().any(|n| *n == name) {
        return Some(Violation::ForbiddenName {
            path: path.to_path_buf(),
        });
    }
    let extension = extension_with_dot(path)?;
    rules
        .forbidden_extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(&extension))
        .then(|| Violation::ForbiddenExtension {
            path: path.to_path_buf(),
            extension,
        })
}

fn check_nested_engine_folders(
    dist: &Path,
    rules: &HygieneConfig,
    reserved: &[String],
    report: &mut HygieneReport,
) -> Result<(), HygieneError> {
    let read = fs::read_dir(dist).map_err(|source| HygieneError::Walk {
        path: dist.to_path_buf(),
        source,
    })?;
    let mut lessons: Vec<PathBuf> = read
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            !reserved.contains(&name) && !rules.exempt_folders.contains(&name)
        })
        .map(|e| e.path())
        .collect();
    lessons.sort();

    for lesson in lessons {
        for folder in &rules.forbidden_nested {
            if lesson.join(folder).exists() {
                report.violations.push(Violation::NestedEngineFolder {
                    lesson: lesson.clone(),
                    folder: folder.clone(),
                });
            }
        }
    }
    Ok(())
}
