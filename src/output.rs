//! CLI output formatting.
//!
//! Every console line opens with a bracketed tag so build logs stay greppable
//! and readable on any terminal (no colors, no emoji):
//!
//! ```text
//! [BUILD] Starting full build
//! [CLEAN] Cleaned dist
//! [ENGINE] Copied dist/ (14 files)
//! [ENGINE] Copied plugin/ (31 files, 2 skipped)
//! [WARN] Engine folder css/ not found at lib/reveal/css
//! [ASSETS] Copied images/ (4 files)
//! [OK] A (published/, 6 files)
//!     [SKIP] images/walkthrough.png exceeds the size ceiling (2.4 MiB)
//! [SKIP] C: no index.html yet
//! [ERROR] css: lesson name "css" collides with a reserved shared-asset folder
//! [DASHBOARD] Listed 2 lessons
//! [DONE] Build complete: 2 built, 1 not ready, 1 failed
//! ```
//!
//! # Architecture
//!
//! Each concern has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure, with no I/O.

use crate::aggregate::LessonStatus;
use crate::copy::{CopyOutcome, CopyReport};
use crate::config::GLOBAL_IMAGES_FOLDER;
use crate::hygiene::HygieneOutcome;
use crate::lesson::{LessonListing, SourceLayout};
use crate::pipeline::{BuildEvent, BuildMode, BuildReport};
use crate::publish::{SharedAssetReport, SharedAssetStatus};

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn tagged(tag: &str, message: impl AsRef<str>) -> String {
    format!("[{}] {}", tag, message.as_ref())
}

/// Human-readable byte size, binary units.
fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// `(12 files)` / `(12 files, 2 skipped, 1 failed)`.
fn copy_counts(copied: usize, skipped: usize, failed: usize) -> String {
    let mut parts = vec![plural(copied, "file")];
    if skipped > 0 {
        parts.push(format!("{} skipped", skipped));
    }
    if failed > 0 {
        parts.push(format!("{} failed", failed));
    }
    format!("({})", parts.join(", "))
}

/// Indented lines for the copy outcomes worth a reader's attention.
///
/// Ignored and filtered files are expected and only counted; oversized and
/// failed files, and copies that lost their modification time, are listed
/// one per line.
fn copy_details(report: &CopyReport, prefix: &str, depth: usize) -> Vec<String> {
    report
        .entries
        .iter()
        .filter_map(|entry| {
            let path = format!("{}{}", prefix, entry.path.display());
            match &entry.outcome {
                CopyOutcome::TooLarge { size } => Some(tagged(
                    "SKIP",
                    format!("{} exceeds the size ceiling ({})", path, format_size(*size)),
                )),
                CopyOutcome::Failed { error } => {
                    Some(tagged("WARN", format!("Could not copy {}: {}", path, error)))
                }
                CopyOutcome::Copied {
                    timestamp_error: Some(error),
                    ..
                } => Some(tagged(
                    "WARN",
                    format!("Copied {} without its modification time: {}", path, error),
                )),
                _ => None,
            }
        })
        .map(|line| format!("{}{}", indent(depth), line))
        .collect()
}

// ============================================================================
// Build
// ============================================================================

fn mode_label(mode: &BuildMode) -> String {
    match mode {
        BuildMode::Full => "full".to_string(),
        BuildMode::Targeted(name) => format!("targeted ({})", name),
    }
}

fn layout_label(layout: SourceLayout) -> &'static str {
    match layout {
        SourceLayout::Published => "published/",
        SourceLayout::Root => "root",
    }
}

fn format_shared_asset(report: &SharedAssetReport) -> Vec<String> {
    let is_images = report.folder == GLOBAL_IMAGES_FOLDER;
    let tag = if is_images { "ASSETS" } else { "ENGINE" };
    match &report.status {
        SharedAssetStatus::Copied(copy) => {
            let mut lines = vec![tagged(
                tag,
                format!(
                    "Copied {}/ {}",
                    report.folder,
                    copy_counts(copy.copied(), copy.skipped(), copy.failed())
                ),
            )];
            lines.extend(copy_details(copy, &format!("{}/", report.folder), 1));
            lines
        }
        SharedAssetStatus::Missing { source } => {
            let what = if is_images {
                "Global images"
            } else {
                "Engine folder"
            };
            vec![tagged(
                "WARN",
                format!("{} {}/ not found at {}", what, report.folder, source.display()),
            )]
        }
    }
}

fn format_lesson(name: &str, status: &LessonStatus) -> Vec<String> {
    match status {
        LessonStatus::Built { layout, assets, .. } => {
            let copied: usize = assets.iter().map(CopyReport::copied).sum();
            let skipped: usize = assets.iter().map(CopyReport::skipped).sum();
            let failed: usize = assets.iter().map(CopyReport::failed).sum();
            let mut lines = vec![tagged(
                "OK",
                format!(
                    "{} ({}, {})",
                    name,
                    layout_label(*layout),
                    copy_counts(copied, skipped, failed)
                        .trim_start_matches('(')
                        .trim_end_matches(')')
                ),
            )];
            for report in assets {
                let folder = report
                    .destination
                    .file_name()
                    .map(|f| format!("{}/", f.to_string_lossy()))
                    .unwrap_or_default();
                lines.extend(copy_details(report, &folder, 1));
            }
            lines
        }
        LessonStatus::NotReady => vec![tagged("SKIP", format!("{}: no index.html yet", name))],
        LessonStatus::Failed { error } => vec![tagged("ERROR", format!("{}: {}", name, error))],
    }
}

/// Format a single build progress event as display lines.
pub fn format_build_event(event: &BuildEvent) -> Vec<String> {
    match event {
        BuildEvent::Started { mode } => {
            vec![tagged("BUILD", format!("Starting {} build", mode_label(mode)))]
        }
        BuildEvent::Cleaned { path } => {
            vec![tagged("CLEAN", format!("Cleaned {}", path.display()))]
        }
        BuildEvent::Warning { message } => vec![tagged("WARN", message)],
        BuildEvent::SharedAssetPublished(report) => format_shared_asset(report),
        BuildEvent::LessonFinished { name, status } => format_lesson(name, status),
        BuildEvent::DashboardWritten { entries } => {
            vec![tagged("DASHBOARD", format!("Listed {}", plural(*entries, "lesson")))]
        }
        BuildEvent::Finished => Vec::new(),
    }
}

/// Closing summary of a finished build.
pub fn format_build_summary(report: &BuildReport) -> Vec<String> {
    vec![tagged(
        "DONE",
        format!(
            "Build complete: {} built, {} not ready, {} failed → {}",
            report.built(),
            report.not_ready(),
            report.failed(),
            report.dist.display()
        ),
    )]
}

pub fn print_build_summary(report: &BuildReport) {
    for line in format_build_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Hygiene
// ============================================================================

/// Format the hygiene result: a pass line, or every violation under a failure header.
pub fn format_hygiene_outcome(outcome: &HygieneOutcome) -> Vec<String> {
    match outcome {
        HygieneOutcome::NoDist { path } => {
            vec![tagged("SKIP", format!("No {} folder to validate.", path.display()))]
        }
        HygieneOutcome::Checked(report) if report.is_clean() => vec![tagged(
            "PASSED",
            format!(
                "Distribution hygiene is clean ({} checked).",
                plural(report.files_checked, "file")
            ),
        )],
        HygieneOutcome::Checked(report) => {
            let mut lines = vec![tagged(
                "FAILED",
                format!(
                    "Distribution hygiene validation failed ({}):",
                    plural(report.violations.len(), "violation")
                ),
            )];
            lines.extend(
                report
                    .violations
                    .iter()
                    .map(|v| format!("{}- {}", indent(1), v)),
            );
            lines
        }
    }
}

pub fn print_hygiene_outcome(outcome: &HygieneOutcome) {
    for line in format_hygiene_outcome(outcome) {
        println!("{}", line);
    }
}

// ============================================================================
// Lesson listing
// ============================================================================

/// Format the `list` command output: one line per lesson unit.
///
/// ```text
/// 001 01-Presentation-Structure
///     Source: published/
/// 002 12-Writing-feedback
///     Not ready: no index.html
/// ```
pub fn format_lesson_list(listings: &[LessonListing]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, listing) in listings.iter().enumerate() {
        lines.push(format!("{:0>3} {}", i + 1, listing.name));
        if let Some(err) = &listing.name_error {
            lines.push(format!("{}Invalid: {}", indent(1), err));
        }
        match &listing.source {
            Some(source) => lines.push(format!(
                "{}Source: {}",
                indent(1),
                layout_label(source.layout)
            )),
            None => lines.push(format!("{}Not ready: no index.html", indent(1))),
        }
    }
    if listings.is_empty() {
        lines.push("No lessons found.".to_string());
    }
    lines
}

pub fn print_lesson_list(listings: &[LessonListing]) {
    for line in format_lesson_list(listings) {
        println!("{}", line);
    }
}
