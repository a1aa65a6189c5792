//! Shared test utilities for the lesson-dist test suite.
//!
//! Builds a throwaway project tree in a temp directory and offers small file
//! helpers so module tests read as scenarios rather than setup code.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_project();
//! add_lesson(tmp.path(), "A", "Intro");
//! let project = project_at(tmp.path());
//!
//! let report = build(&project, BuildMode::Full, None).unwrap();
//! assert!(read(&tmp.path().join("dist/A/index.html")).contains("../dist/"));
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{Project, SiteConfig};
use crate::rewrite::LinkRewriter;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a project root with an empty `inputs/`, a minimal engine checkout
/// and one global image. No `dist/` and no lessons.
///
/// ```text
/// <tmp>/
/// ├── inputs/
/// ├── images/logo.png
/// └── lib/reveal/
///     ├── dist/reveal.js
///     ├── plugin/notes/notes.js
///     └── css/theme/black.css
/// ```
pub fn setup_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();
    fs::create_dir_all(root.join("inputs")).unwrap();
    write_file(&root.join("lib/reveal/dist/reveal.js"), "/* reveal */");
    write_file(&root.join("lib/reveal/plugin/notes/notes.js"), "/* notes */");
    write_file(&root.join("lib/reveal/css/theme/black.css"), "body {}");
    write_file(&root.join("images/logo.png"), "png");
    tmp
}

/// Add a ready lesson with a `published/index.html` that links the engine
/// with a root-absolute path.
pub fn add_lesson(root: &Path, name: &str, title: &str) {
    let html = format!(
        "<html><head><title>{title}</title></head>\
         <body><script src=\"/dist/reveal.js\"></script></body></html>"
    );
    write_file(
        &root.join("inputs").join(name).join("published/index.html"),
        html,
    );
}

/// Project rooted at `root` with stock configuration.
pub fn project_at(root: &Path) -> Project {
    Project::new(root, SiteConfig::default())
}

/// Link rewriter for the project's configured prefixes.
pub fn rewriter_for(project: &Project) -> LinkRewriter {
    LinkRewriter::new(&project.config.rewrite.prefixes).unwrap()
}

// =========================================================================
// File helpers
// =========================================================================

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Read a file as UTF-8. Panics with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
