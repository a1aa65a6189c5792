//! Lesson unit discovery and content-root resolution.
//!
//! A lesson unit is a folder under the inputs root. Authoring tools leave its
//! renderable deck in one of two places, checked in order:
//!
//! ```text
//! inputs/
//! ├── 01-Presentation-Structure/
//! │   └── published/               # Preferred content root
//! │       ├── index.html
//! │       ├── images/
//! │       └── audio/
//! ├── 05-Social-Media-Reading/     # Fallback: the unit folder itself
//! │   ├── index.html
//! │   └── images/
//! └── 12-Writing-feedback/         # No index.html anywhere: not ready, skipped
//!     └── notes.typ
//! ```
//!
//! Lesson names become folder names at the aggregate root, so they are checked
//! before anything is written: a lesson called `plugin` would otherwise be
//! built on top of the shared engine.

use crate::config::is_plain_folder_name;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const PUBLISHED_DIR: &str = "published";
pub const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LessonNameError {
    #[error("lesson name {0:?} is not a single folder name")]
    NotAFolderName(String),
    #[error("lesson name {0:?} collides with a reserved shared-asset folder")]
    Reserved(String),
}

/// Which candidate held the lesson's `index.html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLayout {
    /// `<unit>/published/index.html`
    Published,
    /// `<unit>/index.html`
    Root,
}

/// A lesson unit whose renderable document was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSource {
    pub name: String,
    pub layout: SourceLayout,
    /// Folder holding `index.html` and the asset subfolders.
    pub content_root: PathBuf,
}

impl LessonSource {
    pub fn index_html(&self) -> PathBuf {
        self.content_root.join(INDEX_FILE)
    }
}

/// Reject names that are not a single plain folder name or that collide with
/// a reserved folder at the aggregate root.
pub fn validate_name(name: &str, reserved: &[String]) -> Result<(), LessonNameError> {
    if !is_plain_folder_name(name) {
        return Err(LessonNameError::NotAFolderName(name.to_string()));
    }
    if reserved.iter().any(|r| r == name) {
        return Err(LessonNameError::Reserved(name.to_string()));
    }
    Ok(())
}

/// Resolve a lesson's content root: `published/` first, then the unit folder.
///
/// Returns `None` when neither candidate holds an `index.html`.
pub fn resolve(inputs_dir: &Path, name: &str) -> Option<LessonSource> {
    let unit_dir = inputs_dir.join(name);
    let published = unit_dir.join(PUBLISHED_DIR);
    let candidates = [
        (SourceLayout::Published, published),
        (SourceLayout::Root, unit_dir),
    ];
    candidates
        .into_iter()
        .find(|(_, root)| root.join(INDEX_FILE).is_file())
        .map(|(layout, content_root)| LessonSource {
            name: name.to_string(),
            layout,
            content_root,
        })
}

/// Names of every subdirectory of the inputs root, sorted.
///
/// A missing inputs root is reported as `io::ErrorKind::NotFound`.
pub fn discover(inputs_dir: &Path) -> io::Result<Vec<String>> {
    let mut names: Vec<String> = fs::read_dir(inputs_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// A discovered unit and where (if anywhere) its deck was found.
#[derive(Debug, Clone)]
pub struct LessonListing {
    pub name: String,
    pub source: Option<LessonSource>,
    pub name_error: Option<LessonNameError>,
}

/// Discover and resolve every unit under the inputs root.
pub fn list(inputs_dir: &Path, reserved: &[String]) -> io::Result<Vec<LessonListing>> {
    Ok(discover(inputs_dir)?
        .into_iter()
        .map(|name| LessonListing {
            source: resolve(inputs_dir, &name),
            name_error: validate_name(&name, reserved).err(),
            name,
        })
        .collect())
}
