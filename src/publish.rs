//! Shared engine and global asset publishing.
//!
//! The slideshow engine (`dist/`, `plugin/`, `css/` of the engine checkout)
//! and the project's global `images/` are copied once to the aggregate root,
//! where every lesson reaches them through `../`:
//!
//! ```text
//! lib/reveal/dist/    →  dist/dist/
//! lib/reveal/plugin/  →  dist/plugin/
//! lib/reveal/css/     →  dist/css/
//! images/             →  dist/images/
//! ```
//!
//! A missing source folder is not fatal: the build continues without it and
//! the report marks it [`SharedAssetStatus::Missing`].

use crate::config::{GLOBAL_IMAGES_FOLDER, Project};
use crate::copy::{CopyReport, CopyRules, copy_filtered};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SharedAssetStatus {
    Copied(CopyReport),
    Missing { source: PathBuf },
}

/// One shared folder at the aggregate root.
#[derive(Debug, Clone, Serialize)]
pub struct SharedAssetReport {
    pub folder: String,
    pub status: SharedAssetStatus,
}

impl SharedAssetReport {
    pub fn is_missing(&self) -> bool {
        matches!(self.status, SharedAssetStatus::Missing { .. })
    }
}

/// Everything [`publish_shared`] copied or found missing.
#[derive(Debug, Clone, Serialize)]
pub struct SharedAssets {
    pub engine: Vec<SharedAssetReport>,
    pub global_images: SharedAssetReport,
}

/// Copy every engine folder and the global images to the aggregate root.
///
/// Safe to repeat: files are overwritten in place, nothing is deleted.
pub fn publish_shared(project: &Project) -> SharedAssets {
    let config = &project.config;
    let dist = project.dist_dir();
    let engine_dir = project.engine_dir();
    let rules = CopyRules {
        ignored_names: &config.assets.ignored_names,
        max_file_size: config.assets.max_file_size,
    };

    let engine = config
        .engine
        .folders
        .iter()
        .map(|folder| {
            publish_folder(
                folder,
                &engine_dir.join(folder),
                &dist.join(folder),
                rules,
            )
        })
        .collect();

    let global_images = publish_folder(
        GLOBAL_IMAGES_FOLDER,
        &project.global_images_dir(),
        &dist.join(GLOBAL_IMAGES_FOLDER),
        rules,
    );

    SharedAssets {
        engine,
        global_images,
    }
}

fn publish_folder(folder: &str, src: &Path, dst: &Path, rules: CopyRules<'_>) -> SharedAssetReport {
    let status = if src.is_dir() {
        SharedAssetStatus::Copied(copy_filtered(src, dst, rules, None))
    } else {
        SharedAssetStatus::Missing {
            source: src.to_path_buf(),
        }
    };
    SharedAssetReport {
        folder: folder.to_string(),
        status,
    }
}
