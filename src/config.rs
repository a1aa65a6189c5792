//! Build configuration module.
//!
//! Handles loading, validating, and merging `lesson-dist.toml`. Every knob the
//! pipeline uses (paths, engine folder names, asset filters, size ceiling,
//! hygiene rules) lives here and is threaded by reference into each stage, so
//! tests can build a [`Project`] with overrides instead of touching globals.
//!
//! ## Config File Location
//!
//! Place `lesson-dist.toml` in the project root (next to `inputs/`):
//!
//! ```text
//! project/
//! ├── lesson-dist.toml         # Optional, overrides stock defaults
//! ├── inputs/                  # One folder per lesson unit
//! ├── lib/reveal/              # Slideshow engine (dist/, plugin/, css/)
//! ├── images/                  # Global images shared by every lesson
//! └── dist/                    # Aggregate tree (generated)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [paths]
//! inputs = "inputs"
//! dist = "dist"
//! engine = "lib/reveal"
//! global_images = "images"
//!
//! [engine]
//! folders = ["dist", "plugin", "css"]
//!
//! [assets]
//! folders = ["images", "audio"]
//! skip_extensions = [".mp4", ".webm", ".mov", ".avi"]
//! max_file_size = 1048576
//! ignored_names = [".git", ".DS_Store", "desktop.ini", "Thumbs.db"]
//!
//! [rewrite]
//! prefixes = ["dist", "plugin"]
//!
//! [dashboard]
//! title = "Bell Language Centre | Presentations Library"
//! heading = "Presentations Library"
//!
//! [hygiene]
//! forbidden_extensions = [".typ", ".pdf", ".json", ".md", ".py", ".txt", ".bak", ".backup"]
//! forbidden_names = ["presentation.json", "slide_architecture.md", "desktop.ini", "Thumbs.db"]
//! forbidden_nested = ["dist", "plugin", "css"]
//! exempt_folders = ["skills"]
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [assets]
//! max_file_size = 2097152
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "lesson-dist.toml";

/// Output folder (at the aggregate root) receiving the global images.
pub const GLOBAL_IMAGES_FOLDER: &str = "images";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `lesson-dist.toml`.
///
/// All fields have defaults matching the historical layout. Unknown keys are
/// rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Locations of inputs, output, engine and global images.
    pub paths: PathsConfig,
    /// Shared slideshow engine folders.
    pub engine: EngineConfig,
    /// Per-lesson asset copying rules.
    pub assets: AssetsConfig,
    /// Link prefixes rewritten in each lesson's `index.html`.
    pub rewrite: RewriteConfig,
    /// Dashboard page text.
    pub dashboard: DashboardConfig,
    /// Post-build hygiene rules.
    pub hygiene: HygieneConfig,
}

/// Project-relative locations. Absolute paths are used as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub inputs: PathBuf,
    pub dist: PathBuf,
    pub engine: PathBuf,
    pub global_images: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            inputs: PathBuf::from("inputs"),
            dist: PathBuf::from("dist"),
            engine: PathBuf::from("lib/reveal"),
            global_images: PathBuf::from("images"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine subfolders copied once to the aggregate root.
    pub folders: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            folders: strings(&["dist", "plugin", "css"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Asset subfolders copied from each lesson's content root.
    pub folders: Vec<String>,
    /// Extensions (with leading dot, case-insensitive) never copied from lesson assets.
    pub skip_extensions: Vec<String>,
    /// Files larger than this many bytes are never copied.
    pub max_file_size: u64,
    /// File or directory names skipped by every copy.
    pub ignored_names: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            folders: strings(&["images", "audio"]),
            skip_extensions: strings(&[".mp4", ".webm", ".mov", ".avi"]),
            max_file_size: 1024 * 1024,
            ignored_names: strings(&[".git", ".DS_Store", "desktop.ini", "Thumbs.db"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewriteConfig {
    /// `href`/`src` prefixes rewritten to `../<prefix>/`.
    pub prefixes: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            prefixes: strings(&["dist", "plugin"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Content of the dashboard's `<title>`.
    pub title: String,
    /// Visible `<h1>` heading.
    pub heading: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: "Bell Language Centre | Presentations Library".to_string(),
            heading: "Presentations Library".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HygieneConfig {
    /// Extensions (with leading dot, case-insensitive) forbidden anywhere in the tree.
    pub forbidden_extensions: Vec<String>,
    /// Exact filenames forbidden anywhere in the tree.
    pub forbidden_names: Vec<String>,
    /// Folder names that must not appear directly inside a lesson folder.
    pub forbidden_nested: Vec<String>,
    /// Top-level folders that are shared components, not lessons, and skip
    /// the nested-folder check (in addition to the engine folders and `images`).
    pub exempt_folders: Vec<String>,
}

impl Default for HygieneConfig {
    fn default() -> Self {
        Self {
            forbidden_extensions: strings(&[
                ".typ", ".pdf", ".json", ".md", ".py", ".txt", ".bak", ".backup",
            ]),
            forbidden_names: strings(&[
                "presentation.json",
                "slide_architecture.md",
                "desktop.ini",
                "Thumbs.db",
            ]),
            forbidden_nested: strings(&["dist", "plugin", "css"]),
            exempt_folders: strings(&["skills"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Resolve `.` and `..` without touching the filesystem.
///
/// `..` at the start of a relative path is kept; `..` directly under the
/// filesystem root is dropped.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `name` is usable as a single folder name at the aggregate root.
pub fn is_plain_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.max_file_size == 0 {
            return Err(ConfigError::Validation(
                "assets.max_file_size must be greater than zero".into(),
            ));
        }
        for (key, names) in [
            ("engine.folders", &self.engine.folders),
            ("assets.folders", &self.assets.folders),
            ("rewrite.prefixes", &self.rewrite.prefixes),
            ("hygiene.forbidden_nested", &self.hygiene.forbidden_nested),
            ("hygiene.exempt_folders", &self.hygiene.exempt_folders),
        ] {
            if let Some(bad) = names.iter().find(|n| !is_plain_folder_name(n)) {
                return Err(ConfigError::Validation(format!(
                    "{key} entry {bad:?} must be a single folder name"
                )));
            }
        }
        if self
            .engine
            .folders
            .iter()
            .any(|f| f == GLOBAL_IMAGES_FOLDER)
        {
            return Err(ConfigError::Validation(format!(
                "engine.folders must not contain {GLOBAL_IMAGES_FOLDER:?}, it is reserved for global images"
            )));
        }
        for (key, exts) in [
            ("assets.skip_extensions", &self.assets.skip_extensions),
            ("hygiene.forbidden_extensions", &self.hygiene.forbidden_extensions),
        ] {
            if let Some(bad) = exts.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
                return Err(ConfigError::Validation(format!(
                    "{key} entry {bad:?} must look like \".ext\""
                )));
            }
        }
        self.check_paths(Path::new(""))
    }

    /// Reject a `paths.dist` that would make a build clean authored files.
    ///
    /// The aggregate root may not be the project root or one of its
    /// ancestors, and may not overlap (contain or sit inside) the inputs, the
    /// engine checkout or the global images. Paths are compared lexically
    /// after joining with `root`; symlinks are not resolved. [`validate`]
    /// runs this with an empty root, which catches every overlap between
    /// relative paths; the build repeats it against the real project root.
    ///
    /// [`validate`]: SiteConfig::validate
    pub fn check_paths(&self, root: &Path) -> Result<(), ConfigError> {
        let root = normalize_lexically(root);
        let dist = normalize_lexically(&root.join(&self.paths.dist));
        let escapes_upward =
            dist.is_relative() && dist.components().all(|c| c == Component::ParentDir);
        if root.starts_with(&dist) || escapes_upward {
            return Err(ConfigError::Validation(format!(
                "paths.dist {:?} would clean the project root",
                self.paths.dist
            )));
        }
        for (key, path) in [
            ("paths.inputs", &self.paths.inputs),
            ("paths.engine", &self.paths.engine),
            ("paths.global_images", &self.paths.global_images),
        ] {
            let source = normalize_lexically(&root.join(path));
            if dist.starts_with(&source) || source.starts_with(&dist) {
                return Err(ConfigError::Validation(format!(
                    "paths.dist {:?} overlaps {key} {:?}",
                    self.paths.dist, path
                )));
            }
        }
        Ok(())
    }

    /// Folder names at the aggregate root owned by shared assets, never by a lesson.
    pub fn reserved_names(&self) -> Vec<String> {
        let mut names = self.engine.folders.clone();
        names.push(GLOBAL_IMAGES_FOLDER.to_string());
        names
    }
}

/// A [`SiteConfig`] bound to the project root it was loaded from.
///
/// All path accessors resolve config paths against the root; absolute config
/// paths win over the root (standard [`Path::join`] behavior).
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: SiteConfig,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn inputs_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.inputs)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.dist)
    }

    pub fn engine_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.engine)
    }

    pub fn global_images_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.global_images)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely (arrays included).
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `lesson-dist.toml` from the project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    load_config_file(&root.join(CONFIG_FILENAME))
}

/// Load an explicit config file path (missing file means stock defaults).
pub fn load_config_file(path: &Path) -> Result<SiteConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `lesson-dist.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# lesson-dist Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Paths (relative to the project root, absolute paths allowed)
# ---------------------------------------------------------------------------
[paths]
# One folder per lesson unit. Each holds published/index.html or index.html.
inputs = "inputs"
# Aggregate tree written by `build` and checked by `check`.
dist = "dist"
# Slideshow engine checkout holding the folders listed in [engine].
engine = "lib/reveal"
# Global images copied to dist/images.
global_images = "images"

# ---------------------------------------------------------------------------
# Shared engine
# ---------------------------------------------------------------------------
[engine]
# Copied once to the aggregate root. Lessons may not use these names.
folders = ["dist", "plugin", "css"]

# ---------------------------------------------------------------------------
# Lesson assets
# ---------------------------------------------------------------------------
[assets]
# Subfolders of a lesson's content root copied next to its index.html.
folders = ["images", "audio"]
# Video is streamed from elsewhere; never bundle it.
skip_extensions = [".mp4", ".webm", ".mov", ".avi"]
# Size ceiling in bytes for any copied file (1 MiB).
max_file_size = 1048576
# Names skipped by every copy (files and whole directories).
ignored_names = [".git", ".DS_Store", "desktop.ini", "Thumbs.db"]

# ---------------------------------------------------------------------------
# Link rewriting
# ---------------------------------------------------------------------------
[rewrite]
# href="/dist/..." and src="plugin/..." become "../dist/..." and "../plugin/...".
prefixes = ["dist", "plugin"]

# ---------------------------------------------------------------------------
# Dashboard (dist/index.html)
# ---------------------------------------------------------------------------
[dashboard]
title = "Bell Language Centre | Presentations Library"
heading = "Presentations Library"

# ---------------------------------------------------------------------------
# Hygiene (`lesson-dist check`)
# ---------------------------------------------------------------------------
[hygiene]
# Authoring sources that must never be deployed.
forbidden_extensions = [".typ", ".pdf", ".json", ".md", ".py", ".txt", ".bak", ".backup"]
forbidden_names = ["presentation.json", "slide_architecture.md", "desktop.ini", "Thumbs.db"]
# Engine folders duplicated inside a lesson folder.
forbidden_nested = ["dist", "plugin", "css"]
# Shared top-level component folders that are not lessons.
exempt_folders = ["skills"]
"##
}
