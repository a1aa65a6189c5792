//! Build orchestration.
//!
//! ```text
//! build(project, mode)
//!     │
//!     ├── clean          Full: empty dist/      Targeted(X): recreate dist/X/
//!     ├── publish        engine folders + global images → dist/
//!     ├── aggregate      every inputs/* (Full) or just X (Targeted)
//!     └── dashboard      re-scan all of dist/ → dist/index.html
//! ```
//!
//! A targeted build never touches sibling lesson folders, and the dashboard
//! still lists every lesson built earlier. Per-lesson and per-file problems
//! are recorded in the [`BuildReport`] and the build carries on; only a bad
//! targeted lesson name, an aggregate root placed over the project's own
//! sources, or an unusable aggregate root stop it.
//!
//! Progress is streamed as [`BuildEvent`]s over an optional channel so the CLI
//! can print as the build goes while tests inspect the final report.

use crate::aggregate::{LessonStatus, aggregate_lesson};
use crate::config::{ConfigError, Project};
use crate::dashboard::{self, DashboardEntry};
use crate::lesson::{self, LessonNameError};
use crate::publish::{SharedAssetReport, SharedAssets, publish_shared};
use crate::rewrite::LinkRewriter;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{0}")]
    InvalidLesson(#[from] LessonNameError),
    #[error("invalid rewrite prefix: {0}")]
    Rewrite(#[from] regex::Error),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Which part of the aggregate tree a build rewrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "lesson", rename_all = "snake_case")]
pub enum BuildMode {
    /// Wipe the aggregate root and rebuild every lesson.
    Full,
    /// Rebuild one lesson folder, leaving its siblings alone.
    Targeted(String),
}

impl BuildMode {
    pub fn from_lesson(lesson: Option<String>) -> Self {
        lesson.map_or(BuildMode::Full, BuildMode::Targeted)
    }
}

/// Progress events emitted while building.
#[derive(Debug, Clone)]
pub enum BuildEvent {
    Started { mode: BuildMode },
    Cleaned { path: PathBuf },
    /// Something could not be removed while cleaning, or inputs are missing.
    Warning { message: String },
    SharedAssetPublished(SharedAssetReport),
    LessonFinished { name: String, status: LessonStatus },
    DashboardWritten { entries: usize },
    Finished,
}

/// Per-lesson entry of the [`BuildReport`].
#[derive(Debug, Clone, Serialize)]
pub struct LessonReport {
    pub name: String,
    #[serde(flatten)]
    pub status: LessonStatus,
}

/// Everything a build did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub dist: PathBuf,
    pub warnings: Vec<String>,
    pub shared: SharedAssets,
    pub lessons: Vec<LessonReport>,
    pub dashboard: Vec<DashboardEntry>,
}

impl BuildReport {
    pub fn lesson(&self, name: &str) -> Option<&LessonStatus> {
        self.lessons
            .iter()
            .find(|l| l.name == name)
            .map(|l| &l.status)
    }

    pub fn built(&self) -> usize {
        self.count(|s| matches!(s, LessonStatus::Built { .. }))
    }

    pub fn not_ready(&self) -> usize {
        self.count(|s| matches!(s, LessonStatus::NotReady))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, LessonStatus::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&LessonStatus) -> bool) -> usize {
        self.lessons.iter().filter(|l| pred(&l.status)).count()
    }
}

/// Run a full or targeted build.
pub fn build(
    project: &Project,
    mode: BuildMode,
    events: Option<Sender<BuildEvent>>,
) -> Result<BuildReport, BuildError> {
    let config = &project.config;
    let dist = project.dist_dir();
    let reserved = config.reserved_names();
    let rewriter = LinkRewriter::new(&config.rewrite.prefixes)?;
    config.check_paths(&project.root)?;

    // Checked before cleaning: a reserved name would wipe a shared folder.
    if let BuildMode::Targeted(name) = &mode {
        lesson::validate_name(name, &reserved)?;
    }

    let emit = |event: BuildEvent| {
        if let Some(tx) = &events {
            let _ = tx.send(event);
        }
    };
    let mut warnings = Vec::new();
    let mut warn = |message: String| {
        emit(BuildEvent::Warning {
            message: message.clone(),
        });
        warnings.push(message);
    };

    emit(BuildEvent::Started { mode: mode.clone() });

    // 1. Clean
    let lessons_to_process = match &mode {
        BuildMode::Full => {
            for message in clean_dir(&dist)? {
                warn(message);
            }
            emit(BuildEvent::Cleaned { path: dist.clone() });
            match lesson::discover(&project.inputs_dir()) {
                Ok(names) => names,
                Err(e) => {
                    warn(format!(
                        "cannot list lessons in {}: {e}",
                        project.inputs_dir().display()
                    ));
                    Vec::new()
                }
            }
        }
        BuildMode::Targeted(name) => {
            let target = dist.join(name);
            if target.exists() {
                if let Err(e) = fs::remove_dir_all(&target) {
                    warn(format!("cannot remove {}: {e}", target.display()));
                    for message in clean_dir(&target)? {
                        warn(message);
                    }
                }
            }
            fs::create_dir_all(&target).map_err(|source| BuildError::Io {
                path: target.clone(),
                source,
            })?;
            emit(BuildEvent::Cleaned { path: target });
            vec![name.clone()]
        }
    };

    // 2. Shared engine and global assets
    let shared = publish_shared(project);
    for report in shared.engine.iter().chain([&shared.global_images]) {
        emit(BuildEvent::SharedAssetPublished(report.clone()));
    }

    // 3. Lessons
    let mut lessons = Vec::with_capacity(lessons_to_process.len());
    for name in lessons_to_process {
        let status = aggregate_lesson(project, &rewriter, &name).unwrap_or_else(|e| {
            LessonStatus::Failed {
                error: e.to_string(),
            }
        });
        emit(BuildEvent::LessonFinished {
            name: name.clone(),
            status: status.clone(),
        });
        lessons.push(LessonReport { name, status });
    }

    // 4. Dashboard
    let dashboard = match dashboard::write_dashboard(&dist, &reserved, &config.dashboard) {
        Ok(entries) => {
            emit(BuildEvent::DashboardWritten {
                entries: entries.len(),
            });
            entries
        }
        Err(e) => {
            warn(format!("cannot write dashboard in {}: {e}", dist.display()));
            Vec::new()
        }
    };

    emit(BuildEvent::Finished);

    Ok(BuildReport {
        mode,
        dist,
        warnings,
        shared,
        lessons,
        dashboard,
    })
}

/// Remove everything inside `dir`, keeping `dir` itself; create it if absent.
///
/// Entries that cannot be removed are returned as warnings.
fn clean_dir(dir: &Path) -> Result<Vec<String>, BuildError> {
    let io_err = |source: io::Error| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(io_err)?;
        return Ok(Vec::new());
    }

    let mut warnings = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                warnings.push(format!("cannot read entry in {}: {e}", dir.display()));
                continue;
            }
        };
        let removed = if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        if let Err(e) = removed {
            warnings.push(format!("cannot remove {}: {e}", path.display()));
        }
    }
    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use std::sync::mpsc;

    #[test]
    fn full_build_cleans_stale_output() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        write_file(&tmp.path().join("dist/old-lesson/index.html"), "stale");
        write_file(&tmp.path().join("dist/notes.md"), "stale");
        let project = project_at(tmp.path());

        build(&project, BuildMode::Full, None).unwrap();

        assert!(!tmp.path().join("dist/old-lesson").exists());
        assert!(!tmp.path().join("dist/notes.md").exists());
        assert!(tmp.path().join("dist/A/index.html").exists());
    }

    #[test]
    fn full_build_creates_missing_dist() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        let project = project_at(tmp.path());
        assert!(!tmp.path().join("dist").exists());

        let report = build(&project, BuildMode::Full, None).unwrap();

        assert_eq!(report.built(), 1);
        assert!(tmp.path().join("dist/index.html").exists());
    }

    #[test]
    fn full_build_reports_every_lesson() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        write_file(&tmp.path().join("inputs/B/index.html"), "<title>Root</title>");
        write_file(&tmp.path().join("inputs/C/plan.typ"), "= Draft");
        write_file(&tmp.path().join("inputs/css/index.html"), "<title>Clash</title>");
        let project = project_at(tmp.path());

        let report = build(&project, BuildMode::Full, None).unwrap();

        let names: Vec<&str> = report.lessons.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "css"]);
        assert_eq!(report.built(), 2);
        assert_eq!(report.not_ready(), 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.lesson("css"), Some(LessonStatus::Failed { .. })));
        // The engine's css folder was not overwritten by the clashing lesson
        assert!(!tmp.path().join("dist/css/index.html").exists());
        assert!(tmp.path().join("dist/css/theme/black.css").exists());
    }

    #[test]
    fn missing_inputs_is_a_warning() {
        let tmp = setup_project();
        fs::remove_dir_all(tmp.path().join("inputs")).unwrap();
        let project = project_at(tmp.path());

        let report = build(&project, BuildMode::Full, None).unwrap();

        assert!(report.lessons.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(tmp.path().join("dist/index.html").exists());
    }

    #[test]
    fn targeted_build_leaves_siblings_alone() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        add_lesson(tmp.path(), "B", "Second");
        let project = project_at(tmp.path());
        build(&project, BuildMode::Full, None).unwrap();
        let sibling_before = read(&tmp.path().join("dist/B/index.html"));

        write_file(
            &tmp.path().join("inputs/A/published/index.html"),
            "<title>Intro v2</title>",
        );
        write_file(&tmp.path().join("inputs/B/published/index.html"), "<title>B v2</title>");
        let report = build(&project, BuildMode::Targeted("A".to_string()), None).unwrap();

        assert_eq!(report.lessons.len(), 1);
        assert_eq!(read(&tmp.path().join("dist/B/index.html")), sibling_before);
        assert!(read(&tmp.path().join("dist/A/index.html")).contains("Intro v2"));
        // Dashboard still lists both lessons
        assert_eq!(report.dashboard.len(), 2);
    }

    #[test]
    fn targeted_build_drops_stale_files_of_target() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        write_file(&tmp.path().join("dist/A/images/removed.png"), "old");
        let project = project_at(tmp.path());

        build(&project, BuildMode::Targeted("A".to_string()), None).unwrap();

        assert!(!tmp.path().join("dist/A/images/removed.png").exists());
        assert!(tmp.path().join("dist/A/index.html").exists());
    }

    #[test]
    fn targeted_build_of_unready_lesson_leaves_empty_folder() {
        let tmp = setup_project();
        write_file(&tmp.path().join("inputs/C/plan.typ"), "= Draft");
        let project = project_at(tmp.path());

        let report = build(&project, BuildMode::Targeted("C".to_string()), None).unwrap();

        assert!(matches!(report.lesson("C"), Some(LessonStatus::NotReady)));
        assert!(tmp.path().join("dist/C").is_dir());
        assert!(report.dashboard.is_empty());
    }

    #[test]
    fn targeted_reserved_name_touches_nothing() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        let project = project_at(tmp.path());
        build(&project, BuildMode::Full, None).unwrap();

        let err = build(&project, BuildMode::Targeted("plugin".to_string()), None).unwrap_err();

        assert!(matches!(
            err,
            BuildError::InvalidLesson(LessonNameError::Reserved(_))
        ));
        assert!(tmp.path().join("dist/plugin/notes/notes.js").exists());
    }

    #[test]
    fn targeted_path_escape_rejected() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        let err = build(&project, BuildMode::Targeted("../inputs".to_string()), None).unwrap_err();
        assert!(matches!(err, BuildError::InvalidLesson(_)));
    }

    #[test]
    fn events_stream_in_pipeline_order() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        let project = project_at(tmp.path());
        let (tx, rx) = mpsc::channel();

        build(&project, BuildMode::Full, Some(tx)).unwrap();

        let events: Vec<BuildEvent> = rx.iter().collect();
        assert!(matches!(events.first(), Some(BuildEvent::Started { .. })));
        assert!(matches!(events.last(), Some(BuildEvent::Finished)));
        let shared = events
            .iter()
            .filter(|e| matches!(e, BuildEvent::SharedAssetPublished(_)))
            .count();
        assert_eq!(shared, 4);
        assert!(events.iter().any(|e| matches!(
            e,
            BuildEvent::LessonFinished { name, status: LessonStatus::Built { .. } } if name == "A"
        )));
        assert!(events
            .iter()
            .any(|e| matches!(e, BuildEvent::DashboardWritten { entries: 1 })));
    }

    #[test]
    fn report_serializes_to_json() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        let project = project_at(tmp.path());

        let report = build(&project, BuildMode::Targeted("A".to_string()), None).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["mode"]["mode"], "targeted");
        assert_eq!(json["mode"]["lesson"], "A");
        assert_eq!(json["lessons"][0]["name"], "A");
        assert_eq!(json["lessons"][0]["status"], "built");
        assert_eq!(json["dashboard"][0]["title"], "Intro");
    }

    fn project_with_dist(root: &Path, dist: &str) -> Project {
        let mut project = project_at(root);
        project.config.paths.dist = PathBuf::from(dist);
        project
    }

    #[test]
    fn dist_over_project_root_refused_before_cleaning() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        write_file(&tmp.path().join("lesson-dist.toml"), "");

        for dist in [".", "inputs"] {
            let project = project_with_dist(tmp.path(), dist);
            let err = build(&project, BuildMode::Full, None).unwrap_err();
            assert!(matches!(err, BuildError::Config(_)), "dist = {dist:?}");
        }

        assert!(tmp.path().join("inputs/A/published/index.html").exists());
        assert!(tmp.path().join("lib/reveal/dist/reveal.js").exists());
        assert!(tmp.path().join("lesson-dist.toml").exists());
    }

    #[test]
    fn absolute_dist_inside_engine_refused() {
        let tmp = setup_project();
        let engine_dist = tmp.path().join("lib/reveal/dist");
        let project = project_with_dist(tmp.path(), engine_dist.to_str().unwrap());

        let err = build(&project, BuildMode::Targeted("A".to_string()), None).unwrap_err();

        assert!(matches!(err, BuildError::Config(_)));
        assert!(engine_dist.join("reveal.js").exists());
    }

    #[cfg(unix)]
    #[test]
    fn broken_asset_does_not_fail_lesson() {
        let tmp = setup_project();
        add_lesson(tmp.path(), "A", "Intro");
        add_lesson(tmp.path(), "B", "Second");
        let images = tmp.path().join("inputs/A/published/images");
        write_file(&images.join("cover.jpg"), "jpg");
        std::os::unix::fs::symlink(images.join("gone.png"), images.join("broken.png")).unwrap();
        let project = project_at(tmp.path());

        let report = build(&project, BuildMode::Full, None).unwrap();

        let Some(LessonStatus::Built { assets, .. }) = report.lesson("A") else {
            panic!("lesson A should be built: {:?}", report.lesson("A"));
        };
        assert_eq!(assets[0].failed(), 1);
        assert_eq!(assets[0].copied(), 1);
        assert!(tmp.path().join("dist/A/images/cover.jpg").exists());
        assert!(matches!(report.lesson("B"), Some(LessonStatus::Built { .. })));
        assert_eq!(report.built(), 2);
    }

    #[test]
    fn mode_from_optional_lesson() {
        assert_eq!(BuildMode::from_lesson(None), BuildMode::Full);
        assert_eq!(
            BuildMode::from_lesson(Some("A".to_string())),
            BuildMode::Targeted("A".to_string())
        );
    }
}
