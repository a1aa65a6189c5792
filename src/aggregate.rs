//! Per-lesson aggregation.
//!
//! Builds one lesson's folder in the aggregate tree:
//!
//! ```text
//! inputs/A/published/index.html  →  dist/A/index.html   (engine links rewritten)
//! inputs/A/published/images/     →  dist/A/images/      (filtered copy)
//! inputs/A/published/audio/      →  dist/A/audio/       (filtered copy)
//! ```
//!
//! Video containers are never copied from lesson assets; the host streams
//! them separately. Errors are returned to the orchestrator, which records the
//! lesson as failed and moves on to the next one.

use crate::config::Project;
use crate::copy::{CopyReport, CopyRules, copy_filtered, reject_extensions};
use crate::lesson::{self, INDEX_FILE, LessonNameError, SourceLayout};
use crate::rewrite::LinkRewriter;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("{0}")]
    InvalidName(#[from] LessonNameError),
    #[error("cannot create {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened to one lesson during a build.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LessonStatus {
    Built {
        layout: SourceLayout,
        content_root: PathBuf,
        /// One report per asset folder present in the content root.
        assets: Vec<CopyReport>,
    },
    /// No `index.html` under either candidate root yet.
    NotReady,
    Failed { error: String },
}

/// Build `dist/<name>/` from the lesson's content root.
pub fn aggregate_lesson(
    project: &Project,
    rewriter: &LinkRewriter,
    name: &str,
) -> Result<LessonStatus, AggregateError> {
    let config = &project.config;
    lesson::validate_name(name, &config.reserved_names())?;

    let Some(source) = lesson::resolve(&project.inputs_dir(), name) else {
        return Ok(LessonStatus::NotReady);
    };

    let out_dir = project.dist_dir().join(name);
    fs::create_dir_all(&out_dir).map_err(|source| AggregateError::CreateDir {
        path: out_dir.clone(),
        source,
    })?;

    let index_src = source.index_html();
    let html = fs::read_to_string(&index_src).map_err(|source| AggregateError::Read {
        path: index_src.clone(),
        source,
    })?;
    let index_dst = out_dir.join(INDEX_FILE);
    fs::write(&index_dst, rewriter.rewrite(&html)).map_err(|source| AggregateError::Write {
        path: index_dst.clone(),
        source,
    })?;

    let rules = CopyRules {
        ignored_names: &config.assets.ignored_names,
        max_file_size: config.assets.max_file_size,
    };
    let accept: &dyn Fn(&Path) -> bool = &reject_extensions(&config.assets.skip_extensions);

    let assets = config
        .assets
        .folders
        .iter()
        .map(|folder| (source.content_root.join(folder), out_dir.join(folder)))
        .filter(|(src, _)| src.is_dir())
        .map(|(src, dst)| copy_filtered(&src, &dst, rules, Some(accept)))
        .collect();

    Ok(LessonStatus::Built {
        layout: source.layout,
        content_root: source.content_root,
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::copy::CopyOutcome;
    use crate::test_helpers::*;

    fn built_assets(status: &LessonStatus) -> &[CopyReport] {
        match status {
            LessonStatus::Built { assets, .. } => assets,
            other => panic!("expected a built lesson, got {other:?}"),
        }
    }

    #[test]
    fn writes_rewritten_index() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(
            &tmp.path().join("inputs/A/published/index.html"),
            r#"<title>Intro</title><script src="/dist/reveal.js"></script>"#,
        );

        let status = aggregate_lesson(&project, &rewriter_for(&project), "A").unwrap();

        assert!(matches!(
            status,
            LessonStatus::Built {
                layout: SourceLayout::Published,
                ..
            }
        ));
        let out = read(&tmp.path().join("dist/A/index.html"));
        assert!(out.contains(r#"src="../dist/reveal.js""#));
    }

    #[test]
    fn copies_assets_without_video() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        let root = tmp.path().join("inputs/A/published");
        write_file(&root.join("index.html"), "<title>A</title>");
        write_file(&root.join("images/cover.jpg"), "jpg");
        write_file(&root.join("images/intro.mp4"), "video");
        write_file(&root.join("images/loop.WEBM"), "video");
        write_file(&root.join("audio/track1.mp3"), "mp3");
        write_file(&root.join("audio/interview.mov"), "video");

        let status = aggregate_lesson(&project, &rewriter_for(&project), "A").unwrap();

        let dist = tmp.path().join("dist/A");
        assert!(dist.join("images/cover.jpg").exists());
        assert!(dist.join("audio/track1.mp3").exists());
        assert!(!dist.join("images/intro.mp4").exists());
        assert!(!dist.join("images/loop.WEBM").exists());
        assert!(!dist.join("audio/interview.mov").exists());

        let assets = built_assets(&status);
        assert_eq!(assets.len(), 2);
        assert_eq!(
            assets[0].outcome_of("intro.mp4"),
            Some(&CopyOutcome::Filtered)
        );
    }

    #[test]
    fn assets_taken_from_resolved_root_only() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(&tmp.path().join("inputs/A/published/index.html"), "");
        // Sibling of published/, not under the chosen content root
        write_file(&tmp.path().join("inputs/A/images/draft.png"), "png");

        aggregate_lesson(&project, &rewriter_for(&project), "A").unwrap();

        assert!(!tmp.path().join("dist/A/images").exists());
    }

    #[test]
    fn other_files_in_content_root_not_copied() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(&tmp.path().join("inputs/B/index.html"), "");
        write_file(&tmp.path().join("inputs/B/presentation.json"), "{}");
        write_file(&tmp.path().join("inputs/B/lesson.typ"), "= Plan");

        aggregate_lesson(&project, &rewriter_for(&project), "B").unwrap();

        let entries: Vec<_> = fs::read_dir(tmp.path().join("dist/B"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("index.html")]);
    }

    #[test]
    fn missing_index_is_not_ready_and_writes_nothing() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(&tmp.path().join("inputs/C/plan.typ"), "= Draft");

        let status = aggregate_lesson(&project, &rewriter_for(&project), "C").unwrap();

        assert!(matches!(status, LessonStatus::NotReady));
        assert!(!tmp.path().join("dist/C").exists());
    }

    #[test]
    fn reserved_name_rejected_before_writing() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(&tmp.path().join("inputs/plugin/index.html"), "oops");
        write_file(&tmp.path().join("dist/plugin/notes.js"), "engine");

        let err = aggregate_lesson(&project, &rewriter_for(&project), "plugin").unwrap_err();

        assert!(matches!(err, AggregateError::InvalidName(_)));
        assert!(!tmp.path().join("dist/plugin/index.html").exists());
        assert_eq!(read(&tmp.path().join("dist/plugin/notes.js")), "engine");
    }

    #[test]
    fn non_utf8_index_is_read_error() {
        let tmp = setup_project();
        let project = project_at(tmp.path());
        write_file(&tmp.path().join("inputs/D/index.html"), vec![0xff, 0xfe, 0x00]);

        let err = aggregate_lesson(&project, &rewriter_for(&project), "D").unwrap_err();
        assert!(matches!(err, AggregateError::Read { .. }));
    }
}
