//! # lesson-dist
//!
//! Aggregates independently authored lesson slideshows into one deployable
//! static tree, then checks that tree for anything that should never ship.
//! Each lesson unit is a folder under `inputs/`; the slideshow engine and the
//! global images live once at the aggregate root and every lesson links to
//! them through `../`.
//!
//! # Architecture: Build, Then Validate
//!
//! ```text
//! inputs/<unit>/[published/]   ─┐
//! lib/reveal/{dist,plugin,css} ─┼─ build ─→  dist/  ─→  check
//! images/                      ─┘
//! ```
//!
//! A build is four steps run in order by [`pipeline::build`]: clean, publish
//! shared assets, aggregate lessons, regenerate the dashboard. A build is
//! either **full** (wipe and rebuild everything) or **targeted** (rebuild one
//! lesson folder, leave its siblings alone). Hygiene validation is a separate
//! read-only pass over the finished tree.
//!
//! Problems with one file or one lesson never abort a build. They are
//! recorded per item in the [`pipeline::BuildReport`] so a single run tells
//! the author everything that was left out and why.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `lesson-dist.toml` loading, stock defaults, merging, validation |
//! | [`copy`] | Recursive copy with ignore set, size ceiling, and a per-file outcome report |
//! | [`lesson`] | Lesson unit discovery, name validation, content-root resolution |
//! | [`rewrite`] | Engine link rewriting from root-absolute to `../` relative |
//! | [`aggregate`] | Builds one lesson's folder in the aggregate tree |
//! | [`publish`] | Copies engine folders and global images to the aggregate root |
//! | [`dashboard`] | Renders the aggregate root's `index.html` with Maud |
//! | [`pipeline`] | Full and targeted build orchestration with progress events |
//! | [`hygiene`] | Forbidden-file and nested-engine-folder checks on the built tree |
//! | [`output`] | CLI output formatting with bracketed tags |
//!
//! # Design Decisions
//!
//! ## One Shared Engine
//!
//! Copying the engine into every lesson would multiply the deployed size by
//! the number of lessons. Lessons are authored against a root-absolute
//! `/dist/...` layout, so [`rewrite`] turns those links into `../dist/...`
//! and the engine is published once. [`hygiene`] then rejects any lesson
//! that still carries its own engine folder.
//!
//! ## Reserved Names
//!
//! Lesson folders and shared folders share the aggregate root. A lesson named
//! after an engine folder (or `images`) is rejected before anything is
//! written, so a targeted build can never wipe the engine.
//!
//! ## Reproducible Output
//!
//! Lessons are discovered and dashboard cards are ordered by folder name, and
//! copied files keep their source modification times. Rebuilding unchanged
//! inputs yields byte-identical output.

pub mod aggregate;
pub mod config;
pub mod copy;
pub mod dashboard;
pub mod hygiene;
pub mod lesson;
pub mod output;
pub mod pipeline;
pub mod publish;
pub mod rewrite;

#[cfg(test)]
pub(crate) mod test_helpers;
