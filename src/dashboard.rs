//! Dashboard generation.
//!
//! The aggregate root's `index.html` always belongs to the dashboard: it is
//! regenerated in full on every build, full or targeted, by re-scanning the
//! whole aggregate root. Every top-level folder that is not a reserved shared
//! asset and holds an `index.html` gets one card:
//!
//! ```html
//! <a href="A/" class="card"><h3>Intro</h3><p>A</p></a>
//! ```
//!
//! Card titles come from the lesson's first `<title>`; the folder name is the
//! fallback. Cards are ordered by folder name so the page is reproducible.
//!
//! Rendered with [maud](https://maud.lambda.xyz/). The lesson title is already
//! HTML text (it was lifted out of an HTML document), so it is embedded as-is;
//! folder names are escaped.

use crate::config::DashboardConfig;
use crate::lesson::INDEX_FILE;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::LazyLock;

const CSS: &str = include_str!("../static/dashboard.css");

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").expect("title pattern is valid"));

/// One card on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardEntry {
    pub folder: String,
    pub title: String,
}

/// First `<title>` content on a single line, trimmed. `None` if absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
    TITLE_RE
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Scan the aggregate root for built lessons, sorted by folder name.
pub fn collect_entries(dist: &Path, reserved: &[String]) -> io::Result<Vec<DashboardEntry>> {
    let mut folders: Vec<String> = fs::read_dir(dist)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| !reserved.contains(name))
        .collect();
    folders.sort();

    Ok(folders
        .into_iter()
        .filter_map(|folder| {
            let index = dist.join(&folder).join(INDEX_FILE);
            if !index.is_file() {
                return None;
            }
            let title = fs::read_to_string(&index)
                .ok()
                .and_then(|html| extract_title(&html))
                .unwrap_or_else(|| folder.clone());
            Some(DashboardEntry { folder, title })
        })
        .collect())
}

/// Render the dashboard document.
pub fn render_dashboard(entries: &[DashboardEntry], config: &DashboardConfig) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (config.title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                h1 { (config.heading) }
                div.grid {
                    @for entry in entries {
                        a.card href={ (entry.folder) "/" } {
                            h3 { (PreEscaped(&entry.title)) }
                            p { (entry.folder) }
                        }
                    }
                }
                @if entries.is_empty() {
                    p.empty { "No presentations built yet." }
                }
            }
        }
    }
}

/// Scan the aggregate root and overwrite its `index.html` with the dashboard.
pub fn write_dashboard(
    dist: &Path,
    reserved: &[String],
    config: &DashboardConfig,
) -> io::Result<Vec<DashboardEntry>> {
    let entries = collect_entries(dist, reserved)?;
    let page = render_dashboard(&entries, config);
    fs::write(dist.join(INDEX_FILE), page.into_string())?;
    Ok(entries)
}
