use clap::{Parser, Subcommand};
use lesson_dist::config::{self, Project};
use lesson_dist::pipeline::{self, BuildMode};
use lesson_dist::{hygiene, lesson, output};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lesson-dist")]
#[command(about = "Aggregate lesson slideshows into one deployable site")]
#[command(long_about = "\
Aggregate lesson slideshows into one deployable site

Each folder under inputs/ is a lesson unit. Its deck is taken from
published/index.html, or from index.html in the unit folder itself. The
slideshow engine and global images are published once at the root of dist/
and every lesson links to them through ../

Project structure:

  ./
  ├── lesson-dist.toml             # Config (optional, see gen-config)
  ├── lib/reveal/                  # Slideshow engine checkout
  │   ├── dist/                    # → dist/dist/
  │   ├── plugin/                  # → dist/plugin/
  │   └── css/                     # → dist/css/
  ├── images/                      # Global images → dist/images/
  └── inputs/
      ├── 01-Structure/
      │   └── published/           # Preferred content root
      │       ├── index.html       # → dist/01-Structure/index.html
      │       ├── images/          # → dist/01-Structure/images/
      │       └── audio/           # → dist/01-Structure/audio/
      ├── 05-Reading/              # Fallback: unit folder is the content root
      │   └── index.html
      └── 12-Feedback/             # No index.html yet: skipped
          └── notes.typ

Copy rules:
  Never copied: .git, .DS_Store, desktop.ini, Thumbs.db, files over 1 MiB
  Lesson assets: video (.mp4 .webm .mov .avi) is never copied
  Engine links:  src=\"/dist/...\"  →  src=\"../dist/...\"

Run 'lesson-dist gen-config' to generate a documented lesson-dist.toml.")]
#[command(version)]
struct Cli {
    /// Project root holding inputs/, the engine and lesson-dist.toml
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/lesson-dist.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build every lesson, or only LESSON, into the aggregate tree
    Build {
        /// Rebuild only this lesson folder, leaving the others untouched
        lesson: Option<String>,

        /// Write the JSON build report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Validate the aggregate tree for forbidden files
    Check {
        /// Aggregate tree to check (default: the configured dist path)
        #[arg(long)]
        dist: Option<PathBuf>,
    },
    /// List lesson units and where their deck is found
    List,
    /// Print a stock lesson-dist.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(ExitCode::SUCCESS);
    }

    let project = load_project(&cli.root, cli.config.as_deref())?;

    match cli.command {
        Command::Build { lesson, report } => {
            let mode = BuildMode::from_lesson(lesson);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline::build(&project, mode, Some(tx));
            printer.join().map_err(|_| "event printer thread panicked")?;
            let build_report = result?;

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&build_report)?;
                std::fs::write(&path, json)?;
            }
            output::print_build_summary(&build_report);
        }
        Command::Check { dist } => {
            let dist = dist.unwrap_or_else(|| project.dist_dir());
            let outcome = hygiene::validate(
                &dist,
                &project.config.hygiene,
                &project.config.reserved_names(),
            )?;
            output::print_hygiene_outcome(&outcome);
            if !outcome.passed() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::List => {
            let listings = lesson::list(&project.inputs_dir(), &project.config.reserved_names())
                .map_err(|e| format!("cannot list {}: {e}", project.inputs_dir().display()))?;
            output::print_lesson_list(&listings);
        }
        Command::GenConfig => unreachable!("handled before loading the project"),
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the config from `--config`, or from the project root when present.
fn load_project(root: &Path, config_path: Option<&Path>) -> Result<Project, config::ConfigError> {
    let site_config = match config_path {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(root)?,
    };
    Ok(Project::new(root, site_config))
}
