use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::error::{JvibeError, Result};
use crate::fsutil;
use crate::layout::{
    self, AGENTS_DIR, CLAUDE_DIR, COMMANDS_DIR, CORE_DIR, CORE_DOCS, HOOKS_DIR, PROJECT_DOCS_DIR,
    SETTINGS_FILE,
};
use crate::output::{self, Format};
use crate::settings::{self, Stamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectStatus {
    #[serde(flatten)]
    pub stamp: Stamp,
    pub agents: usize,
    pub commands: usize,
    pub hooks: usize,
    /// Markdown files in `docs/core/`; `None` when the directory is absent.
    pub core_docs: Option<usize>,
    pub core_docs_expected: usize,
    pub project_docs: Option<usize>,
}

pub fn collect(project_dir: &Path) -> Result<ProjectStatus> {
    if !layout::rel(project_dir, CLAUDE_DIR).is_dir() {
        return Err(JvibeError::NotInitialized);
    }
    let settings = settings::read_settings(&layout::rel(project_dir, SETTINGS_FILE))?;
    let stamp = settings::stamp_of(&settings);
    let count = |dir: &str, ext: &str| {
        fsutil::list_files_with_ext(&layout::rel(project_dir, dir), ext).len()
    };
    let count_if_dir = |dir: &str| {
        layout::rel(project_dir, dir)
            .is_dir()
            .then(|| count(dir, "md"))
    };

    Ok(ProjectStatus {
        stamp,
        agents: count(AGENTS_DIR, "md"),
        commands: count(COMMANDS_DIR, "md"),
        hooks: count(HOOKS_DIR, "sh"),
        core_docs: count_if_dir(CORE_DIR),
        core_docs_expected: CORE_DOCS.len(),
        project_docs: count_if_dir(PROJECT_DOCS_DIR),
    })
}

pub fn run(project_dir: &Path, format: Format) -> Result<()> {
    let status = collect(project_dir)?;
    match format {
        Format::Json => output::print_json(&status)?,
        Format::Pretty => print_pretty(&status),
        Format::Minimal => println!(
            "{} agents={} commands={} hooks={} core={}/{} project={}",
            status.stamp.version.as_deref().unwrap_or("-"),
            status.agents,
            status.commands,
            status.hooks,
            status.core_docs.unwrap_or(0),
            status.core_docs_expected,
            status.project_docs.unwrap_or(0),
        ),
    }
    Ok(())
}

fn mark(present: bool) -> String {
    if present {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn print_pretty(status: &ProjectStatus) {
    let unknown = "unknown";
    let stamp = &status.stamp;
    eprintln!("{}", "Configuration".bold());
    eprintln!("  version:      {}", stamp.version.as_deref().unwrap_or(unknown));
    eprintln!("  mode:         {}", stamp.mode.as_deref().unwrap_or(unknown));
    eprintln!("  installed at: {}", stamp.installed_at.as_deref().unwrap_or(unknown));
    if let Some(at) = &stamp.upgraded_at {
        eprintln!("  upgraded at:  {at}");
    }
    if let Some(at) = &stamp.migrated_at {
        eprintln!("  migrated at:  {at}");
    }

    eprintln!();
    eprintln!("{}", "Components".bold());
    eprintln!("  agents:   {} ({})", mark(status.agents > 0), status.agents);
    eprintln!("  commands: {} ({})", mark(status.commands > 0), status.commands);
    eprintln!("  hooks:    {} ({})", mark(status.hooks > 0), status.hooks);

    eprintln!();
    eprintln!("{}", "Documents".bold());
    match status.core_docs {
        Some(n) if n >= status.core_docs_expected => {
            eprintln!("  core:    {} ({n}/{})", mark(true), status.core_docs_expected)
        }
        Some(n) => eprintln!("  core:    {} ({n}/{})", "⚠".yellow(), status.core_docs_expected),
        None => eprintln!("  core:    {} (not created)", mark(false)),
    }
    match status.project_docs {
        Some(n) => eprintln!("  project: {} ({n})", mark(true)),
        None => eprintln!("  project: {} (not created)", "-".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn counts_components_and_documents() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for rel in [
            ".claude/agents/planner.md",
            ".claude/agents/notes.txt",
            ".claude/commands/JVibe:init.md",
            ".claude/hooks/load-context.sh",
            "docs/core/Project.md",
            "docs/core/Standards.md",
        ] {
            let path = layout::rel(root, rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x").unwrap();
        }
        fs::write(
            layout::rel(root, SETTINGS_FILE),
            r#"{"jvibe": {"version": "1.0.7", "mode": "full"}}"#,
        )
        .unwrap();

        let status = collect(root).unwrap();
        assert_eq!(status.stamp.version.as_deref(), Some("1.0.7"));
        assert_eq!(status.stamp.mode.as_deref(), Some("full"));
        assert_eq!(status.agents, 1);
        assert_eq!(status.commands, 1);
        assert_eq!(status.hooks, 1);
        assert_eq!(status.core_docs, Some(2));
        assert_eq!(status.project_docs, None);
    }

    #[test]
    fn requires_claude_dir() {
        let dir = tempdir().unwrap();
        let err = collect(dir.path()).unwrap_err();
        assert_eq!(err.code(), "not_initialized");
    }
}
