use std::path::Path;

use colored::Colorize;
use serde::Serialize;

use crate::backup::Backup;
use crate::config::UninstallOptions;
use crate::error::Result;
use crate::fsutil;
use crate::layout::{
    self, CLAUDE_DIR, CORE_DIR, HANDOFF_DIR, PROJECT_DOCS_DIR, STATE_FILE, UNINSTALL_BACKUP_PREFIX,
};
use crate::output::{self, Format};

/// Root-level state file written by older releases.
const ROOT_STATE_FILE: &str = ".jvibe-state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    pub removed: Vec<String>,
    pub backup_dir: Option<String>,
}

fn targets(options: UninstallOptions) -> Vec<&'static str> {
    let mut targets = vec![CLAUDE_DIR, CORE_DIR, HANDOFF_DIR, ROOT_STATE_FILE, STATE_FILE];
    if options.purge_project_docs {
        targets.push(PROJECT_DOCS_DIR);
    }
    targets
}

/// Remove every managed artifact, backing each one up first unless disabled.
pub fn uninstall(project_dir: &Path, options: UninstallOptions) -> Result<UninstallReport> {
    let existing: Vec<&str> = targets(options)
        .into_iter()
        .filter(|rel| layout::rel(project_dir, rel).exists())
        .collect();

    let mut report = UninstallReport::default();
    if existing.is_empty() {
        return Ok(report);
    }

    if options.backup {
        let mut backup = Backup::new(project_dir, UNINSTALL_BACKUP_PREFIX);
        for rel in &existing {
            backup.save(project_dir, rel)?;
        }
        report.backup_dir = backup
            .dir()
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from);
    }

    for rel in existing {
        fsutil::remove_path(&layout::rel(project_dir, rel))?;
        tracing::info!(path = rel, "removed");
        report.removed.push(rel.to_string());
    }
    Ok(report)
}

pub fn run(project_dir: &Path, options: UninstallOptions, format: Format) -> Result<()> {
    let report = uninstall(project_dir, options)?;
    match format {
        Format::Json => output::print_json(&report)?,
        Format::Pretty => {
            if report.removed.is_empty() {
                eprintln!("{}", "nothing to uninstall".yellow());
                return Ok(());
            }
            eprintln!("{}", "Removed".bold());
            for rel in &report.removed {
                eprintln!("  - {rel}");
            }
            if let Some(dir) = &report.backup_dir {
                eprintln!("backup: {}/", dir.dimmed());
            }
        }
        Format::Minimal => {
            for rel in &report.removed {
                println!("{rel}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str) {
        let path = layout::rel(root, rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel).unwrap();
    }

    #[test]
    fn removes_targets_and_keeps_project_docs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, ".claude/settings.json");
        write(root, "docs/core/Project.md");
        write(root, "docs/project/api.md");
        write(root, ".jvibe-state.json");

        let report = uninstall(root, UninstallOptions::default()).unwrap();

        assert_eq!(report.removed, vec![".claude", "docs/core", ".jvibe-state.json"]);
        assert!(root.join("docs").join("project").join("api.md").exists());
        let backup = root.join(report.backup_dir.unwrap());
        assert_eq!(
            fs::read_to_string(backup.join("docs").join("core").join("Project.md")).unwrap(),
            "docs/core/Project.md"
        );
    }

    #[test]
    fn purge_without_backup() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        write(root, "docs/project/api.md");

        let options = UninstallOptions {
            purge_project_docs: true,
            backup: false,
        };
        let report = uninstall(root, options).unwrap();

        assert_eq!(report.removed, vec!["docs/project"]);
        assert!(report.backup_dir.is_none());
        assert!(crate::backup::find_backups(root).is_empty());
    }

    #[test]
    fn nothing_installed_is_not_an_error() {
        let dir = tempdir().unwrap();
        let report = uninstall(dir.path(), UninstallOptions::default()).unwrap();
        assert_eq!(report, UninstallReport::default());
    }
}
