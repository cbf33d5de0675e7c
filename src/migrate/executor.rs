//! Applies the mechanical part of a [`MigrationPlan`].
//!
//! Steps run in a fixed order. Each has its own precondition and is idempotent
//! on its own, so a run that failed half way can simply be planned and executed
//! again: finished steps no longer appear in the fresh plan.
//!
//! Nothing is rolled back. Directories are copied into a timestamped backup
//! before they are overwritten, and the error names the step that failed.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::backup::Backup;
use crate::error::{JvibeError, Result};
use crate::fsutil;
use crate::layout::{self, AGENTS_DIR, BACKUP_PREFIX, COMMANDS_DIR, FEATURE_LIST, HOOKS_DIR, SETTINGS_FILE};
use crate::migrate::markdown;
use crate::model::MigrationPlan;
use crate::settings::{self, StampKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    MoveDocuments,
    NormalizeFeatureList,
    ReplaceHooks,
    ReplaceCommands,
    ReplaceAgents,
    StampVersion,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MoveDocuments => write!(f, "move-documents"),
            Self::NormalizeFeatureList => write!(f, "normalize-feature-list"),
            Self::ReplaceHooks => write!(f, "replace-hooks"),
            Self::ReplaceCommands => write!(f, "replace-commands"),
            Self::ReplaceAgents => write!(f, "replace-agents"),
            Self::StampVersion => write!(f, "stamp-version"),
        }
    }
}

impl Step {
    pub const ORDER: [Step; 6] = [
        Step::MoveDocuments,
        Step::NormalizeFeatureList,
        Step::ReplaceHooks,
        Step::ReplaceCommands,
        Step::ReplaceAgents,
        Step::StampVersion,
    ];

    /// Whether the plan gives this step anything to do.
    pub fn is_due(self, plan: &MigrationPlan) -> bool {
        let d = &plan.details;
        match self {
            Self::MoveDocuments => !d.docs_to_move.is_empty(),
            // Self-checking: only rewrites when a legacy marker is found.
            Self::NormalizeFeatureList => true,
            Self::ReplaceHooks => !d.hooks_to_update.is_empty(),
            Self::ReplaceCommands => !d.commands_to_rename.is_empty(),
            Self::ReplaceAgents => !d.agents_to_update.is_empty(),
            Self::StampVersion => d.config_to_update,
        }
    }
}

/// What one execution did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub applied: Vec<Step>,
    pub skipped: Vec<Step>,
    /// Feature lists whose status markers were rewritten (each has a `.bak` sibling).
    pub normalized: Vec<String>,
    pub backup_dir: Option<PathBuf>,
}

/// Legacy status markers and their replacements.
pub const STATUS_MARKERS: [(&str, &str); 6] = [
    ("[已完成]", "✅"),
    ("[开发中]", "🚧"),
    ("[未开始]", "❌"),
    ("[完成]", "✅"),
    ("[进行中]", "🚧"),
    ("[待开发]", "❌"),
];

pub fn execute(
    project_dir: &Path,
    template_dir: &Path,
    plan: &MigrationPlan,
    new_version: &str,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();
    let mut backup = Backup::new(project_dir, BACKUP_PREFIX);

    for step in Step::ORDER {
        if !step.is_due(plan) {
            report.skipped.push(step);
            continue;
        }
        tracing::info!(%step, "running migration step");
        let result = match step {
            Step::MoveDocuments => move_documents(project_dir, plan),
            Step::NormalizeFeatureList => {
                normalize_feature_lists(project_dir).map(|done| report.normalized = done)
            }
            Step::ReplaceHooks => replace_hooks(project_dir, template_dir, &mut backup),
            Step::ReplaceCommands => {
                replace_commands(project_dir, template_dir, plan, &mut backup)
            }
            Step::ReplaceAgents => replace_agents(project_dir, template_dir, &mut backup),
            Step::StampVersion => settings::stamp_version(
                &layout::rel(project_dir, SETTINGS_FILE),
                new_version,
                StampKind::Migrated,
            ),
        };
        if backup.is_used() {
            report.backup_dir = Some(backup.dir().to_path_buf());
        }
        result.map_err(|e| e.at_step(step))?;
        report.applied.push(step);
    }

    Ok(report)
}

fn move_documents(project_dir: &Path, plan: &MigrationPlan) -> Result<()> {
    fs::create_dir_all(layout::rel(project_dir, layout::CORE_DIR))?;
    for mv in &plan.details.docs_to_move {
        tracing::info!(from = %mv.from, to = %mv.to, "moving document");
        fsutil::move_no_clobber(
            &layout::rel(project_dir, &mv.from),
            &layout::rel(project_dir, &mv.to),
        )?;
    }
    Ok(())
}

/// Rewrite legacy status markers inside record blocks of every feature list copy.
fn normalize_feature_lists(project_dir: &Path) -> Result<Vec<String>> {
    let mut done = Vec::new();
    for candidate in FEATURE_LIST.candidates() {
        let path = layout::rel(project_dir, &candidate);
        let Some(content) = fsutil::read_optional(&path) else {
            continue;
        };
        let Some(updated) = normalize_status_markers(&content) else {
            continue;
        };
        let mut bak = path.clone().into_os_string();
        bak.push(".bak");
        fs::copy(&path, PathBuf::from(bak))?;
        fs::write(&path, updated)?;
        tracing::info!(path = %candidate, "normalized feature list status markers");
        done.push(candidate);
    }
    Ok(done)
}

/// `Some(rewritten)` when any record block carried a legacy status marker.
///
/// A record block runs from a `## F-NNN` heading to the next heading of level 1 or 2.
pub fn normalize_status_markers(content: &str) -> Option<String> {
    let mut in_record = false;
    let mut changed = false;
    let mut out = String::with_capacity(content.len());

    for line in content.split_inclusive('\n') {
        if markdown::is_record_heading(line) {
            in_record = true;
        } else if line.starts_with("# ") || line.starts_with("## ") {
            in_record = false;
        }

        if in_record && STATUS_MARKERS.iter().any(|(old, _)| line.contains(old)) {
            let mut rewritten = line.to_string();
            for (old, new) in STATUS_MARKERS {
                rewritten = rewritten.replace(old, new);
            }
            out.push_str(&rewritten);
            changed = true;
        } else {
            out.push_str(line);
        }
    }

    changed.then_some(out)
}

fn require_template_dir(template_dir: &Path, relative: &str) -> Result<PathBuf> {
    let dir = layout::rel(template_dir, relative);
    if dir.is_dir() {
        Ok(dir)
    } else {
        Err(JvibeError::TemplateMissing(dir))
    }
}

fn replace_hooks(project_dir: &Path, template_dir: &Path, backup: &mut Backup) -> Result<()> {
    let source = require_template_dir(template_dir, HOOKS_DIR)?;
    backup.save(project_dir, HOOKS_DIR)?;
    fsutil::copy_dir_all(&source, &layout::rel(project_dir, HOOKS_DIR))
}

/// Copy the template commands over, then delete the superseded unprefixed files.
fn replace_commands(
    project_dir: &Path,
    template_dir: &Path,
    plan: &MigrationPlan,
    backup: &mut Backup,
) -> Result<()> {
    let source = require_template_dir(template_dir, COMMANDS_DIR)?;
    let commands = layout::rel(project_dir, COMMANDS_DIR);
    backup.save(project_dir, COMMANDS_DIR)?;
    fsutil::copy_dir_all(&source, &commands)?;

    for rename in &plan.details.commands_to_rename {
        let old = commands.join(&rename.from);
        if old.exists() {
            fs::remove_file(&old)?;
            tracing::info!(from = %rename.from, to = %rename.to, "removed superseded command");
        }
    }
    Ok(())
}

fn replace_agents(project_dir: &Path, template_dir: &Path, backup: &mut Backup) -> Result<()> {
    let source = require_template_dir(template_dir, AGENTS_DIR)?;
    backup.save(project_dir, AGENTS_DIR)?;
    fsutil::copy_dir_all(&source, &layout::rel(project_dir, AGENTS_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CommandRename, DocMove, PlanDetails};
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = layout::rel(root, rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(layout::rel(root, rel)).unwrap()
    }

    fn plan_with(details: PlanDetails) -> MigrationPlan {
        MigrationPlan {
            needs_migration: true,
            details,
            ..MigrationPlan::default()
        }
    }

    #[test]
    fn status_markers_are_rewritten_only_inside_records() {
        let content = "# Features\n\nLegend: [已完成] means done\n\n## F-001 [已完成] Login\n**Status**: [进行中]\n\n## F-002 Signup\n**Status**: planned\n\n## Notes\n[待开发] stays\n";
        let updated = normalize_status_markers(content).unwrap();
        assert!(updated.contains("Legend: [已完成] means done"));
        assert!(updated.contains("## F-001 ✅ Login"));
        assert!(updated.contains("**Status**: 🚧"));
        assert!(updated.contains("## F-002 Signup\n**Status**: planned\n"));
        assert!(updated.contains("[待开发] stays"));
        assert!(normalize_status_markers("## F-003 Clean\n").is_none());
    }

    #[test]
    fn feature_list_normalization_writes_backup_first() {
        let dir = tempdir().unwrap();
        let original = "## F-001 [已完成] Login\n\n## F-002 Signup\n**Status**: planned\n";
        write(dir.path(), "docs/core/Feature-List.md", original);

        let report = execute(dir.path(), dir.path(), &MigrationPlan::default(), "1.1.0").unwrap();

        assert_eq!(report.normalized, vec!["docs/core/Feature-List.md"]);
        assert_eq!(read(dir.path(), "docs/core/Feature-List.md.bak"), original);
        let updated = read(dir.path(), "docs/core/Feature-List.md");
        assert!(updated.starts_with("## F-001 ✅ Login"));
        assert!(updated.contains("## F-002 Signup\n**Status**: planned\n"));
    }

    #[test]
    fn feature_list_with_invalid_utf8_is_still_normalized() {
        let dir = tempdir().unwrap();
        let mut original = "## F-001 [已完成] Login ".as_bytes().to_vec();
        original.extend_from_slice(b"\xff\n");
        let path = layout::rel(dir.path(), "docs/core/Feature-List.md");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, &original).unwrap();

        let report = execute(dir.path(), dir.path(), &MigrationPlan::default(), "1.1.0").unwrap();

        assert_eq!(report.normalized, vec!["docs/core/Feature-List.md"]);
        let mut bak = path.clone().into_os_string();
        bak.push(".bak");
        assert_eq!(fs::read(PathBuf::from(bak)).unwrap(), original);
        assert!(read(dir.path(), "docs/core/Feature-List.md").starts_with("## F-001 ✅ Login"));
    }

    #[test]
    fn moves_documents_and_stamps_version() {
        let dir = tempdir().unwrap();
        write(dir.path(), "docs/Project.md", "project body");
        let plan = plan_with(PlanDetails {
            docs_to_move: vec![DocMove {
                from: "docs/Project.md".into(),
                to: "docs/core/Project.md".into(),
            }],
            config_to_update: true,
            ..PlanDetails::default()
        });

        let report = execute(dir.path(), dir.path(), &plan, "1.1.0").unwrap();

        assert_eq!(
            report.applied,
            vec![
                Step::MoveDocuments,
                Step::NormalizeFeatureList,
                Step::StampVersion
            ]
        );
        assert!(report.backup_dir.is_none());
        assert_eq!(read(dir.path(), "docs/core/Project.md"), "project body");
        assert!(!dir.path().join("docs").join("Project.md").exists());
        let settings = settings::read_settings(&layout::rel(dir.path(), SETTINGS_FILE)).unwrap();
        assert_eq!(settings["jvibe"]["version"], "1.1.0");
        assert!(settings["jvibe"]["migratedAt"].is_string());
    }

    #[test]
    fn destination_conflict_fails_the_move_step() {
        let dir = tempdir().unwrap();
        write(dir.path(), "docs/Project.md", "legacy");
        write(dir.path(), "docs/core/Project.md", "appeared meanwhile");
        let plan = plan_with(PlanDetails {
            docs_to_move: vec![DocMove {
                from: "docs/Project.md".into(),
                to: "docs/core/Project.md".into(),
            }],
            config_to_update: true,
            ..PlanDetails::default()
        });

        let err = execute(dir.path(), dir.path(), &plan, "1.1.0").unwrap_err();

        match &err {
            JvibeError::Step { step, source } => {
                assert_eq!(*step, Step::MoveDocuments);
                assert!(matches!(**source, JvibeError::DestinationExists(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(read(dir.path(), "docs/Project.md"), "legacy");
        assert_eq!(read(dir.path(), "docs/core/Project.md"), "appeared meanwhile");
        // Later steps did not run.
        assert!(!layout::rel(dir.path(), SETTINGS_FILE).exists());
    }

    #[test]
    fn hooks_are_backed_up_then_replaced() {
        let project = tempdir().unwrap();
        let template = tempdir().unwrap();
        write(project.path(), ".claude/hooks/sync-stats.sh", "grep -c old");
        write(project.path(), ".claude/hooks/custom.sh", "mine");
        write(template.path(), ".claude/hooks/sync-stats.sh", "count_status() {}");
        let plan = plan_with(PlanDetails {
            hooks_to_update: vec!["custom.sh".into(), "sync-stats.sh".into()],
            ..PlanDetails::default()
        });

        let report = execute(project.path(), template.path(), &plan, "1.1.0").unwrap();

        let backup = report.backup_dir.expect("backup taken");
        assert!(backup.starts_with(project.path()));
        assert_eq!(
            fs::read_to_string(backup.join(".claude").join("hooks").join("sync-stats.sh")).unwrap(),
            "grep -c old"
        );
        assert_eq!(
            read(project.path(), ".claude/hooks/sync-stats.sh"),
            "count_status() {}"
        );
        assert_eq!(read(project.path(), ".claude/hooks/custom.sh"), "mine");
    }

    #[test]
    fn commands_are_copied_before_superseded_files_are_deleted() {
        let project = tempdir().unwrap();
        let template = tempdir().unwrap();
        write(project.path(), ".claude/commands/init.md", "old init");
        write(template.path(), ".claude/commands/JVibe:init.md", "new init");
        let plan = plan_with(PlanDetails {
            commands_to_rename: vec![CommandRename {
                from: "init.md".into(),
                to: "JVibe:init.md".into(),
            }],
            ..PlanDetails::default()
        });

        execute(project.path(), template.path(), &plan, "1.1.0").unwrap();

        assert_eq!(read(project.path(), ".claude/commands/JVibe:init.md"), "new init");
        assert!(!layout::rel(project.path(), ".claude/commands/init.md").exists());
    }

    #[test]
    fn missing_template_fails_without_touching_project() {
        let project = tempdir().unwrap();
        let template = tempdir().unwrap();
        write(project.path(), ".claude/agents/planner.md", "old");
        let plan = plan_with(PlanDetails {
            agents_to_update: vec!["planner.md".into()],
            ..PlanDetails::default()
        });

        let err = execute(project.path(), template.path(), &plan, "1.1.0").unwrap_err();
        assert_eq!(err.code(), "template_missing");
        assert_eq!(read(project.path(), ".claude/agents/planner.md"), "old");
    }
}
