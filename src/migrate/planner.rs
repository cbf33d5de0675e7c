use std::collections::HashSet;
use std::path::Path;

use crate::layout::{self, AGENT_FILES, AGENTS_DIR, COMMAND_PREFIX, CORE_DOCS};
use crate::migrate::prober;
use crate::model::{CommandRename, DocMove, MigrationPlan, PlanDetails, ProjectSnapshot, VersionInfo};

/// Turn a classification into a declarative plan.
///
/// Returns an empty plan without touching the filesystem when the project is
/// neither legacy nor drifted. Otherwise every move is only scheduled when its
/// source exists and its destination does not, so re-planning a partially
/// migrated tree yields exactly the remaining work.
pub fn plan(project_dir: &Path, info: &VersionInfo) -> MigrationPlan {
    let mut plan = MigrationPlan {
        needs_migration: info.is_legacy,
        needs_ai_migration: info.content_migration.required,
        ..MigrationPlan::default()
    };
    if plan.is_noop() {
        return plan;
    }

    let snap = prober::probe(project_dir);
    plan.details = PlanDetails {
        docs_to_move: doc_moves(project_dir),
        hooks_to_update: hooks_to_update(&snap),
        commands_to_rename: command_renames(&snap),
        agents_to_update: agents_to_update(project_dir, info),
        config_to_update: info.version.is_none(),
        content_changes: info.content_migration.changes.clone(),
    };

    let d = &plan.details;
    for mv in &d.docs_to_move {
        plan.tasks.push(format!("Move document: {} -> {}", mv.from, mv.to));
    }
    if !d.hooks_to_update.is_empty() {
        plan.tasks.push(format!(
            "Replace hook scripts with the current template ({})",
            d.hooks_to_update.join(", ")
        ));
    }
    for rename in &d.commands_to_rename {
        plan.tasks
            .push(format!("Rename command: {} -> {}", rename.from, rename.to));
    }
    if !d.agents_to_update.is_empty() {
        plan.tasks
            .push("Replace agents with the current template".to_string());
    }
    if d.config_to_update {
        plan.tasks
            .push("Write the version stamp into .claude/settings.json".to_string());
    }

    plan.ai_tasks = info
        .content_migration
        .changes
        .iter()
        .map(|change| change.description.clone())
        .collect();

    for task in &plan.tasks {
        tracing::debug!(task = %task, "planned");
    }
    plan
}

/// One move per core document: the first existing legacy candidate, and only when
/// the canonical copy is absent.
fn doc_moves(project_dir: &Path) -> Vec<DocMove> {
    let mut destinations = HashSet::new();
    let mut moves = Vec::new();
    for doc in CORE_DOCS {
        let to = doc.canonical_path();
        if layout::rel(project_dir, &to).exists() {
            continue;
        }
        let from = doc
            .legacy_candidates()
            .into_iter()
            .find(|candidate| layout::rel(project_dir, candidate).is_file());
        if let Some(from) = from
            && destinations.insert(to.clone())
        {
            moves.push(DocMove { from, to });
        }
    }
    moves
}

fn hooks_to_update(snap: &ProjectSnapshot) -> Vec<String> {
    if snap.hook_issues.is_empty() {
        return Vec::new();
    }
    snap.hook_files.clone()
}

fn command_renames(snap: &ProjectSnapshot) -> Vec<CommandRename> {
    snap.legacy_commands
        .iter()
        .map(|from| {
            let base = from.strip_suffix(".md").unwrap_or(from);
            CommandRename {
                from: from.clone(),
                to: format!("{COMMAND_PREFIX}{base}.md"),
            }
        })
        .collect()
}

fn agents_to_update(project_dir: &Path, info: &VersionInfo) -> Vec<String> {
    if !info.is_legacy || !layout::rel(project_dir, AGENTS_DIR).is_dir() {
        return Vec::new();
    }
    AGENT_FILES.iter().map(|s| s.to_string()).collect()
}
