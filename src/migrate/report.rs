//! Human and machine facing renderings of a detection run.

use serde::Serialize;

use crate::migrate::catalog::{Catalog, SchemaChange};
use crate::model::{ChangeKind, ContentMigration, MigrationPlan, VersionInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    Current,
    Legacy,
    ContentDrift,
    LegacyWithContentDrift,
}

impl std::fmt::Display for ProjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Current => write!(f, "up to date"),
            Self::Legacy => write!(f, "legacy layout"),
            Self::ContentDrift => write!(f, "content drift"),
            Self::LegacyWithContentDrift => write!(f, "legacy layout and content drift"),
        }
    }
}

/// Everything a caller needs to show before (or instead of) executing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub version: Option<String>,
    pub state: ProjectState,
    pub legacy_indicators: Vec<String>,
    pub tasks: Vec<String>,
    pub ai_tasks: Vec<String>,
    pub ai_files: Vec<String>,
}

pub fn summary(info: &VersionInfo, plan: &MigrationPlan) -> Summary {
    let state = match (info.is_legacy, info.content_migration.required) {
        (false, false) => ProjectState::Current,
        (true, false) => ProjectState::Legacy,
        (false, true) => ProjectState::ContentDrift,
        (true, true) => ProjectState::LegacyWithContentDrift,
    };
    Summary {
        version: info.version.clone(),
        state,
        legacy_indicators: info.legacy_indicators.clone(),
        tasks: plan.tasks.clone(),
        ai_tasks: plan.ai_tasks.clone(),
        ai_files: info.content_migration.files.clone(),
    }
}

/// Markdown hand-off for an agent doing the non-mechanical part of a migration.
///
/// `None` when no content migration is required. The output depends only on the
/// inputs, with sections in a fixed order, so successive runs diff cleanly.
pub fn work_order(
    catalog: &Catalog,
    from_version: Option<&str>,
    content: &ContentMigration,
) -> Option<String> {
    if !content.required {
        return None;
    }

    let mut out = String::new();
    let target = catalog.latest_version().unwrap_or("unknown");
    out.push_str("# JVibe Migration Work Order\n\n");
    out.push_str(&format!(
        "Migrating from {} to {target}.\n\n",
        from_version.unwrap_or("an unrecorded version")
    ));
    out.push_str(
        "Update each listed document in place. Keep existing content; add, reshape or \
         rename only what the items below describe.\n",
    );

    if let Some(version) = from_version {
        let check = catalog.check_ai_migration_required(version);
        let groups = [
            ("Added", &check.changes.added),
            ("Modified", &check.changes.modified),
            ("Removed", &check.changes.removed),
            ("Renamed", &check.changes.renamed),
        ];
        for (title, changes) in groups {
            if changes.is_empty() {
                continue;
            }
            out.push_str(&format!("\n## {title}\n\n"));
            for change in changes {
                write_schema_change(&mut out, change);
            }
        }
    }

    let drift = [
        ("Missing fields", ChangeKind::MissingFields),
        ("Missing sections", ChangeKind::MissingSections),
        ("Legacy references", ChangeKind::LegacyDocRefs),
        ("Rebuild", ChangeKind::Rebuild),
    ];
    for (title, kind) in drift {
        let matching: Vec<_> = content.changes.iter().filter(|c| c.kind == kind).collect();
        if matching.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {title}\n\n"));
        for change in matching {
            out.push_str(&format!("- `{}`: {}\n", change.file, change.description));
            for item in &change.items {
                out.push_str(&format!("  - {item}\n"));
            }
        }
    }

    if !content.files.is_empty() {
        out.push_str("\n## Files to migrate\n\n");
        for file in &content.files {
            out.push_str(&format!("- [ ] `{file}`\n"));
        }
    }

    Some(out)
}

fn write_schema_change(out: &mut String, change: &SchemaChange) {
    match change.label() {
        Some(label) => {
            out.push_str(&format!("- `{}` ({label}): {}\n", change.file, change.description));
        }
        None => {
            out.push_str(&format!("- `{}`: {}\n", change.file, change.description));
        }
    }
    if let Some(format) = &change.format {
        out.push_str(&format!("  - Format: `{format}`\n"));
    }
    if let Some(example) = &change.example {
        out.push_str(&format!("  - Example: `{example}`\n"));
    }
    for (label, block) in [
        ("Old format", &change.old_format),
        ("New format", &change.new_format),
    ] {
        if let Some(block) = block {
            out.push_str(&format!("  - {label}:\n\n    ```markdown\n"));
            for line in block.lines() {
                out.push_str(&format!("    {line}\n"));
            }
            out.push_str("    ```\n\n");
        }
    }
}
