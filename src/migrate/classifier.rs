use std::path::Path;

use crate::config::EngineConfig;
use crate::fsutil;
use crate::layout::{self, COMMAND_PREFIX, CORE_DOCS, DOCS_DIR, HANDOFF_DIR};
use crate::migrate::catalog::Catalog;
use crate::migrate::differ;
use crate::migrate::prober;
use crate::model::{ChangeDescriptor, ChangeKind, ContentMigration, ProjectSnapshot, VersionInfo};

pub const MISSING_VERSION: &str = "missing version";

/// Decides whether a project is legacy and whether its content needs AI-assisted migration.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    catalog: &'a Catalog,
    config: &'a EngineConfig,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Probe `project_dir` and classify the result.
    pub fn detect(&self, project_dir: &Path) -> VersionInfo {
        self.classify(&prober::probe(project_dir))
    }

    pub fn classify(&self, snap: &ProjectSnapshot) -> VersionInfo {
        let mut indicators = snap.indicators.clone();
        let is_legacy = legacy_decision(snap, &mut indicators);
        let content_migration = self.content_migration(&snap.root, snap.version.as_deref());

        tracing::debug!(
            is_legacy,
            content_migration = content_migration.required,
            changes = content_migration.changes.len(),
            "classified project"
        );

        VersionInfo {
            version: snap.version.clone(),
            is_legacy,
            legacy_indicators: indicators,
            structure: snap.structure.clone(),
            content_migration,
        }
    }

    /// Content drift, computed regardless of the legacy decision.
    pub fn content_migration(&self, project_dir: &Path, version: Option<&str>) -> ContentMigration {
        let mut result = ContentMigration::default();

        let referencing = files_with_legacy_refs(project_dir);
        if !referencing.is_empty() {
            result.required = true;
            for file in referencing {
                result.add_file(file);
            }
            let names: Vec<&str> = CORE_DOCS.iter().map(|d| d.legacy_name).collect();
            result.changes.push(ChangeDescriptor::new(
                ChangeKind::LegacyDocRefs,
                "docs/**",
                format!(
                    "Documents still reference legacy core document names ({}); update them to the English names",
                    names.join(", ")
                ),
            ));
        }

        let diff = differ::diff_against_template(
            project_dir,
            &self.config.template_core_dir(),
            version,
            &self.config.tool_version,
        );
        if diff.required {
            result.required = true;
            for file in diff.files {
                result.add_file(file);
            }
            result.missing_fields.extend(diff.missing_fields);
            result.changes.extend(diff.changes);
        }

        if let Some(version) = version {
            let check = self.catalog.check_ai_migration_required(version);
            if check.required {
                result.required = true;
                for file in check.files {
                    result.add_file(file);
                }
                let groups = [
                    (ChangeKind::NewField, &check.changes.added),
                    (ChangeKind::ModifiedField, &check.changes.modified),
                    (ChangeKind::Renamed, &check.changes.renamed),
                ];
                for (kind, changes) in groups {
                    result.changes.extend(changes.iter().map(|c| {
                        ChangeDescriptor::new(kind, c.file.clone(), c.description.clone())
                            .with_field(c.label().map(String::from))
                    }));
                }
            }
        }

        result
    }
}

/// First matching rule wins; indicators explain the rule that fired.
fn legacy_decision(snap: &ProjectSnapshot, indicators: &mut Vec<String>) -> bool {
    if snap.version.is_none() {
        indicators.push(MISSING_VERSION.to_string());
        return true;
    }

    if snap.structure.has_legacy_docs {
        return true;
    }

    if !snap.legacy_commands.is_empty() {
        indicators.push(format!(
            "commands without the {COMMAND_PREFIX} prefix: {}",
            snap.legacy_commands.join(", ")
        ));
        return true;
    }

    if !snap.hook_issues.is_empty() {
        indicators.extend(snap.hook_issues.iter().map(|issue| issue.describe()));
        return true;
    }

    false
}

/// Markdown files under `docs/` that mention a localized legacy core document name.
/// Generated hand-off files under `docs/.jvibe/` are skipped.
fn files_with_legacy_refs(project_dir: &Path) -> Vec<String> {
    let docs = layout::rel(project_dir, DOCS_DIR);
    let handoff = layout::rel(project_dir, HANDOFF_DIR);
    fsutil::markdown_files(&docs)
        .into_iter()
        .filter(|path| !path.starts_with(&handoff))
        .filter(|path| {
            fsutil::read_optional(path).is_some_and(|content| {
                CORE_DOCS
                    .iter()
                    .any(|doc| content.contains(doc.legacy_name))
            })
        })
        .map(|path| layout::display_rel(project_dir, &path))
        .collect()
}
