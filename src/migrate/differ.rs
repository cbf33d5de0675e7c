use std::path::Path;

use serde::Serialize;

use crate::fsutil;
use crate::layout::{self, CORE_DOCS, CoreDoc, FEATURE_LIST};
use crate::migrate::markdown;
use crate::model::{ChangeDescriptor, ChangeKind};

/// Structural comparison of a project's core documents against the template copies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateDiff {
    /// False when no template reference exists; everything else is then empty.
    pub applied: bool,
    pub required: bool,
    pub files: Vec<String>,
    pub missing_fields: Vec<String>,
    pub changes: Vec<ChangeDescriptor>,
}

/// Compare every core document against `template_core_dir`.
///
/// When `recorded_version` is present and differs from `tool_version`, a blanket
/// `rebuild` change is added as soon as the comparison ran at all.
pub fn diff_against_template(
    project_dir: &Path,
    template_core_dir: &Path,
    recorded_version: Option<&str>,
    tool_version: &str,
) -> TemplateDiff {
    let mut diff = TemplateDiff::default();
    if !template_core_dir.is_dir() {
        tracing::debug!(template = %template_core_dir.display(), "no template reference, skipping diff");
        return diff;
    }
    diff.applied = true;

    for doc in CORE_DOCS {
        let Some(template) = fsutil::read_optional(&template_core_dir.join(doc.name)) else {
            continue;
        };
        let Some((rel_path, project)) = resolve_project_copy(project_dir, &doc) else {
            continue;
        };

        let change = if doc == FEATURE_LIST {
            diff_record_fields(&rel_path, &template, &project).map(|(change, fields)| {
                diff.missing_fields.extend(fields);
                change
            })
        } else {
            diff_sections(&rel_path, &template, &project)
        };

        if let Some(change) = change {
            diff.required = true;
            if !diff.files.contains(&rel_path) {
                diff.files.push(rel_path);
            }
            diff.changes.push(change);
        }
    }

    if let Some(recorded) = recorded_version
        && recorded != tool_version
    {
        diff.required = true;
        diff.changes.push(ChangeDescriptor::new(
            ChangeKind::Rebuild,
            "docs/core/*.md",
            format!(
                "Core documents must be rebuilt from the current template (recorded {recorded}, current {tool_version})"
            ),
        ));
    }

    diff
}

/// First existing copy among the document's candidate paths, canonical first.
pub fn resolve_project_copy(project_dir: &Path, doc: &CoreDoc) -> Option<(String, String)> {
    doc.candidates().into_iter().find_map(|candidate| {
        let path = layout::rel(project_dir, &candidate);
        if !path.is_file() {
            return None;
        }
        fsutil::read_optional(&path).map(|content| (candidate, content))
    })
}

fn diff_record_fields(
    rel_path: &str,
    template: &str,
    project: &str,
) -> Option<(ChangeDescriptor, Vec<String>)> {
    let required = markdown::template_record_fields(template);
    if required.is_empty() {
        return None;
    }
    let blocks = markdown::record_blocks(project);
    if blocks.is_empty() {
        return None;
    }

    let missing: Vec<String> = required
        .into_iter()
        .filter(|field| {
            blocks
                .iter()
                .any(|block| !markdown::block_has_field(block, field))
        })
        .collect();
    if missing.is_empty() {
        return None;
    }

    let change = ChangeDescriptor::new(
        ChangeKind::MissingFields,
        rel_path,
        format!(
            "Feature list entries are missing template fields: {}",
            missing.join(", ")
        ),
    )
    .with_items(missing.clone());
    Some((change, missing))
}

fn diff_sections(rel_path: &str, template: &str, project: &str) -> Option<ChangeDescriptor> {
    let present = markdown::extract_headings(project, &[2]);
    let missing: Vec<String> = markdown::ordered_sections(template)
        .into_iter()
        .filter(|heading| !present.contains(heading))
        .collect();
    if missing.is_empty() {
        return None;
    }
    Some(
        ChangeDescriptor::new(
            ChangeKind::MissingSections,
            rel_path,
            format!(
                "Document is missing template sections: {}",
                missing.join(", ")
            ),
        )
        .with_items(missing),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        project: TempDir,
        template: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                project: tempdir().unwrap(),
                template: tempdir().unwrap(),
            }
        }

        fn template_doc(&self, name: &str, content: &str) {
            let core = self.template.path().join("docs").join("core");
            fs::create_dir_all(&core).unwrap();
            fs::write(core.join(name), content).unwrap();
        }

        fn project_doc(&self, rel: &str, content: &str) {
            let path = layout::rel(self.project.path(), rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn diff(&self, version: Option<&str>) -> TemplateDiff {
            diff_against_template(
                self.project.path(),
                &self.template.path().join("docs").join("core"),
                version,
                "1.1.0",
            )
        }
    }

    #[test]
    fn missing_template_is_a_noop() {
        let fx = Fixture::new();
        fx.project_doc("docs/core/Project.md", "## Anything");
        let diff = fx.diff(Some("0.1.0"));
        assert!(!diff.applied);
        assert!(!diff.required);
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn reports_single_missing_field_across_blocks() {
        let fx = Fixture::new();
        fx.template_doc(
            "Feature-List.md",
            "# Features\n\n## F-001 Example\n**A**: one\n**B**: two\n",
        );
        fx.project_doc("docs/core/Feature-List.md", "## F-007 Real\n**A**: only a\n");

        let diff = fx.diff(Some("1.1.0"));
        assert!(diff.required);
        assert_eq!(diff.changes.len(), 1);
        let change = &diff.changes[0];
        assert_eq!(change.kind, ChangeKind::MissingFields);
        assert_eq!(change.file, "docs/core/Feature-List.md");
        assert_eq!(change.items, vec!["B"]);
        assert_eq!(diff.missing_fields, vec!["B"]);
    }

    #[test]
    fn missing_fields_are_unioned_over_blocks() {
        let fx = Fixture::new();
        fx.template_doc("Feature-List.md", "## F-001 X\n**A**: \n**B**: \n**C**: \n");
        fx.project_doc(
            "docs/Feature-List.md",
            "## F-001 one\n**A**: x\n**B**: y\n\n## F-002 two\n**A**: x\n**C**: z\n",
        );

        let diff = fx.diff(None);
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].items, vec!["B", "C"]);
        assert_eq!(diff.files, vec!["docs/Feature-List.md"]);
    }

    #[test]
    fn decorated_headings_match_plain_ones() {
        let fx = Fixture::new();
        fx.template_doc("Project.md", "# Project\n## 1. 📦 Overview\n## 2. Tech Stack (required)\n");
        fx.project_doc("docs/core/Project.md", "## Overview\n## `Tech` Stack\n");
        let diff = fx.diff(Some("1.1.0"));
        assert!(!diff.required, "unexpected drift: {:?}", diff.changes);
    }

    #[test]
    fn missing_section_is_reported_in_template_order() {
        let fx = Fixture::new();
        fx.template_doc("Project.md", "## Overview\n## Environment\n## Deployment\n");
        fx.project_doc("docs/core/Project.md", "## Overview\n");
        let diff = fx.diff(Some("1.1.0"));
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].kind, ChangeKind::MissingSections);
        assert_eq!(diff.changes[0].items, vec!["environment", "deployment"]);
    }

    #[test]
    fn canonical_copy_takes_precedence_over_legacy() {
        let fx = Fixture::new();
        fx.template_doc("Project.md", "## Overview\n");
        fx.project_doc("docs/core/Project.md", "## Overview\n");
        fx.project_doc("docs/项目文档.md", "## 概述\n");
        let diff = fx.diff(Some("1.1.0"));
        assert!(diff.changes.is_empty());
    }

    #[test]
    fn version_mismatch_adds_rebuild_only_when_stamped() {
        let fx = Fixture::new();
        fx.template_doc("Project.md", "## Overview\n");

        let stale = fx.diff(Some("1.0.7"));
        assert!(stale.required);
        assert_eq!(stale.changes.len(), 1);
        assert_eq!(stale.changes[0].kind, ChangeKind::Rebuild);

        let unstamped = fx.diff(None);
        assert!(!unstamped.required);
    }
}
