use std::path::Path;

use crate::fsutil;
use crate::layout::{
    self, AGENTS_DIR, CLAUDE_DIR, COMMANDS_DIR, COMMAND_PREFIX, CORE_DIR, CORE_DOCS, DOCS_DIR,
    HOOKS_DIR, PROJECT_DOCS_DIR, SCANNED_HOOKS, SETTINGS_FILE, STATE_FILE,
};
use crate::model::{
    DocPresence, HookIssue, HookIssueKind, LegacyDoc, LegacyDocKind, ProjectSnapshot, Structure,
};
use crate::settings;

const DEPRECATED_COUNT_SYNTAX: &str = "grep -c";
const CURRENT_COUNT_HELPER: &str = "count_status()";
const CURRENT_FEATURE_LIST_PATH: &str = "docs/core/Feature-List.md";
const DEPRECATED_FEATURE_LIST_PATHS: [&str; 2] = ["docs/Feature-List.md", "docs/功能清单.md"];

/// Gather structural facts about `project_dir`. Never fails: absence is a fact, not an error.
pub fn probe(project_dir: &Path) -> ProjectSnapshot {
    let mut snap = ProjectSnapshot {
        root: project_dir.to_path_buf(),
        ..ProjectSnapshot::default()
    };

    probe_claude_dir(project_dir, &mut snap);
    probe_docs(project_dir, &mut snap);

    snap.structure.has_state_file = layout::rel(project_dir, STATE_FILE).exists();

    tracing::debug!(
        root = %project_dir.display(),
        version = ?snap.version,
        legacy_docs = snap.legacy_docs.len(),
        legacy_commands = snap.legacy_commands.len(),
        hook_issues = snap.hook_issues.len(),
        "probed project"
    );
    snap
}

fn probe_claude_dir(root: &Path, snap: &mut ProjectSnapshot) {
    if !layout::rel(root, CLAUDE_DIR).is_dir() {
        return;
    }
    snap.structure.has_claude_dir = true;

    let settings_path = layout::rel(root, SETTINGS_FILE);
    if settings_path.exists() {
        snap.structure.has_settings_json = true;
        match settings::read_settings(&settings_path) {
            Ok(map) => {
                snap.version = settings::stamp_of(&map)
                    .version
                    .filter(|v| !v.is_empty());
            }
            Err(err) => {
                tracing::warn!(%err, "settings.json could not be parsed");
                snap.settings_malformed = true;
                snap.indicators
                    .push("settings.json is malformed or unreadable".to_string());
            }
        }
    }

    let agents = layout::rel(root, AGENTS_DIR);
    let commands = layout::rel(root, COMMANDS_DIR);
    let hooks = layout::rel(root, HOOKS_DIR);
    snap.structure.has_agents = agents.is_dir();
    snap.structure.has_commands = commands.is_dir();
    snap.structure.has_hooks = hooks.is_dir();

    snap.legacy_commands = fsutil::list_files_with_ext(&commands, "md")
        .into_iter()
        .filter(|name| !name.starts_with(COMMAND_PREFIX))
        .collect();

    if snap.structure.has_hooks {
        snap.hook_files = fsutil::list_files_with_ext(&hooks, "sh");
        snap.hook_issues = scan_hooks(&hooks);
    }
}

/// Check each scanned hook script for deprecated syntax and deprecated document paths.
pub fn scan_hooks(hooks_dir: &Path) -> Vec<HookIssue> {
    let mut issues = Vec::new();
    for hook in SCANNED_HOOKS {
        let Some(content) = fsutil::read_optional(&hooks_dir.join(hook)) else {
            continue;
        };

        if hook == "sync-stats.sh"
            && content.contains(DEPRECATED_COUNT_SYNTAX)
            && !content.contains(CURRENT_COUNT_HELPER)
        {
            issues.push(HookIssue {
                hook: hook.to_string(),
                kind: HookIssueKind::DeprecatedSyntax,
            });
        }

        let deprecated_path = !content.contains(CURRENT_FEATURE_LIST_PATH)
            && DEPRECATED_FEATURE_LIST_PATHS
                .iter()
                .any(|p| content.contains(p));
        if deprecated_path {
            issues.push(HookIssue {
                hook: hook.to_string(),
                kind: HookIssueKind::DeprecatedPath,
            });
        }
    }
    issues
}

fn probe_docs(root: &Path, snap: &mut ProjectSnapshot) {
    let docs = layout::rel(root, DOCS_DIR);
    if !docs.is_dir() {
        snap.documents = CORE_DOCS
            .iter()
            .map(|doc| DocPresence {
                name: doc.name.to_string(),
                found_at: Vec::new(),
            })
            .collect();
        return;
    }
    snap.structure.has_docs_dir = true;
    snap.structure.has_docs_core_dir = layout::rel(root, CORE_DIR).is_dir();
    snap.structure.has_docs_project_dir = layout::rel(root, PROJECT_DOCS_DIR).is_dir();

    // Any core document, either name, directly under docs/.
    let flat_names = CORE_DOCS
        .iter()
        .map(|d| d.name)
        .chain(CORE_DOCS.iter().map(|d| d.legacy_name));
    for name in flat_names {
        let path = format!("{DOCS_DIR}/{name}");
        if layout::rel(root, &path).is_file() {
            snap.indicators.push(format!("legacy location: {path}"));
            snap.legacy_docs.push(LegacyDoc {
                path,
                kind: LegacyDocKind::FlatLocation,
            });
        }
    }

    for doc in CORE_DOCS {
        let path = format!("{CORE_DIR}/{}", doc.legacy_name);
        if layout::rel(root, &path).is_file() {
            snap.indicators.push(format!("legacy name: {path}"));
            snap.legacy_docs.push(LegacyDoc {
                path,
                kind: LegacyDocKind::LocalizedName,
            });
        }
    }
    snap.structure.has_legacy_docs = !snap.legacy_docs.is_empty();

    snap.documents = CORE_DOCS
        .iter()
        .map(|doc| DocPresence {
            name: doc.name.to_string(),
            found_at: doc
                .candidates()
                .into_iter()
                .filter(|candidate| layout::rel(root, candidate).is_file())
                .collect(),
        })
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = layout::rel(root, rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn empty_directory_probes_without_error() {
        let dir = tempdir().unwrap();
        let snap = probe(dir.path());
        assert_eq!(snap.version, None);
        assert_eq!(snap.structure, Structure::default());
        assert!(snap.indicators.is_empty());
        assert_eq!(snap.documents.len(), 4);
        assert!(snap.documents.iter().all(|d| d.found_at.is_empty()));
    }

    #[test]
    fn reads_version_from_settings_namespace() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            SETTINGS_FILE,
            r#"{"jvibe": {"version": "1.0.3", "mode": "full"}}"#,
        );
        let snap = probe(dir.path());
        assert!(snap.structure.has_settings_json);
        assert_eq!(snap.version.as_deref(), Some("1.0.3"));
        assert!(!snap.settings_malformed);
    }

    #[test]
    fn malformed_settings_are_an_indicator_not_an_error() {
        let dir = tempdir().unwrap();
        write(dir.path(), SETTINGS_FILE, "{ broken");
        let snap = probe(dir.path());
        assert!(snap.settings_malformed);
        assert_eq!(snap.version, None);
        assert!(snap.indicators.iter().any(|i| i.contains("malformed")));
    }

    #[test]
    fn non_object_settings_count_as_malformed() {
        let dir = tempdir().unwrap();
        write(dir.path(), SETTINGS_FILE, r#"["keep-me"]"#);
        let snap = probe(dir.path());
        assert!(snap.settings_malformed);
        assert!(snap.indicators.iter().any(|i| i.contains("malformed")));
    }

    #[test]
    fn empty_version_string_reads_as_missing() {
        let dir = tempdir().unwrap();
        write(dir.path(), SETTINGS_FILE, r#"{"jvibe": {"version": ""}}"#);
        let snap = probe(dir.path());
        assert_eq!(snap.version, None);
        assert!(!snap.settings_malformed);
    }

    #[test]
    fn detects_flat_and_localized_legacy_docs() {
        let dir = tempdir().unwrap();
        write(dir.path(), "docs/Project.md", "# p");
        write(dir.path(), "docs/core/功能清单.md", "# f");
        write(dir.path(), "docs/core/Standards.md", "# s");

        let snap = probe(dir.path());
        assert!(snap.structure.has_legacy_docs);
        assert_eq!(
            snap.legacy_docs,
            vec![
                LegacyDoc {
                    path: "docs/Project.md".into(),
                    kind: LegacyDocKind::FlatLocation
                },
                LegacyDoc {
                    path: "docs/core/功能清单.md".into(),
                    kind: LegacyDocKind::LocalizedName
                },
            ]
        );
        let feature = snap
            .documents
            .iter()
            .find(|d| d.name == "Feature-List.md")
            .unwrap();
        assert_eq!(feature.found_at, vec!["docs/core/功能清单.md"]);
        let standards = snap.documents.iter().find(|d| d.name == "Standards.md").unwrap();
        assert_eq!(standards.found_at, vec!["docs/core/Standards.md"]);
    }

    #[test]
    fn flags_unprefixed_commands() {
        let dir = tempdir().unwrap();
        write(dir.path(), ".claude/commands/init.md", "x");
        write(dir.path(), ".claude/commands/JVibe:status.md", "x");
        write(dir.path(), ".claude/commands/notes.txt", "x");
        let snap = probe(dir.path());
        assert_eq!(snap.legacy_commands, vec!["init.md"]);
    }

    #[test]
    fn flags_deprecated_hook_syntax_and_paths() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            ".claude/hooks/sync-stats.sh",
            "done=$(grep -c '✅' docs/Feature-List.md)\n",
        );
        write(
            dir.path(),
            ".claude/hooks/load-context.sh",
            "cat docs/core/Feature-List.md\n",
        );
        write(dir.path(), ".claude/hooks/custom.sh", "cat docs/Feature-List.md\n");

        let snap = probe(dir.path());
        assert_eq!(snap.hook_files, vec!["custom.sh", "load-context.sh", "sync-stats.sh"]);
        assert_eq!(
            snap.hook_issues,
            vec![
                HookIssue {
                    hook: "sync-stats.sh".into(),
                    kind: HookIssueKind::DeprecatedSyntax
                },
                HookIssue {
                    hook: "sync-stats.sh".into(),
                    kind: HookIssueKind::DeprecatedPath
                },
            ]
        );
    }

    #[test]
    fn hook_with_latin1_byte_is_still_scanned() {
        let dir = tempdir().unwrap();
        write(dir.path(), SETTINGS_FILE, r#"{"jvibe": {"version": "1.1.0"}}"#);
        let hook = layout::rel(dir.path(), ".claude/hooks/sync-stats.sh");
        fs::create_dir_all(hook.parent().unwrap()).unwrap();
        fs::write(&hook, b"# caf\xe9\ndone=$(grep -c x docs/Feature-List.md)\n").unwrap();

        let snap = probe(dir.path());
        let kinds: Vec<_> = snap.hook_issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![HookIssueKind::DeprecatedSyntax, HookIssueKind::DeprecatedPath]
        );
    }

    #[test]
    fn current_hooks_are_clean() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            ".claude/hooks/sync-stats.sh",
            "count_status() { awk '/✅/{n++} END{print n+0}' \"$1\"; }\n# grep -c kept for reference\ncount_status docs/core/Feature-List.md\n",
        );
        let snap = probe(dir.path());
        assert!(snap.hook_issues.is_empty());
    }
}
