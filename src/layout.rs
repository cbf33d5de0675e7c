//! Fixed locations of every artifact family jvibe manages inside a project.
//!
//! All relative paths use `/` separators; [`rel`] joins them onto a project root.

use std::path::{Path, PathBuf};

pub const CLAUDE_DIR: &str = ".claude";
pub const SETTINGS_FILE: &str = ".claude/settings.json";
pub const AGENTS_DIR: &str = ".claude/agents";
pub const COMMANDS_DIR: &str = ".claude/commands";
pub const HOOKS_DIR: &str = ".claude/hooks";

pub const DOCS_DIR: &str = "docs";
pub const CORE_DIR: &str = "docs/core";
pub const PROJECT_DOCS_DIR: &str = "docs/project";
pub const STATE_FILE: &str = "docs/.jvibe-state.json";
pub const HANDOFF_DIR: &str = "docs/.jvibe";
pub const HANDOFF_FILE: &str = "docs/.jvibe/tasks.yaml";
pub const WORK_ORDER_FILE: &str = "docs/.jvibe/migration-work-order.md";

/// Key inside the settings document that jvibe owns.
pub const SETTINGS_NAMESPACE: &str = "jvibe";

/// Every command file must start with this prefix.
pub const COMMAND_PREFIX: &str = "JVibe:";

pub const AGENT_FILES: [&str; 4] = ["planner.md", "developer.md", "reviewer.md", "doc-sync.md"];
pub const REQUIRED_COMMANDS: [&str; 3] = ["JVibe:init.md", "JVibe:pr.md", "JVibe:status.md"];
pub const REQUIRED_HOOKS: [&str; 4] = [
    "load-context.sh",
    "sync-feature-status.sh",
    "guard-output.sh",
    "sync-stats.sh",
];
/// Hook scripts whose content is scanned for deprecated syntax and paths.
pub const SCANNED_HOOKS: [&str; 3] = ["load-context.sh", "sync-feature-status.sh", "sync-stats.sh"];

pub const BACKUP_PREFIX: &str = ".jvibe-backup-";
pub const UNINSTALL_BACKUP_PREFIX: &str = ".jvibe-uninstall-backup-";

/// One of the four core documents, with its current and localized legacy names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreDoc {
    pub name: &'static str,
    pub legacy_name: &'static str,
}

pub const CORE_DOCS: [CoreDoc; 4] = [
    CoreDoc {
        name: "Standards.md",
        legacy_name: "规范文档.md",
    },
    CoreDoc {
        name: "Project.md",
        legacy_name: "项目文档.md",
    },
    CoreDoc {
        name: "Feature-List.md",
        legacy_name: "功能清单.md",
    },
    CoreDoc {
        name: "Appendix.md",
        legacy_name: "附加材料.md",
    },
];

pub const FEATURE_LIST: CoreDoc = CORE_DOCS[2];

impl CoreDoc {
    /// `docs/core/<name>`.
    pub fn canonical_path(&self) -> String {
        format!("{CORE_DIR}/{}", self.name)
    }

    /// Project-relative paths where this document may live, canonical first.
    pub fn candidates(&self) -> [String; 4] {
        [
            self.canonical_path(),
            format!("{DOCS_DIR}/{}", self.name),
            format!("{CORE_DIR}/{}", self.legacy_name),
            format!("{DOCS_DIR}/{}", self.legacy_name),
        ]
    }

    /// Historically valid locations, in the order they take precedence for a move.
    pub fn legacy_candidates(&self) -> Vec<String> {
        self.candidates().into_iter().skip(1).collect()
    }
}

/// Join a `/`-separated project-relative path onto `root`.
pub fn rel(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Render `path` relative to `root` with `/` separators, falling back to the full path.
pub fn display_rel(root: &Path, path: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    shown
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
