use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Presence flags for each managed directory and file family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub has_claude_dir: bool,
    pub has_settings_json: bool,
    pub has_agents: bool,
    pub has_commands: bool,
    pub has_hooks: bool,
    pub has_docs_dir: bool,
    pub has_docs_core_dir: bool,
    pub has_docs_project_dir: bool,
    pub has_legacy_docs: bool,
    pub has_state_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyDocKind {
    /// A core document directly under `docs/` instead of `docs/core/`.
    FlatLocation,
    /// A localized legacy filename under `docs/core/`.
    LocalizedName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDoc {
    pub path: String,
    pub kind: LegacyDocKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookIssueKind {
    DeprecatedSyntax,
    DeprecatedPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookIssue {
    pub hook: String,
    pub kind: HookIssueKind,
}

impl HookIssue {
    pub fn describe(&self) -> String {
        match self.kind {
            HookIssueKind::DeprecatedSyntax => format!(
                "{} uses the deprecated `grep -c` counting syntax",
                self.hook
            ),
            HookIssueKind::DeprecatedPath => {
                format!("{} references a deprecated document path", self.hook)
            }
        }
    }
}

/// Where one core document was found, in candidate order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocPresence {
    pub name: String,
    pub found_at: Vec<String>,
}

/// Read-only facts about one project directory, gathered fresh per invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub root: PathBuf,
    pub version: Option<String>,
    pub settings_malformed: bool,
    pub structure: Structure,
    /// Human-readable reasons gathered while probing.
    pub indicators: Vec<String>,
    pub legacy_docs: Vec<LegacyDoc>,
    /// Command files lacking the required prefix.
    pub legacy_commands: Vec<String>,
    pub hook_issues: Vec<HookIssue>,
    /// Every `*.sh` file in the hooks directory, sorted.
    pub hook_files: Vec<String>,
    pub documents: Vec<DocPresence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    MissingFields,
    MissingSections,
    Rebuild,
    NewField,
    ModifiedField,
    Renamed,
    LegacyDocRefs,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields => write!(f, "missing_fields"),
            Self::MissingSections => write!(f, "missing_sections"),
            Self::Rebuild => write!(f, "rebuild"),
            Self::NewField => write!(f, "new_field"),
            Self::ModifiedField => write!(f, "modified_field"),
            Self::Renamed => write!(f, "renamed"),
            Self::LegacyDocRefs => write!(f, "legacy_doc_refs"),
        }
    }
}

/// One normalized unit of drift, shared by catalog- and template-driven detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub file: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Missing field or section names, for the kinds that carry them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

impl ChangeDescriptor {
    pub fn new(kind: ChangeKind, file: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            description: description.into(),
            field: None,
            items: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: Option<String>) -> Self {
        self.field = field;
        self
    }

    pub fn with_items(mut self, items: Vec<String>) -> Self {
        self.items = items;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMigration {
    pub required: bool,
    pub files: Vec<String>,
    pub missing_fields: Vec<String>,
    pub changes: Vec<ChangeDescriptor>,
}

impl ContentMigration {
    /// Add `file` unless already present, keeping first-seen order.
    pub fn add_file(&mut self, file: impl Into<String>) {
        let file = file.into();
        if !self.files.contains(&file) {
            self.files.push(file);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: Option<String>,
    pub is_legacy: bool,
    pub legacy_indicators: Vec<String>,
    pub structure: Structure,
    pub content_migration: ContentMigration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMove {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRename {
    pub from: String,
    pub to: String,
}

/// Fully resolved mechanical sub-plans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetails {
    pub docs_to_move: Vec<DocMove>,
    pub hooks_to_update: Vec<String>,
    pub commands_to_rename: Vec<CommandRename>,
    pub agents_to_update: Vec<String>,
    pub config_to_update: bool,
    pub content_changes: Vec<ChangeDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub needs_migration: bool,
    pub needs_ai_migration: bool,
    pub tasks: Vec<String>,
    pub ai_tasks: Vec<String>,
    pub details: PlanDetails,
}

impl MigrationPlan {
    pub fn is_noop(&self) -> bool {
        !self.needs_migration && !self.needs_ai_migration
    }

    pub fn has_mechanical_work(&self) -> bool {
        let d = &self.details;
        !d.docs_to_move.is_empty()
            || !d.hooks_to_update.is_empty()
            || !d.commands_to_rename.is_empty()
            || !d.agents_to_update.is_empty()
            || d.config_to_update
    }
}
