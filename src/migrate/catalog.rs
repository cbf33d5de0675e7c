//! Versioned table of document schema changes.
//!
//! The catalog is plain data: [`Catalog::builtin`] is the table shipped with this
//! tool, and callers may construct their own (tests use small synthetic ones).

use serde::{Deserialize, Serialize};

/// One added, modified, removed or renamed field or section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_format: Option<String>,
}

impl SchemaChange {
    pub fn new(file: &str, description: &str) -> Self {
        Self {
            file: file.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    pub fn field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }

    pub fn section(mut self, section: &str) -> Self {
        self.section = Some(section.to_string());
        self
    }

    pub fn format(mut self, format: &str, example: &str) -> Self {
        self.format = Some(format.to_string());
        self.example = Some(example.to_string());
        self
    }

    pub fn reformat(mut self, old: &str, new: &str) -> Self {
        self.old_format = Some(old.to_string());
        self.new_format = Some(new.to_string());
        self
    }

    /// Field name, else section heading.
    pub fn label(&self) -> Option<&str> {
        self.field.as_deref().or(self.section.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub added: Vec<SchemaChange>,
    pub modified: Vec<SchemaChange>,
    pub removed: Vec<SchemaChange>,
    pub renamed: Vec<SchemaChange>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.modified.is_empty()
            && self.removed.is_empty()
            && self.renamed.is_empty()
    }
}

/// One historical schema revision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub version: String,
    pub description: String,
    pub changes: ChangeSet,
    /// Artifacts that cannot be migrated mechanically for this revision.
    pub ai_migration_required: Vec<String>,
}

impl CatalogEntry {
    pub fn new(version: &str, description: &str) -> Self {
        Self {
            version: version.to_string(),
            description: description.to_string(),
            ..Self::default()
        }
    }

    pub fn added(mut self, change: SchemaChange) -> Self {
        self.changes.added.push(change);
        self
    }

    pub fn modified(mut self, change: SchemaChange) -> Self {
        self.changes.modified.push(change);
        self
    }

    pub fn removed(mut self, change: SchemaChange) -> Self {
        self.changes.removed.push(change);
        self
    }

    pub fn renamed(mut self, change: SchemaChange) -> Self {
        self.changes.renamed.push(change);
        self
    }

    pub fn requires_ai(mut self, files: &[&str]) -> Self {
        self.ai_migration_required
            .extend(files.iter().map(|f| f.to_string()));
        self
    }
}

/// Aggregate of every catalog entry a project still has to go through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AiMigrationCheck {
    pub required: bool,
    /// Union of AI-migration files, first-seen order.
    pub files: Vec<String>,
    /// Concatenation of every entry's changes; the same file may appear repeatedly.
    pub changes: ChangeSet,
    pub migrations: Vec<String>,
}

/// Entries ordered by ascending version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Entries must already be in ascending version order.
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Entries strictly newer than `from_version`. An unknown version gets every entry.
    pub fn entries_after(&self, from_version: &str) -> &[CatalogEntry] {
        match self.entries.iter().position(|e| e.version == from_version) {
            Some(idx) => &self.entries[idx + 1..],
            None => &self.entries,
        }
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.entries.last().map(|e| e.version.as_str())
    }

    pub fn check_ai_migration_required(&self, from_version: &str) -> AiMigrationCheck {
        let mut check = AiMigrationCheck::default();
        for entry in self.entries_after(from_version) {
            for file in &entry.ai_migration_required {
                if !check.files.contains(file) {
                    check.files.push(file.clone());
                }
            }
            let changes = &entry.changes;
            check.changes.added.extend(changes.added.iter().cloned());
            check.changes.modified.extend(changes.modified.iter().cloned());
            check.changes.removed.extend(changes.removed.iter().cloned());
            check.changes.renamed.extend(changes.renamed.iter().cloned());
            check.migrations.push(entry.version.clone());
        }
        check.required = !check.files.is_empty();
        check
    }

    /// The table shipped with this version of the tool.
    pub fn builtin() -> Self {
        const FEATURE_LIST: &str = "docs/core/Feature-List.md";
        const PROJECT: &str = "docs/core/Project.md";

        Self::new(vec![
            CatalogEntry::new("1.0.0", "Initial release"),
            CatalogEntry::new("1.0.3", "Hook script fixes").modified(SchemaChange::new(
                ".claude/hooks/sync-stats.sh",
                "Status counting switched from `grep -c` to an awk helper to fix arithmetic errors",
            )),
            CatalogEntry::new("1.0.7", "English core document names and reference updates")
                .renamed(
                    SchemaChange::new(
                        "docs/core/Standards.md",
                        "Core documents renamed to English (Standards/Project/Feature-List/Appendix); in-document references must follow",
                    )
                    .field("core-docs-rename"),
                )
                .requires_ai(&[
                    "docs/core/Standards.md",
                    PROJECT,
                    FEATURE_LIST,
                    "docs/core/Appendix.md",
                ]),
            CatalogEntry::new("1.1.0", "Richer document formats")
                .added(
                    SchemaChange::new(FEATURE_LIST, "Feature entries gain a priority (P0/P1/P2/P3)")
                        .field("Priority")
                        .format("**Priority**: P0 | P1 | P2 | P3", "**Priority**: P1"),
                )
                .added(
                    SchemaChange::new(FEATURE_LIST, "Feature entries gain an effort estimate")
                        .field("Estimate")
                        .format("**Estimate**: Xh | Xd", "**Estimate**: 4h"),
                )
                .added(
                    SchemaChange::new(FEATURE_LIST, "Feature entries gain a related module")
                        .field("Module")
                        .format("**Module**: ModuleName", "**Module**: AuthModule"),
                )
                .added(
                    SchemaChange::new(
                        PROJECT,
                        "New environment section documenting variables and configuration",
                    )
                    .field("Environment")
                    .section("## 7. Environment"),
                )
                .modified(
                    SchemaChange::new(FEATURE_LIST, "Feature entries carry more metadata")
                        .field("feature-entry-format")
                        .reformat(
                            "## F-XXX [status] Name\n\n**Description**: ...\n\n**TODO**\n- [ ] ...",
                            "## F-XXX [status] Name\n\n**Description**: ...\n**Priority**: P1\n**Estimate**: 4h\n**Module**: ModuleName\n\n**TODO**\n- [ ] ...",
                        ),
                )
                .requires_ai(&[FEATURE_LIST, PROJECT]),
        ])
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
