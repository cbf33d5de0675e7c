use std::path::{Path, PathBuf};

/// Environment fallback for `--template-dir`, read by the CLI.
pub const TEMPLATE_DIR_ENV: &str = "JVIBE_TEMPLATE_DIR";

/// Version of this tool; the version a project is migrated to.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings shared by detection, planning and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Root of the shipped template (`.claude/` and `docs/core/` inside).
    /// Default: `--template-dir`, then `$JVIBE_TEMPLATE_DIR`, then the bundled `template/`.
    pub template_dir: PathBuf,
    /// Version compared against the recorded stamp and written on migration.
    /// Default: the crate version.
    pub tool_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            template_dir: bundled_template_dir(),
            tool_version: TOOL_VERSION.to_string(),
        }
    }
}

impl EngineConfig {
    /// Use `template_override` (flag or environment) when given, else the bundled template.
    pub fn resolve(template_override: Option<&Path>) -> Self {
        let template_dir = template_override
            .map(Path::to_path_buf)
            .unwrap_or_else(bundled_template_dir);
        Self {
            template_dir,
            ..Self::default()
        }
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_tool_version(mut self, version: impl Into<String>) -> Self {
        self.tool_version = version.into();
        self
    }

    /// `template/docs/core`, the reference copies of the core documents.
    pub fn template_core_dir(&self) -> PathBuf {
        self.template_dir.join("docs").join("core")
    }
}

fn bundled_template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("template")
}

/// Options for `jvibe upgrade`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Only report the plan. Default: false.
    pub check: bool,
    /// Skip the confirmation prompt. Default: false.
    pub force: bool,
}

/// Options for `jvibe uninstall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UninstallOptions {
    /// Also remove `docs/project/`. Default: false.
    pub purge_project_docs: bool,
    /// Copy removed targets into a timestamped backup first. Default: true.
    pub backup: bool,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            purge_project_docs: false,
            backup: true,
        }
    }
}
