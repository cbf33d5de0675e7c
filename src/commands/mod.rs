pub mod status;
pub mod uninstall;
pub mod upgrade;
pub mod validate;
pub mod work_order;

use std::path::Path;

use crate::error::{JvibeError, Result};
use crate::layout::{self, CLAUDE_DIR, DOCS_DIR};

/// Fails unless `project_dir` carries at least one managed directory.
pub(crate) fn ensure_initialized(project_dir: &Path) -> Result<()> {
    if layout::rel(project_dir, CLAUDE_DIR).is_dir() || layout::rel(project_dir, DOCS_DIR).is_dir()
    {
        Ok(())
    } else {
        Err(JvibeError::NotInitialized)
    }
}
