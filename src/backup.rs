use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::Result;
use crate::fsutil;
use crate::layout::{self, BACKUP_PREFIX, UNINSTALL_BACKUP_PREFIX};

/// A timestamped directory under the project root, created on first use.
///
/// Project-relative paths are mirrored inside it, so restoring is a plain copy back.
#[derive(Debug)]
pub struct Backup {
    dir: PathBuf,
    created: bool,
}

impl Backup {
    pub fn new(project_dir: &Path, prefix: &str) -> Self {
        // Lexicographic order of the stamp equals chronological order.
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ");
        Self {
            dir: project_dir.join(format!("{prefix}{stamp}")),
            created: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether anything has been written into the backup yet.
    pub fn is_used(&self) -> bool {
        self.created
    }

    /// Copy `project_dir/relative` into the backup. Missing sources are skipped.
    pub fn save(&mut self, project_dir: &Path, relative: &str) -> Result<bool> {
        let src = layout::rel(project_dir, relative);
        if !src.exists() {
            return Ok(false);
        }
        if !self.created {
            fs::create_dir_all(&self.dir)?;
            self.created = true;
        }
        fsutil::copy_path(&src, &layout::rel(&self.dir, relative))?;
        tracing::info!(path = relative, backup = %self.dir.display(), "backed up");
        Ok(true)
    }
}

/// Backup directory names under `project_dir`, newest first.
pub fn find_backups(project_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(project_dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().to_str().map(String::from))
        .filter(|name| name.starts_with(BACKUP_PREFIX) || name.starts_with(UNINSTALL_BACKUP_PREFIX))
        .collect();
    // Compare stamps, not prefixes, so both backup kinds interleave by time.
    names.sort_by(|a, b| stamp_of(b).cmp(stamp_of(a)).then_with(|| b.cmp(a)));
    names
}

pub fn latest_backup(project_dir: &Path) -> Option<String> {
    find_backups(project_dir).into_iter().next()
}

fn stamp_of(name: &str) -> &str {
    name.strip_prefix(UNINSTALL_BACKUP_PREFIX)
        .or_else(|| name.strip_prefix(BACKUP_PREFIX))
        .unwrap_or(name)
}
