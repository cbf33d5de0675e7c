use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::error::{JvibeError, Result};

/// Read a file that may legitimately be absent. Any failure reads as `None`;
/// failures other than "not found" are logged.
///
/// Invalid UTF-8 is decoded lossily so ASCII markers in mixed-encoding files stay visible.
pub fn read_optional(path: &Path) -> Option<String> {
    match fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unreadable file treated as absent");
            None
        }
    }
}

/// Sorted names of regular files directly inside `dir` with the given extension.
/// A missing or unreadable directory yields an empty list.
pub fn list_files_with_ext(dir: &Path, ext: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .filter(|name| Path::new(name).extension().and_then(|e| e.to_str()) == Some(ext))
        .collect();
    names.sort();
    names
}

/// Every `*.md` file below `dir`, recursively, sorted.
pub fn markdown_files(dir: &Path) -> Vec<std::path::PathBuf> {
    let mut out = Vec::new();
    collect_markdown(dir, &mut out);
    out.sort();
    out
}

fn collect_markdown(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.is_dir() {
            collect_markdown(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
            out.push(path);
        }
    }
}

/// Recursively copy `src` into `dst`, overwriting files that already exist in `dst`.
/// Files present only in `dst` are left alone.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&from, &to)?;
        } else {
            fs::copy(&from, &to)?;
        }
    }
    Ok(())
}

/// Copy a file or directory tree to `dst`, creating parents.
pub fn copy_path(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir_all(src, dst)
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        Ok(())
    }
}

pub fn remove_path(path: &Path) -> Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Move `from` to `to` without ever replacing an existing `to`.
///
/// The destination is opened with create-new semantics, so a file that appears
/// there between planning and execution fails the move instead of being clobbered.
/// The source is removed only after its content has been fully copied.
pub fn move_no_clobber(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut src = File::open(from)?;
    let mut dest = match File::options().write(true).create_new(true).open(to) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(JvibeError::DestinationExists(to.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    if let Err(e) = io::copy(&mut src, &mut dest).and_then(|_| dest.sync_all()) {
        // A half-written destination would block the next run.
        drop(dest);
        let _ = fs::remove_file(to);
        return Err(e.into());
    }
    drop(src);
    fs::remove_file(from)?;
    Ok(())
}
