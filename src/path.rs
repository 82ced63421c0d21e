//! Path utilities for nomenclature checkouts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Match a name against a glob pattern
pub fn glob_match(pattern: &str, name: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    Ok(pattern.matches(name))
}

/// Returns `path` relative to the current directory when it lies below it.
///
/// Relative paths and paths outside the current directory are returned
/// unchanged. Used to keep log and error messages short.
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    if !path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Remove a checkout directory (or a stray file) at `path`.
///
/// Git marks pack files read-only, which makes a plain recursive removal fail
/// on some platforms. When the first attempt is denied, write permission is
/// restored on every entry and the removal is retried once.
pub fn remove_checkout(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return match fs::remove_file(path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        };
    }

    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            make_writable(path)?;
            fs::remove_dir_all(path)?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[allow(clippy::permissions_set_readonly_false)]
fn make_writable(path: &Path) -> Result<()> {
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(io::Error::from)?;
        let mut permissions = entry.metadata().map_err(io::Error::from)?.permissions();
        if permissions.readonly() {
            permissions.set_readonly(false);
            fs::set_permissions(entry.path(), permissions)?;
        }
    }
    Ok(())
}
