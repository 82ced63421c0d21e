//! Default values and well-known names of the nomenclature layout.
//!
//! This module centralizes the file and directory names shared by the
//! configuration loader, the fetcher and the double-stacking guard.

use std::path::{Path, PathBuf};

/// File name of a nomenclature configuration inside a project or repository.
pub const CONFIG_FILE_NAME: &str = "nomenclature.yaml";

/// Directory holding the per-dimension code lists inside a repository.
pub const DEFINITIONS_DIR: &str = "definitions";

/// Directory holding the model mappings inside a repository.
pub const MAPPINGS_DIR: &str = "mappings";

/// Returns the folder external repositories of `config_file` are fetched into.
///
/// Checkouts live next to the configuration file, one directory per
/// repository name. A bare file name resolves to the current directory.
pub fn default_target_folder(config_file: &Path) -> PathBuf {
    match config_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
