//! # Error Handling
//!
//! This module defines the centralized error type for resolving a
//! nomenclature configuration. It uses the `thiserror` library to build a
//! single `Error` enum whose variants carry enough context (section,
//! repository name, URL, revision) to diagnose a failure without inspecting
//! internals.
//!
//! The variants fall into four groups:
//!
//! - **Schema errors**: invalid dimension values, conflicting pins, a
//!   user-supplied `local_path`, duplicate repository names, invalid time
//!   domain or `nuts` settings. Raised while the configuration is built.
//! - **Resolution errors**: a section references repositories that are not
//!   declared. Every unresolved name of the section is reported at once.
//! - **Nesting errors**: a fetched repository declares external repositories
//!   itself.
//! - **Transport errors**: clone, fetch or checkout failures of the `git`
//!   client.
//!
//! None of them are retried internally. The `Result` alias is used throughout
//! the crate.

use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for nomenclature repository resolution
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration document could not be interpreted.
    ///
    /// Includes an optional hint about how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A value outside the fixed dimension set was used.
    #[error("Invalid dimension '{value}': Input should be 'model', 'scenario', 'variable', 'region' or 'subannual'")]
    InvalidDimension { value: String },

    /// A repository declares both a `hash` and a `release`.
    #[error("Invalid repository '{name}': `hash` or `release` can be provided, not both")]
    ConflictingPins { name: String },

    /// A repository declares a `local_path`, which is reserved for the fetcher.
    #[error("Invalid repository '{name}': `local_path` must not be set, it is populated after fetching")]
    LocalPathSet { name: String },

    /// A repository name that cannot serve as a single directory name.
    #[error("Invalid repository name '{name}': must be a single directory name, not empty, '.' or '..', and without '/' or '\\'")]
    InvalidRepositoryName { name: String },

    /// The same repository name is declared more than once.
    #[error("Repository '{name}' is defined more than once")]
    DuplicateRepository { name: String },

    /// The `time_domain` section is inconsistent.
    #[error("Invalid time domain: {message}")]
    TimeDomain { message: String },

    /// A section references repositories missing from `repositories`.
    #[error("Unknown repository {{{}}} in '{section}'", names.iter().map(|n| format!("'{}'", n)).collect::<Vec<_>>().join(", "))]
    UnknownRepository {
        section: String,
        names: BTreeSet<String>,
    },

    /// An external repository declares external repositories of its own.
    #[error("External repos cannot again refer to external repos: '{name}' declares `repositories` in {}", config.display())]
    DoubleStacking { name: String, config: PathBuf },

    /// The target directory of a repository exists but is not a git checkout.
    ///
    /// It is never removed, it may hold the project's own files.
    #[error("Cannot fetch '{name}' into {}: the directory exists and is not a git checkout", path.display())]
    NotACheckout { name: String, path: PathBuf },

    /// The configuration was already resolved against local checkouts.
    #[error("Repositories have already been fetched for this configuration")]
    AlreadyResolved,

    /// Resolved views were requested before the repositories were fetched.
    #[error("Repositories have not been fetched for this configuration")]
    NotResolved,

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    GitClone {
        url: String,
        message: String,
        /// Optional hint for how to resolve the clone issue
        hint: Option<String>,
    },

    /// A pinned revision could not be checked out.
    #[error("Git checkout error: revision '{revision}' not found in {url}: {message}")]
    GitCheckout {
        revision: String,
        url: String,
        message: String,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
