//! # Repository Descriptors
//!
//! A `Repository` identifies one external source of nomenclature definitions:
//! the URL to clone from and, optionally, a pin fixing it to an immutable
//! state. A repository without a pin tracks the remote default branch and is
//! brought up to date on every resolution.
//!
//! Descriptors are parsed from the `repositories` section of a configuration
//! as a `RawRepository` and validated into a `Repository` by
//! [`Repository::from_raw`]. The validated form cannot hold both a `hash` and
//! a `release`, and it never carries a local path: the location of the
//! checkout only exists on the `ResolvedRepository` returned by the fetcher.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::defaults::{CONFIG_FILE_NAME, DEFINITIONS_DIR, MAPPINGS_DIR};
use crate::dimension::Dimension;
use crate::error::{Error, Result};
use crate::path::relative_to_cwd;

/// A repository entry as written in the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRepository {
    /// The URL of the Git repository.
    pub url: String,
    /// A commit to check out.
    #[serde(default)]
    pub hash: Option<String>,
    /// A tag or branch to check out.
    #[serde(default)]
    pub release: Option<String>,
    /// Reserved for the fetcher, rejected when present.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
}

/// Fixes a repository to a specific state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pin {
    /// A commit hash.
    Hash(String),
    /// A release tag (or branch name).
    Release(String),
}

impl Pin {
    /// The revision passed to `git checkout`.
    pub fn revision(&self) -> &str {
        match self {
            Pin::Hash(hash) => hash,
            Pin::Release(release) => release,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Hash(hash) => write!(f, "hash {}", hash),
            Pin::Release(release) => write!(f, "release {}", release),
        }
    }
}

/// A validated external repository descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    url: String,
    pin: Option<Pin>,
}

impl Repository {
    /// A repository tracking the default branch of `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pin: None,
        }
    }

    /// A repository fixed to `pin`.
    pub fn pinned(url: impl Into<String>, pin: Pin) -> Self {
        Self {
            url: url.into(),
            pin: Some(pin),
        }
    }

    /// Validate a configuration entry named `name`.
    ///
    /// Fails when `name` is not usable as a directory name, when the entry
    /// sets `local_path`, or sets both `hash` and `release`. Empty strings
    /// count as unset.
    pub fn from_raw(name: &str, raw: RawRepository) -> Result<Self> {
        if !is_valid_name(name) {
            return Err(Error::InvalidRepositoryName {
                name: name.to_string(),
            });
        }
        if raw.local_path.is_some() {
            return Err(Error::LocalPathSet {
                name: name.to_string(),
            });
        }

        let hash = raw.hash.filter(|h| !h.trim().is_empty());
        let release = raw.release.filter(|r| !r.trim().is_empty());
        let pin = match (hash, release) {
            (Some(_), Some(_)) => {
                return Err(Error::ConflictingPins {
                    name: name.to_string(),
                })
            }
            (Some(hash), None) => Some(Pin::Hash(hash)),
            (None, Some(release)) => Some(Pin::Release(release)),
            (None, None) => None,
        };

        Ok(Self { url: raw.url, pin })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn pin(&self) -> Option<&Pin> {
        self.pin.as_ref()
    }

    pub fn hash(&self) -> Option<&str> {
        match &self.pin {
            Some(Pin::Hash(hash)) => Some(hash),
            _ => None,
        }
    }

    pub fn release(&self) -> Option<&str> {
        match &self.pin {
            Some(Pin::Release(release)) => Some(release),
            _ => None,
        }
    }

    /// The pinned revision, `None` when tracking the default branch.
    pub fn revision(&self) -> Option<&str> {
        self.pin.as_ref().map(Pin::revision)
    }

    /// True iff neither `hash` nor `release` is set.
    ///
    /// Such repositories follow the remote default branch and are checked for
    /// upstream changes on every resolution.
    pub fn has_auto_update(&self) -> bool {
        self.pin.is_none()
    }
}

/// A repository materialized on local storage by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepository {
    name: String,
    repository: Repository,
    local_path: PathBuf,
}

impl ResolvedRepository {
    pub fn new(name: impl Into<String>, repository: Repository, local_path: PathBuf) -> Self {
        Self {
            name: name.into(),
            repository,
            local_path,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }

    /// Directory holding the code lists of `dimension` in this checkout.
    pub fn dimension_path(&self, dimension: Dimension) -> PathBuf {
        self.local_path
            .join(DEFINITIONS_DIR)
            .join(dimension.as_str())
    }

    /// Directory holding the model mappings in this checkout.
    pub fn mappings_path(&self) -> PathBuf {
        self.local_path.join(MAPPINGS_DIR)
    }

    /// Ensure the checkout does not declare external repositories itself.
    ///
    /// External repositories are resolved one level deep only. A checkout
    /// whose own `nomenclature.yaml` has a non-empty `repositories` section is
    /// rejected before any of its content is used.
    pub fn check_external_repo_double_stacking(&self) -> Result<()> {
        let config_file = self.local_path.join(CONFIG_FILE_NAME);
        if !config_file.is_file() {
            return Ok(());
        }

        let content = fs::read_to_string(&config_file)?;
        let config: serde_yaml::Value = serde_yaml::from_str(&content)?;
        let declares_repositories = config
            .get("repositories")
            .map(is_truthy)
            .unwrap_or(false);

        if declares_repositories {
            return Err(Error::DoubleStacking {
                name: self.name.clone(),
                config: relative_to_cwd(&config_file),
            });
        }

        debug!(
            "'{}' declares no external repositories of its own",
            self.name
        );
        Ok(())
    }
}

fn is_truthy(value: &serde_yaml::Value) -> bool {
    use serde_yaml::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Sequence(seq) => !seq.is_empty(),
        Value::Mapping(map) => !map.is_empty(),
        Value::Number(_) | Value::Tagged(_) => true,
    }
}

/// The checkout lands in `<target_folder>/<name>`, so a name must stay a
/// single path segment.
fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
