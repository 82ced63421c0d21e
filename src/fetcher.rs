//! # Repository Fetcher
//!
//! This module provides the `RepositoryFetcher`, which materializes a
//! `Repository` descriptor as a checkout on local storage and returns the
//! corresponding `ResolvedRepository`.
//!
//! ## Design
//!
//! Version control is consumed through the `GitOperations` trait, so the
//! decision logic (clone, update, re-clone or leave alone) is independent of
//! how git is driven and can be tested with a mock. `DefaultGitOperations`
//! wraps the system `git` command (see [`crate::git`]).
//!
//! ## Decisions
//!
//! For a target directory and a descriptor:
//!
//! - **Missing target**: clone, check out the pin if any.
//! - **Same remote URL, no pin**: fetch and fast-forward the default branch.
//! - **Same remote URL, pinned**: nothing to do when `HEAD` already is the
//!   pinned commit, otherwise fetch and check out the pin.
//! - **Different remote URL**: warn and replace the checkout with a fresh
//!   clone.
//! - **Not a checkout**: fail with `Error::NotACheckout` and leave the
//!   directory alone, it may hold the project's own files.
//!
//! New clones are made in a scratch directory next to the target and only
//! moved into place once checked out, so a failed clone never leaves a
//! half-written target behind.

use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::path::{relative_to_cwd, remove_checkout};
use crate::repository::{Repository, ResolvedRepository};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Clones `url` into `target_dir`, which does not exist yet.
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// URL of the `origin` remote, `None` if `repo_dir` is not a checkout.
    fn remote_url(&self, repo_dir: &Path) -> Result<Option<String>>;

    /// Fetches branches and tags from `origin`.
    fn fetch(&self, repo_dir: &Path, url: &str) -> Result<()>;

    /// Checks out a tag, branch or commit.
    fn checkout(&self, repo_dir: &Path, url: &str, revision: &str) -> Result<()>;

    /// Moves the checkout to the tip of the remote default branch.
    fn fast_forward(&self, repo_dir: &Path, url: &str) -> Result<()>;

    /// Resolves a revision to a commit id, `None` when unknown locally.
    fn rev_parse(&self, repo_dir: &Path, revision: &str) -> Result<Option<String>>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_repo(&self, url: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone(url, target_dir)
    }

    fn remote_url(&self, repo_dir: &Path) -> Result<Option<String>> {
        crate::git::remote_url(repo_dir)
    }

    fn fetch(&self, repo_dir: &Path, url: &str) -> Result<()> {
        crate::git::fetch(repo_dir, url)
    }

    fn checkout(&self, repo_dir: &Path, url: &str, revision: &str) -> Result<()> {
        crate::git::checkout(repo_dir, url, revision)
    }

    fn fast_forward(&self, repo_dir: &Path, url: &str) -> Result<()> {
        crate::git::fast_forward(repo_dir, url)
    }

    fn rev_parse(&self, repo_dir: &Path, revision: &str) -> Result<Option<String>> {
        crate::git::rev_parse(repo_dir, revision)
    }
}

/// Brings local checkouts in line with repository descriptors.
pub struct RepositoryFetcher {
    git_ops: Box<dyn GitOperations>,
}

impl Default for RepositoryFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryFetcher {
    /// Creates a fetcher driving the system `git` command.
    pub fn new() -> Self {
        Self {
            git_ops: Box::new(DefaultGitOperations),
        }
    }

    /// Creates a fetcher with a custom `GitOperations` implementation.
    pub fn with_operations(git_ops: Box<dyn GitOperations>) -> Self {
        Self { git_ops }
    }

    /// Ensures `target_path` holds a checkout matching `repository`.
    ///
    /// Returns the resolved repository, whose `local_path` is `target_path`.
    pub fn fetch(
        &self,
        name: &str,
        repository: &Repository,
        target_path: &Path,
    ) -> Result<ResolvedRepository> {
        let url = repository.url();

        if !target_path.exists() {
            info!(
                "Cloning '{}' from {} into {}",
                name,
                url,
                relative_to_cwd(target_path).display()
            );
            self.clone_into(repository, target_path)?;
        } else {
            match self.git_ops.remote_url(target_path)? {
                Some(existing) if existing == url => self.update(name, repository, target_path)?,
                Some(existing) => {
                    warn!(
                        "Repository URL changed for '{}' from {} to {}, re-cloning into {}",
                        name,
                        existing,
                        url,
                        relative_to_cwd(target_path).display()
                    );
                    self.clone_into(repository, target_path)?;
                }
                None => {
                    return Err(Error::NotACheckout {
                        name: name.to_string(),
                        path: relative_to_cwd(target_path),
                    });
                }
            }
        }

        Ok(ResolvedRepository::new(
            name,
            repository.clone(),
            target_path.to_path_buf(),
        ))
    }

    /// Updates an existing checkout whose remote already matches.
    fn update(&self, name: &str, repository: &Repository, target_path: &Path) -> Result<()> {
        let url = repository.url();

        let Some(pin) = repository.pin() else {
            debug!("Updating '{}' to the latest commit of {}", name, url);
            self.git_ops.fetch(target_path, url)?;
            return self.git_ops.fast_forward(target_path, url);
        };

        if self.is_at_revision(target_path, pin.revision())? {
            debug!("'{}' is already checked out at {}", name, pin);
            return Ok(());
        }

        info!("Checking out {} of '{}'", pin, name);
        self.git_ops.fetch(target_path, url)?;
        self.git_ops.checkout(target_path, url, pin.revision())
    }

    fn is_at_revision(&self, repo_dir: &Path, revision: &str) -> Result<bool> {
        let head = self.git_ops.rev_parse(repo_dir, "HEAD")?;
        let pinned = self.git_ops.rev_parse(repo_dir, revision)?;
        Ok(matches!((head, pinned), (Some(head), Some(pinned)) if head == pinned))
    }

    /// Clones into a scratch directory, then swaps it in for `target_path`.
    fn clone_into(&self, repository: &Repository, target_path: &Path) -> Result<()> {
        let parent = match target_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let scratch = tempfile::Builder::new()
            .prefix(".nomenclature-clone-")
            .tempdir_in(parent)?;
        let staged = scratch.path().join("checkout");

        self.git_ops.clone_repo(repository.url(), &staged)?;
        if let Some(revision) = repository.revision() {
            self.git_ops
                .checkout(&staged, repository.url(), revision)?;
        }

        if target_path.exists() {
            remove_checkout(target_path)?;
        }
        fs::rename(&staged, target_path)?;
        Ok(())
    }
}
