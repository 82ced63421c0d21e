//! Shared test utilities for integration tests.
//!
//! This module builds throwaway Git repositories on the local filesystem so
//! fetching can be exercised without network access.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let origin = GitFixture::new().with_definitions();
//!     let v1 = origin.tag("v1.0.0");
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::GitFixture;
}

/// Configuration snippets, with `{url}` standing in for a fixture URL.
#[allow(dead_code)]
pub mod configs {
    /// One repository shared by a dimension and the mapping section.
    pub const SHARED: &str = r#"
repositories:
  common-definitions:
    url: {url}
definitions:
  region:
    repositories: common-definitions
  variable:
    repositories: common-definitions
mappings:
  repositories: common-definitions
"#;

    /// One repository pinned to a release.
    pub const RELEASE: &str = r#"
repositories:
  common-definitions:
    url: {url}
    release: {release}
definitions:
  region:
    repositories: common-definitions
"#;
}

/// Run `git` in `dir` and return its trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=Nomenclature Tests",
            "-c",
            "user.email=tests@example.org",
            "-c",
            "commit.gpgsign=false",
            "-c",
            "tag.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A Git repository acting as the remote of a fetch.
pub struct GitFixture {
    temp_dir: assert_fs::TempDir,
}

impl GitFixture {
    /// Create an empty repository whose default branch is `main`.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        git(temp_dir.path(), &["init", "--quiet"]);
        git(temp_dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
        Self { temp_dir }
    }

    /// Commit a region and variable code list plus a model mapping.
    pub fn with_definitions(self) -> Self {
        self.commit(
            "definitions/region/regions.yaml",
            "- common:\n  - World\n",
            "Add regions",
        );
        self.commit(
            "definitions/variable/variables.yaml",
            "- Primary Energy:\n    unit: EJ/yr\n",
            "Add variables",
        );
        self.commit(
            "mappings/model.yaml",
            "model: MESSAGEix-GLOBIOM 2.1-M-R12\nnative_regions: []\n",
            "Add mapping",
        );
        self
    }

    /// Write `content` to `path` and commit it, returning the commit hash.
    pub fn commit(&self, path: &str, content: &str, message: &str) -> String {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write fixture file");
        git(self.path(), &["add", "--all"]);
        git(self.path(), &["commit", "--quiet", "-m", message]);
        self.head()
    }

    /// Tag the current commit, returning its hash.
    pub fn tag(&self, name: &str) -> String {
        git(self.path(), &["tag", "-a", name, "-m", name]);
        self.head()
    }

    /// Commit `content` to `path` on a new branch `name`, then switch back to
    /// `main`. Returns the branch's commit hash.
    #[allow(dead_code)]
    pub fn branch(&self, name: &str, path: &str, content: &str) -> String {
        git(self.path(), &["checkout", "--quiet", "-b", name]);
        let commit = self.commit(path, content, &format!("Work on {}", name));
        git(self.path(), &["checkout", "--quiet", "main"]);
        commit
    }

    pub fn head(&self) -> String {
        git(self.path(), &["rev-parse", "HEAD"])
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The URL to clone this repository from.
    pub fn url(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }
}

impl Default for GitFixture {
    fn default() -> Self {
        Self::new()
    }
}
