//! Thin wrappers around the system `git` command.
//!
//! Using the `git` binary instead of a library means the user's existing
//! setup is honored: SSH keys, credential helpers, personal access tokens and
//! anything else configured in `~/.gitconfig`. No timeout is applied, a slow
//! transport blocks until `git` itself gives up.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use crate::error::{Error, Result};

/// Clone `url` into `target_dir` with its full history.
///
/// The parent of `target_dir` is created if needed. `target_dir` itself must
/// not exist yet.
pub fn clone(url: &str, target_dir: &Path) -> Result<()> {
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .args(["clone", "--quiet", url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            message: e.to_string(),
            hint: Some("Make sure `git` is installed and on your PATH".to_string()),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let hint = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            Some(
                "Make sure you have access to the repository. For private repos, ensure you have \
                 an SSH key added to ssh-agent, git credentials or a personal access token set up"
                    .to_string(),
            )
        } else {
            None
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            message: stderr.trim().to_string(),
            hint,
        });
    }

    Ok(())
}

/// URL of the `origin` remote of the checkout at `repo_dir`.
///
/// Returns `None` when `repo_dir` is not a git checkout or has no `origin`.
pub fn remote_url(repo_dir: &Path) -> Result<Option<String>> {
    // Avoid picking up an enclosing repository
    if !repo_dir.join(".git").exists() {
        return Ok(None);
    }

    let output = git_output(repo_dir, &["remote", "get-url", "origin"]).map_err(|e| {
        Error::GitCommand {
            command: "remote get-url origin".to_string(),
            url: repo_dir_str(repo_dir).to_string(),
            stderr: e.to_string(),
        }
    })?;

    if !output.status.success() {
        return Ok(None);
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!url.is_empty()).then_some(url))
}

/// Fetch branches and tags from `origin`.
pub fn fetch(repo_dir: &Path, url: &str) -> Result<()> {
    run("fetch", url, &["fetch", "--quiet", "--tags", "--force", "origin"], repo_dir)?;
    Ok(())
}

/// Check out `revision` (tag, branch or commit) in detached state.
///
/// A branch is taken from `origin`, so a branch that was never checked out
/// locally can be pinned as well.
pub fn checkout(repo_dir: &Path, url: &str, revision: &str) -> Result<()> {
    let target = resolve(repo_dir, revision)?
        .map(|(revspec, _)| revspec)
        .unwrap_or_else(|| revision.to_string());

    let output = git_output(repo_dir, &["checkout", "--quiet", "--detach", &target]).map_err(
        |e| Error::GitCheckout {
            revision: revision.to_string(),
            url: url.to_string(),
            message: e.to_string(),
        },
    )?;

    if !output.status.success() {
        return Err(Error::GitCheckout {
            revision: revision.to_string(),
            url: url.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Move the checkout onto the tip of the remote default branch.
///
/// The default branch is read from `origin/HEAD`. The local branch of the same
/// name is checked out (and created when missing) and fast-forwarded, so a
/// previously pinned, detached checkout returns to tracking the branch.
pub fn fast_forward(repo_dir: &Path, url: &str) -> Result<()> {
    let head = run(
        "symbolic-ref",
        url,
        &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
        repo_dir,
    )?;
    let remote_branch = head.trim();
    let branch = remote_branch
        .strip_prefix("origin/")
        .unwrap_or(remote_branch);

    let local_ref = format!("refs/heads/{}", branch);
    if git_output(repo_dir, &["show-ref", "--verify", "--quiet", &local_ref])?
        .status
        .success()
    {
        run("checkout", url, &["checkout", "--quiet", branch], repo_dir)?;
    } else {
        run(
            "checkout",
            url,
            &["checkout", "--quiet", "-b", branch, "--track", remote_branch],
            repo_dir,
        )?;
    }
    run(
        "merge --ff-only",
        url,
        &["merge", "--quiet", "--ff-only", remote_branch],
        repo_dir,
    )?;
    Ok(())
}

/// Resolve `revision` to a commit id, `None` when it is unknown locally.
///
/// Tags win over remote branches of the same name, remote branches over
/// anything else `git rev-parse` understands (local branches, hashes).
pub fn rev_parse(repo_dir: &Path, revision: &str) -> Result<Option<String>> {
    Ok(resolve(repo_dir, revision)?.map(|(_, commit)| commit))
}

/// The first revspec naming `revision` that exists, with its commit id.
fn resolve(repo_dir: &Path, revision: &str) -> Result<Option<(String, String)>> {
    let candidates = if revision == "HEAD" {
        vec![revision.to_string()]
    } else {
        vec![
            format!("refs/tags/{}", revision),
            format!("refs/remotes/origin/{}", revision),
            revision.to_string(),
        ]
    };

    for candidate in candidates {
        if let Some(commit) = commit_of(repo_dir, &candidate)? {
            return Ok(Some((candidate, commit)));
        }
    }
    Ok(None)
}

fn commit_of(repo_dir: &Path, revspec: &str) -> Result<Option<String>> {
    let peeled = format!("{}^{{commit}}", revspec);
    let output = git_output(repo_dir, &["rev-parse", "--verify", "--quiet", &peeled])?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
}

fn git_output(repo_dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new("git").arg("-C").arg(repo_dir).args(args).output()
}

/// Run a git command in `repo_dir`, returning its stdout.
fn run(command: &str, url: &str, args: &[&str], repo_dir: &Path) -> Result<String> {
    let output = git_output(repo_dir, args).map_err(|e| Error::GitCommand {
        command: command.to_string(),
        url: url.to_string(),
        stderr: e.to_string(),
    })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command: command.to_string(),
            url: url.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn repo_dir_str(repo_dir: &Path) -> &str {
    repo_dir.to_str().unwrap_or("<non-utf8 path>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remote_url_of_plain_directory_is_none() {
        let temp_dir = TempDir::new().unwrap();
        // Either git is missing (error) or the directory is not a repository (None)
        if let Ok(url) = remote_url(temp_dir.path()) {
            assert_eq!(url, None);
        }
    }

    #[test]
    fn test_rev_parse_outside_repository_is_none() {
        let temp_dir = TempDir::new().unwrap();
        if let Ok(commit) = rev_parse(temp_dir.path(), "HEAD") {
            assert_eq!(commit, None);
        }
    }

    #[test]
    fn test_clone_invalid_source_fails_with_url() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("does-not-exist");
        let url = source.to_string_lossy().to_string();

        let err = clone(&url, &temp_dir.path().join("target")).unwrap_err();
        match err {
            Error::GitClone { url: failed, .. } => assert_eq!(failed, url),
            other => panic!("unexpected error: {}", other),
        }
    }

    // Cloning, checkout and fast-forward against real repositories are
    // covered by the integration tests in `tests/fetch_test.rs`.
}
