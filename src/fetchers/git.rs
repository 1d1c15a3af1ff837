//! Git materialization: a treeless clone followed by a checkout.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::git::GitCommand;
use crate::repos::{Repo, RepoKind};

/// Clones the repository into the output directory and checks out the
/// pinned ref. No retry on transient failure - the error carries the git
/// command line and both output streams.
pub struct ImmutableGitFetcher;

#[async_trait]
impl super::Fetch for ImmutableGitFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::ImmutableGit, RepoKind::Git]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let (remote, reference) = match repo {
            Repo::ImmutableGit(git) => (&git.repo, &git.r#ref),
            Repo::Git(git) => (&git.repo, &git.r#ref),
            _ => anyhow::bail!("Git fetcher invoked with a {}", repo.kind().name()),
        };

        GitCommand::clone_treeless(remote, output_dir).execute().await?;
        GitCommand::checkout(reference).current_dir(output_dir).execute().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::Fetch;
    use crate::repos::ImmutableGit;

    fn local_repo() -> (tempfile::TempDir, String, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        let run = |args: &[&str]| {
            let output = std::process::Command::new("git")
                .args(args)
                .current_dir(path)
                .env("GIT_AUTHOR_NAME", "test")
                .env("GIT_AUTHOR_EMAIL", "test@example.com")
                .env("GIT_COMMITTER_NAME", "test")
                .env("GIT_COMMITTER_EMAIL", "test@example.com")
                .output()
                .unwrap();
            assert!(
                output.status.success(),
                "git {args:?}: {}",
                String::from_utf8_lossy(&output.stderr)
            );
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };
        run(&["init", "--initial-branch=main", "."]);
        std::fs::write(path.join("data.txt"), "payload").unwrap();
        run(&["add", "."]);
        run(&["commit", "-m", "initial"]);
        let sha = run(&["rev-parse", "HEAD"]);
        let url = format!("file://{}", path.display());
        (dir, url, sha)
    }

    #[tokio::test]
    async fn clones_and_checks_out_the_pinned_sha() {
        let (_guard, url, sha) = local_repo();
        let out = tempfile::tempdir().unwrap();

        ImmutableGitFetcher
            .fetch(&ImmutableGit { repo: url, r#ref: sha }.into(), out.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(out.path().join("data.txt")).unwrap(), "payload");
        assert!(out.path().join(".git").exists());
    }

    #[tokio::test]
    async fn clone_failure_carries_the_command() {
        let out = tempfile::tempdir().unwrap();
        let err = ImmutableGitFetcher
            .fetch(
                &ImmutableGit {
                    repo: "file:///definitely/not/here-bb91".into(),
                    r#ref: "HEAD".into(),
                }
                .into(),
                out.path(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("clone"));
    }
}
