//! Ref pinning: resolve a symbolic git ref into a commit SHA with
//! `ls-remote`.

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use crate::core::error::RepofetchError;
use crate::git::GitCommand;
use crate::repos::{Answer, ImmutableGit, Repo, RepoKind};

/// git may follow redirects, so the repo it reports in errors is not always
/// the repo we asked about. Match the message loosely.
static REPO_NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"fatal: repository '.+' not found").expect("static regex is valid")
});

static COMMIT_SHA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("static regex is valid"));

/// Resolves `Git` into `ImmutableGit` by asking the remote.
///
/// Four outcomes:
/// - the remote resolves the ref: `Exists` with the SHA from `ls-remote`
/// - the remote answers but has no such ref: `DoesNotExist`, unless the ref
///   already looks like a commit SHA, in which case we assume it exists
///   (`MaybeExists`) - `ls-remote` only matches ref *names*, never commits
/// - the remote does not exist: `DoesNotExist`
/// - anything else `git` complains about is a real error
pub struct ImmutableGitResolver;

#[async_trait]
impl super::Resolve for ImmutableGitResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::Git]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::Git(git) = question else {
            return Ok(None);
        };

        let output = GitCommand::ls_remote(&git.repo, &git.r#ref).execute_raw().await?;

        if !output.success() {
            if REPO_NOT_FOUND.is_match(&output.stderr) {
                return Ok(Some(Answer::DoesNotExist {
                    kind: RepoKind::ImmutableGit,
                    message: format!("Could not access git repository at {}", git.repo),
                }));
            }
            return Err(RepofetchError::SubprocessFailed {
                command: format!("git ls-remote -- {} {}", git.repo, git.r#ref),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into());
        }

        if output.stdout.trim().is_empty() {
            if COMMIT_SHA.is_match(&git.r#ref) {
                return Ok(Some(Answer::MaybeExists(
                    ImmutableGit { repo: git.repo.clone(), r#ref: git.r#ref.clone() }.into(),
                )));
            }
            return Ok(Some(Answer::DoesNotExist {
                kind: RepoKind::ImmutableGit,
                message: format!("No ref {} found in repo {}", git.r#ref, git.repo),
            }));
        }

        // First line, first tab-separated field is the resolved SHA
        let sha = output.stdout.split('\t').next().unwrap_or_default().trim().to_string();
        Ok(Some(Answer::Exists(ImmutableGit { repo: git.repo.clone(), r#ref: sha }.into())))
    }
}
