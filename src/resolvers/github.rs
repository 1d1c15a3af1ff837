//! GitHub URL-shape parsing: repositories, trees/blobs, pull requests,
//! Actions artifacts, and gists.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{
    Answer, Git, GitHubActionArtifact, GitHubPr, Repo, RepoKind,
};
use crate::utils::http;

fn path_segments(url: &Url) -> Vec<&str> {
    url.path().split('/').filter(|part| !part.trim().is_empty()).collect()
}

/// Rebuild the URL with only the first two path segments, dropping deep
/// paths, query, and fragment. Normalizes trailing slashes as a side effect.
fn repo_url(url: &Url, user: &str, repo: &str) -> String {
    let mut rebuilt = url.clone();
    rebuilt.set_path(&format!("{user}/{repo}"));
    rebuilt.set_query(None);
    rebuilt.set_fragment(None);
    rebuilt.to_string()
}

/// Pure parser for GitHub URLs. Emits the descriptor matching the path
/// shape; anything unrecognized (user pages, settings, workflow runs, ...)
/// is declined.
pub struct GitHubResolver;

#[async_trait]
impl super::Resolve for GitHubResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GitHubUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::GitHubUrl(github_url) = question else {
            return Ok(None);
        };
        let url = &github_url.url;
        let parts = path_segments(url);

        let repo = match parts.as_slice() {
            [user, repo] => Git { repo: repo_url(url, user, repo), r#ref: "HEAD".into() }.into(),
            [user, repo, marker, reference, ..] if matches!(*marker, "tree" | "blob") => Git {
                repo: repo_url(url, user, repo),
                r#ref: (*reference).to_string(),
            }
            .into(),
            [_, _, "pull", number] if number.chars().all(|c| c.is_ascii_digit()) => GitHubPr {
                installation: github_url.installation.clone(),
                url: url.clone(),
            }
            .into(),
            // <user>/<repo>/actions/runs/<run-id>/artifacts/<artifact-id>
            [user, repo, "actions", "runs", _, "artifacts", artifact_id] => {
                let Ok(artifact_id) = artifact_id.parse::<u64>() else {
                    return Ok(None);
                };
                GitHubActionArtifact {
                    installation: github_url.installation.clone(),
                    account: (*user).to_string(),
                    repo: (*repo).to_string(),
                    artifact_id,
                }
                .into()
            }
            _ => return Ok(None),
        };
        Ok(Some(Answer::MaybeExists(repo)))
    }
}

/// Resolves a pull request to the git repo + branch its head points at.
pub struct GitHubPrResolver {
    api_base: Url,
}

impl Default for GitHubPrResolver {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.github.com/")
                .expect("static GitHub API URL is valid"),
        }
    }
}

impl GitHubPrResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the resolver at a different API base (used by tests).
    #[must_use]
    pub fn with_api_base(api_base: Url) -> Self {
        Self { api_base }
    }
}

#[async_trait]
impl super::Resolve for GitHubPrResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GitHubPr]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::GitHubPr(pr) = question else {
            return Ok(None);
        };
        let parts = path_segments(&pr.url);
        let [org, repo, _, number] = parts.as_slice() else {
            return Ok(None);
        };

        let api_url = http::join_path(&self.api_base, &format!("repos/{org}/{repo}/pulls/{number}"))?;

        let client = http::client()?;
        let resp = client.get(api_url.clone()).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Some(Answer::DoesNotExist {
                kind: RepoKind::GitHubPr,
                message: format!("PR {number} does not exist at {}", pr.url),
            })),
            StatusCode::OK => {
                let data: serde_json::Value = resp.json().await?;
                let head_repo = data["head"]["repo"]["html_url"].as_str();
                let head_ref = data["head"]["ref"].as_str();
                let (Some(head_repo), Some(head_ref)) = (head_repo, head_ref) else {
                    return Err(RepofetchError::MalformedResponse {
                        url: api_url.to_string(),
                        reason: "pull request response has no head repo/ref".to_string(),
                    }
                    .into());
                };
                Ok(Some(Answer::MaybeExists(
                    Git { repo: head_repo.to_string(), r#ref: head_ref.to_string() }.into(),
                )))
            }
            status => Err(RepofetchError::HttpStatus {
                url: api_url.to_string(),
                status: status.as_u16(),
            }
            .into()),
        }
    }
}

/// Pure parser for gist URLs. A `<user>/<gist-id>` gist is a cloneable git
/// repository; revision URLs are not supported and decline.
pub struct GistResolver;

#[async_trait]
impl super::Resolve for GistResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GistUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::GistUrl(gist_url) = question else {
            return Ok(None);
        };
        let parts = path_segments(&gist_url.url);

        if parts.len() == 2 {
            return Ok(Some(Answer::MaybeExists(
                Git { repo: gist_url.url.to_string(), r#ref: "HEAD".into() }.into(),
            )));
        }
        Ok(None)
    }
}
