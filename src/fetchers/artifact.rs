//! GitHub Actions artifact materialization.

use std::path::Path;

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::header;
use url::Url;

use crate::creds;
use crate::repos::{Repo, RepoKind};
use crate::utils::archive::extract_zip;
use crate::utils::http;

/// Downloads an artifact's zip through the REST API and extracts it.
///
/// Artifact downloads require authentication even on public repositories,
/// so the embedded read-only token rides along. The API answers with a
/// redirect to blob storage; reqwest follows it and drops the Authorization
/// header at the host boundary.
pub struct GitHubActionArtifactFetcher {
    api_base: Url,
}

impl Default for GitHubActionArtifactFetcher {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://api.github.com/")
                .expect("static GitHub API URL is valid"),
        }
    }
}

impl GitHubActionArtifactFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the fetcher at a different API base (used by tests).
    #[must_use]
    pub fn with_api_base(api_base: Url) -> Self {
        Self { api_base }
    }
}

#[async_trait]
impl super::Fetch for GitHubActionArtifactFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GitHubActionArtifact]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::GitHubActionArtifact(artifact) = repo else {
            bail!("Artifact fetcher invoked with a {}", repo.kind().name());
        };

        let download_url = http::join_path(
            &self.api_base,
            &format!(
                "repos/{}/{}/actions/artifacts/{}/zip",
                artifact.account, artifact.repo, artifact.artifact_id
            ),
        )?;

        let client = reqwest::Client::builder()
            .user_agent(http::USER_AGENT)
            .default_headers({
                let mut headers = header::HeaderMap::new();
                let mut auth = header::HeaderValue::from_str(&format!(
                    "Bearer {}",
                    creds::github_artifact_token()
                ))?;
                auth.set_sensitive(true);
                headers.insert(header::AUTHORIZATION, auth);
                headers
            })
            .build()?;

        let archive = tempfile::NamedTempFile::new()?;
        http::download_file(&client, download_url, archive.path()).await?;
        extract_zip(archive.path(), output_dir)?;
        Ok(())
    }
}
