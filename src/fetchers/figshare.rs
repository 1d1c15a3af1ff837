//! Figshare article materialization.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{Repo, RepoKind};
use crate::utils::archive::{extract_zip, flatten_single_subdir};
use crate::utils::http;

/// Downloads the files of a pinned article version. Link-only entries are
/// skipped - there is nothing to download. A version that is exactly one
/// zip archive is extracted in place, like the Zenodo fetcher does.
pub struct FigshareFetcher;

#[async_trait]
impl super::Fetch for FigshareFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::ImmutableFigshareDataset]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::ImmutableFigshareDataset(dataset) = repo else {
            bail!("Figshare fetcher invoked with a {}", repo.kind().name());
        };

        let api_url = http::join_path(
            &dataset.installation.api_url,
            &format!("articles/{}/versions/{}", dataset.article_id, dataset.version),
        )?;

        let client = http::client()?;
        let resp = http::ensure_status(client.get(api_url.clone()).send().await?)?;
        let data: serde_json::Value = resp.json().await?;

        let files: Vec<&serde_json::Value> = data["files"]
            .as_array()
            .ok_or_else(|| RepofetchError::MalformedResponse {
                url: api_url.to_string(),
                reason: "version response has no files list".to_string(),
            })?
            .iter()
            .filter(|file| file["is_link_only"] != true)
            .collect();

        let download_url = |file: &serde_json::Value| -> Result<Url> {
            let link = file["download_url"].as_str().ok_or_else(|| {
                RepofetchError::MalformedResponse {
                    url: api_url.to_string(),
                    reason: "file entry has no download_url".to_string(),
                }
            })?;
            Url::parse(link).context("download_url is not a valid URL")
        };

        if let [file] = files.as_slice()
            && file["mimetype"] == "application/zip"
        {
            let archive = tempfile::NamedTempFile::new()?;
            http::download_file(&client, download_url(file)?, archive.path()).await?;
            extract_zip(archive.path(), output_dir)?;
            flatten_single_subdir(output_dir)?;
            return Ok(());
        }

        for file in files {
            let name = file["name"].as_str().ok_or_else(|| {
                RepofetchError::MalformedResponse {
                    url: api_url.to_string(),
                    reason: "file entry has no name".to_string(),
                }
            })?;
            http::download_file(&client, download_url(file)?, &output_dir.join(name)).await?;
        }
        Ok(())
    }
}
