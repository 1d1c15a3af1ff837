//! Zenodo / Invenio record materialization.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{Repo, RepoKind};
use crate::utils::archive::{extract_zip, flatten_single_subdir};
use crate::utils::http;

/// Downloads a record's files. A record that is exactly one zip archive is
/// extracted in place (with single-directory wrappers flattened); anything
/// else is downloaded file by file. Zenodo has no directory structure, so
/// file keys map straight to names.
pub struct ZenodoFetcher;

#[async_trait]
impl super::Fetch for ZenodoFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::ZenodoDataset]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::ZenodoDataset(dataset) = repo else {
            bail!("Zenodo fetcher invoked with a {}", repo.kind().name());
        };

        let files_url = http::join_path(
            &dataset.installation_url,
            &format!("api/records/{}/files", dataset.record_id),
        )?;

        let client = http::client()?;
        let resp = http::ensure_status(client.get(files_url.clone()).send().await?)?;
        let data: serde_json::Value = resp.json().await?;

        let entries = data["entries"].as_array().ok_or_else(|| {
            RepofetchError::MalformedResponse {
                url: files_url.to_string(),
                reason: "files response has no entries".to_string(),
            }
        })?;

        let content_url = |entry: &serde_json::Value| -> Result<Url> {
            let link = entry["links"]["content"].as_str().ok_or_else(|| {
                RepofetchError::MalformedResponse {
                    url: files_url.to_string(),
                    reason: "file entry has no content link".to_string(),
                }
            })?;
            Url::parse(link).context("content link is not a valid URL")
        };

        if let [entry] = entries.as_slice()
            && entry["mimetype"] == "application/zip"
        {
            let archive = tempfile::NamedTempFile::new()?;
            http::download_file(&client, content_url(entry)?, archive.path()).await?;
            extract_zip(archive.path(), output_dir)?;
            flatten_single_subdir(output_dir)?;
            return Ok(());
        }

        for entry in entries {
            let key = entry["key"].as_str().ok_or_else(|| {
                RepofetchError::MalformedResponse {
                    url: files_url.to_string(),
                    reason: "file entry has no key".to_string(),
                }
            })?;
            http::download_file(&client, content_url(entry)?, &output_dir.join(key)).await?;
        }
        Ok(())
    }
}
