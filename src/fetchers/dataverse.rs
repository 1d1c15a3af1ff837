//! Dataverse dataset materialization.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

use crate::core::error::RepofetchError;
use crate::repos::{Repo, RepoKind};
use crate::utils::http;

/// Downloads every file of the dataset's latest version, preserving the
/// directory labels Dataverse stores alongside files. Files are requested
/// with `format=original` so ingest-converted tabular files come back in
/// their uploaded form.
pub struct DataverseFetcher;

#[async_trait]
impl super::Fetch for DataverseFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::DataverseDataset]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::DataverseDataset(dataset) = repo else {
            bail!("Dataverse fetcher invoked with a {}", repo.kind().name());
        };
        let installation = &dataset.installation_url;

        let mut files_url = http::join_path(installation, "api/datasets/:persistentId")?;
        files_url.query_pairs_mut().append_pair("persistentId", &dataset.persistent_id);

        let client = http::client()?;
        let resp = http::ensure_status(client.get(files_url.clone()).send().await?)?;
        let data: serde_json::Value = resp.json().await?;

        let files = data["data"]["latestVersion"]["files"].as_array().ok_or_else(|| {
            RepofetchError::MalformedResponse {
                url: files_url.to_string(),
                reason: "dataset response has no files list".to_string(),
            }
        })?;

        for file in files {
            let data_file = &file["dataFile"];
            let file_id = data_file["id"].as_u64().ok_or_else(|| {
                RepofetchError::MalformedResponse {
                    url: files_url.to_string(),
                    reason: "file entry has no dataFile id".to_string(),
                }
            })?;

            let mut download_url =
                http::join_path(installation, &format!("api/access/datafile/{file_id}"))?;
            download_url.query_pairs_mut().append_pair("format", "original");

            // Tabular files keep their uploaded name in originalFileName;
            // everything else goes by label
            let file_name = data_file["originalFileName"]
                .as_str()
                .or_else(|| file["label"].as_str())
                .with_context(|| format!("File {file_id} has neither a name nor a label"))?;

            let mut file_path = PathBuf::new();
            if let Some(directory) = file["directoryLabel"].as_str() {
                file_path.push(directory);
            }
            file_path.push(file_name);

            http::download_file(&client, download_url, &output_dir.join(file_path)).await?;
        }
        Ok(())
    }
}
