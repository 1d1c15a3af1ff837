//! Dataverse URL resolution.
//!
//! Dataverse URLs reference either datasets or individual files, through
//! several page and API shapes. Whatever the input referenced, the answer is
//! always the *dataset* containing it - file references are promoted to
//! their parent dataset via the files API.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{Answer, DataverseDataset, Repo, RepoKind};
use crate::utils::http;

pub struct DataverseResolver;

impl DataverseResolver {
    /// Look up the persistent id of the dataset containing `file_id` (a
    /// numeric entity id or a DOI-shaped persistent id). `None` means the
    /// installation has no such file.
    async fn dataset_id_from_file_id(
        &self,
        client: &reqwest::Client,
        installation: &Url,
        file_id: &str,
    ) -> Result<Option<String>> {
        let api_url = if file_id.chars().all(|c| c.is_ascii_digit()) {
            let mut api_url = http::join_path(installation, &format!("api/files/{file_id}"))?;
            api_url.query_pairs_mut().append_pair("returnDatasetVersion", "true");
            api_url
        } else {
            let mut api_url = http::join_path(installation, "api/files/:persistentId")?;
            api_url
                .query_pairs_mut()
                .append_pair("returnDatasetVersion", "true")
                .append_pair("persistentId", file_id);
            api_url
        };

        let resp = client.get(api_url.clone()).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = http::ensure_status(resp)?;

        let data: serde_json::Value = resp.json().await?;
        let persistent_id = data["data"]["datasetVersion"]["datasetPersistentId"]
            .as_str()
            .ok_or_else(|| RepofetchError::MalformedResponse {
                url: api_url.to_string(),
                reason: "file response has no datasetPersistentId".to_string(),
            })?;
        Ok(Some(persistent_id.to_string()))
    }

    /// Probe the datasets endpoint to check whether `persistent_id` names a
    /// dataset in this installation.
    async fn dataset_exists(
        &self,
        client: &reqwest::Client,
        installation: &Url,
        persistent_id: &str,
    ) -> Result<bool> {
        let mut api_url = http::join_path(installation, "api/datasets/:persistentId")?;
        api_url.query_pairs_mut().append_pair("persistentId", persistent_id);

        let resp = client.get(api_url.clone()).send().await?;
        match resp.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(RepofetchError::HttpStatus {
                url: api_url.to_string(),
                status: status.as_u16(),
            }
            .into()),
        }
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
}

#[async_trait]
impl super::Resolve for DataverseResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::DataverseUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::DataverseUrl(dataverse_url) = question else {
            return Ok(None);
        };
        let installation = &dataverse_url.installation;
        let url = &dataverse_url.url;
        let path = url.path();

        let client = http::client()?;

        // Each URL shape yields a persistent id; some shapes additionally
        // prove it names a dataset, the rest get verified below.
        let (persistent_id, verified_dataset) = if path.starts_with("/citation")
            || path.starts_with("/dataset.xhtml")
        {
            // Could be a dataset or a file citation - verification decides
            let Some(persistent_id) = query_param(url, "persistentId") else {
                return Ok(None);
            };
            (persistent_id, false)
        } else if path.starts_with("/api/access/datafile") {
            let Some(file_id) = path.rsplit('/').next().filter(|id| !id.is_empty()) else {
                return Ok(None);
            };
            match self.dataset_id_from_file_id(&client, installation, file_id).await? {
                Some(persistent_id) => (persistent_id, true),
                None => {
                    return Ok(Some(Answer::DoesNotExist {
                        kind: RepoKind::DataverseDataset,
                        message: format!(
                            "No file with id {file_id} found in dataverse installation {installation}"
                        ),
                    }));
                }
            }
        } else if path.starts_with("/file.xhtml") {
            let Some(file_id) = query_param(url, "persistentId") else {
                return Ok(None);
            };
            match self.dataset_id_from_file_id(&client, installation, &file_id).await? {
                Some(persistent_id) => (persistent_id, true),
                None => {
                    return Ok(Some(Answer::DoesNotExist {
                        kind: RepoKind::DataverseDataset,
                        message: format!(
                            "No file with id {file_id} found in dataverse installation {installation}"
                        ),
                    }));
                }
            }
        } else {
            // Not a dataset-ish URL under this installation
            return Ok(None);
        };

        let persistent_id = if verified_dataset {
            persistent_id
        } else if self.dataset_exists(&client, installation, &persistent_id).await? {
            persistent_id
        } else {
            // Not a dataset; a citation may still point at a file
            match self.dataset_id_from_file_id(&client, installation, &persistent_id).await? {
                Some(dataset_id) => dataset_id,
                None => {
                    return Ok(Some(Answer::DoesNotExist {
                        kind: RepoKind::DataverseDataset,
                        message: format!(
                            "{persistent_id} is neither a file nor a dataset in {installation}"
                        ),
                    }));
                }
            }
        };

        Ok(Some(Answer::Exists(
            DataverseDataset {
                installation_url: installation.clone(),
                persistent_id,
            }
            .into(),
        )))
    }
}
