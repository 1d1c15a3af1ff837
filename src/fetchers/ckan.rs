//! CKAN dataset materialization.

use std::path::Path;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{Repo, RepoKind};
use crate::utils::http;

/// Downloads every resource of the dataset. CKAN has no consistent file
/// naming, so the last segment of each resource URL serves as the name.
pub struct CkanFetcher;

#[async_trait]
impl super::Fetch for CkanFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::CkanDataset]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::CkanDataset(dataset) = repo else {
            bail!("CKAN fetcher invoked with a {}", repo.kind().name());
        };

        let mut api_url =
            http::join_path(&dataset.installation_url, "api/3/action/package_show")?;
        api_url.query_pairs_mut().append_pair("id", &dataset.dataset_id);

        let client = http::client()?;
        let resp = http::ensure_status(client.get(api_url.clone()).send().await?)?;
        let data: serde_json::Value = resp.json().await?;

        let resources = data["result"]["resources"].as_array().ok_or_else(|| {
            RepofetchError::MalformedResponse {
                url: api_url.to_string(),
                reason: "package response has no resources".to_string(),
            }
        })?;

        for resource in resources {
            let resource_url = resource["url"]
                .as_str()
                .ok_or_else(|| RepofetchError::MalformedResponse {
                    url: api_url.to_string(),
                    reason: "resource entry has no url".to_string(),
                })
                .and_then(|raw| {
                    Url::parse(raw).map_err(|_| RepofetchError::MalformedResponse {
                        url: api_url.to_string(),
                        reason: format!("resource url {raw} is not valid"),
                    })
                })?;

            let file_name = resource_url
                .path()
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .context("resource URL has no usable file name")?
                .to_string();

            http::download_file(&client, resource_url, &output_dir.join(file_name)).await?;
        }
        Ok(())
    }
}
