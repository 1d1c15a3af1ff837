//! Hydroshare resource materialization.

use std::path::Path;

use anyhow::{Result, bail};
use async_trait::async_trait;
use url::Url;

use crate::repos::{Repo, RepoKind};
use crate::utils::archive::extract_zip_prefixed;
use crate::utils::http;

/// Downloads the resource's bag and extracts only the payload.
///
/// The bag is generated on first request, so the initial GET can take a
/// while before bytes start flowing; the streaming download copes with that
/// fine. Only members under `<resource-id>/data/contents/` are payload, and
/// they are re-rooted at the output directory.
pub struct HydroshareFetcher {
    bags_base: Url,
}

impl Default for HydroshareFetcher {
    fn default() -> Self {
        Self {
            bags_base: Url::parse("https://www.hydroshare.org/django_irods/download/bags/")
                .expect("static hydroshare URL is valid"),
        }
    }
}

impl HydroshareFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the fetcher at a different bag endpoint (used by tests).
    #[must_use]
    pub fn with_bags_base(bags_base: Url) -> Self {
        Self { bags_base }
    }
}

#[async_trait]
impl super::Fetch for HydroshareFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::HydroshareDataset]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::HydroshareDataset(dataset) = repo else {
            bail!("Hydroshare fetcher invoked with a {}", repo.kind().name());
        };

        let download_url = http::join_path(&self.bags_base, &dataset.resource_id)?;

        let client = http::client()?;
        let archive = tempfile::NamedTempFile::new()?;
        http::download_file(&client, download_url, archive.path()).await?;

        let contents_prefix = format!("{}/data/contents/", dataset.resource_id);
        extract_zip_prefixed(archive.path(), output_dir, &contents_prefix)?;
        Ok(())
    }
}
