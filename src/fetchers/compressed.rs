//! Direct archive materialization.

use std::path::Path;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::core::error::RepofetchError;
use crate::repos::{Repo, RepoKind};
use crate::utils::archive::{extract_zip, flatten_single_subdir};
use crate::utils::http;

/// Downloads an archive URL and extracts it into the output directory.
/// Only zip is supported today; other archive types fail loudly rather
/// than guessing.
pub struct CompressedFileFetcher;

#[async_trait]
impl super::Fetch for CompressedFileFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::CompressedFile]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::CompressedFile(file) = repo else {
            bail!("Compressed file fetcher invoked with a {}", repo.kind().name());
        };

        if file.mime_type != "application/zip" {
            return Err(RepofetchError::UnsupportedArchive {
                mime_type: file.mime_type.clone(),
            }
            .into());
        }

        let client = http::client()?;
        let archive = tempfile::NamedTempFile::new()?;
        http::download_file(&client, file.url.clone(), archive.path()).await?;
        extract_zip(archive.path(), output_dir)?;
        flatten_single_subdir(output_dir)?;
        Ok(())
    }
}
