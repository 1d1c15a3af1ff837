//! Google Drive folder materialization via rclone.

use std::path::Path;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::core::error::RepofetchError;
use crate::creds;
use crate::repos::{Repo, RepoKind};
use crate::utils::platform::{rclone_command, require_binary};
use crate::utils::process::exec;

/// Copies the folder's contents with `rclone copy` under the embedded
/// read-only service account.
///
/// The descriptor carries a directory hash, but the download is not
/// re-verified against it - the hash pins identity at resolve time only.
pub struct GoogleDriveFetcher;

#[async_trait]
impl super::Fetch for GoogleDriveFetcher {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::ImmutableGoogleDriveFolder]
    }

    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()> {
        let Repo::ImmutableGoogleDriveFolder(folder) = repo else {
            bail!("Google Drive fetcher invoked with a {}", repo.kind().name());
        };
        require_binary(rclone_command())?;

        let key_file = creds::write_service_account_key()?;
        let connection_string = format!(
            ":drive,scope=drive.readonly,service_account_file={}:",
            key_file.path().display()
        );

        let output = exec(
            rclone_command(),
            [
                "copy",
                &connection_string,
                "--drive-root-folder-id",
                &folder.id,
                &output_dir.to_string_lossy(),
            ],
        )
        .await?;

        if !output.success() {
            return Err(RepofetchError::SubprocessFailed {
                command: format!("rclone copy --drive-root-folder-id {}", folder.id),
                code: output.code,
                stdout: output.stdout,
                stderr: output.stderr,
            }
            .into());
        }
        Ok(())
    }
}
