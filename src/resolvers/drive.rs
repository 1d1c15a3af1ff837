//! Google Drive folder resolution via rclone.
//!
//! There is no anonymous listing API for Drive, so we drive `rclone lsjson`
//! with the embedded identity-only service account and pin the folder by a
//! hash over its recursive listing.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::creds;
use crate::repos::{Answer, ImmutableGoogleDriveFolder, Repo, RepoKind};
use crate::utils::hash::dir_hash;
use crate::utils::platform::{rclone_command, require_binary};
use crate::utils::process::exec;

pub struct GoogleDriveFolderResolver;

/// rclone prefixes every stderr line with a timestamp; drop it before
/// surfacing the message.
fn strip_timestamp(stderr: &str) -> &str {
    stderr.char_indices().nth(20).map_or("", |(i, _)| &stderr[i..])
}

#[async_trait]
impl super::Resolve for GoogleDriveFolderResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GoogleDriveFolder]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::GoogleDriveFolder(folder) = question else {
            return Ok(None);
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
                "lsjson",
                &connection_string,
                "--recursive",
                "--hash",
                "--drive-root-folder-id",
                &folder.id,
            ],
        )
        .await?;

        if !output.success() {
            return Ok(Some(Answer::DoesNotExist {
                kind: RepoKind::GoogleDriveFolder,
                message: strip_timestamp(&output.stderr).trim().to_string(),
            }));
        }

        let listing: Vec<serde_json::Value> =
            serde_json::from_str(&output.stdout).context("rclone lsjson output is not JSON")?;

        if listing.is_empty() {
            // Usually missing permissions rather than a genuinely empty
            // folder; either way there is nothing to pin or fetch
            return Ok(Some(Answer::DoesNotExist {
                kind: RepoKind::GoogleDriveFolder,
                message: "The Google Drive Folder either does not exist, is empty or is not public"
                    .to_string(),
            }));
        }

        let mut hash_input = HashMap::new();
        for item in &listing {
            let Some(path) = item["Path"].as_str() else {
                continue;
            };
            // Best content identity available: sha256, then sha1, then md5.
            // Directories have no hashes at all and fall back to ModTime.
            let identity = ["sha256", "sha1", "md5"]
                .iter()
                .find_map(|algo| item["Hashes"][algo].as_str())
                .or_else(|| item["ModTime"].as_str())
                .unwrap_or_default();
            hash_input.insert(path.to_string(), identity.to_string());
        }

        Ok(Some(Answer::Exists(
            ImmutableGoogleDriveFolder { id: folder.id.clone(), dir_hash: dir_hash(&hash_input)? }
                .into(),
        )))
    }
}
