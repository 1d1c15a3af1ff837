//! HTTP plumbing shared by resolvers and fetchers.
//!
//! Each caller builds its own short-lived client; clients are not pooled
//! across resolvers. Unexpected (non-404) statuses surface as
//! [`RepofetchError::HttpStatus`] and abort the pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::header::LOCATION;
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::core::error::RepofetchError;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("repofetch/", env!("CARGO_PKG_VERSION"));

/// Build a client with our user agent and default redirect handling.
pub fn client() -> Result<Client> {
    Client::builder().user_agent(USER_AGENT).build().context("Failed to build HTTP client")
}

/// Build a client that does not follow redirects. The Zenodo resolver needs
/// to read `Location` headers itself.
pub fn no_redirect_client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to build HTTP client")
}

/// Turn a non-2xx response into a structured error, passing 2xx through.
pub fn ensure_status(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(RepofetchError::HttpStatus { url: resp.url().to_string(), status: status.as_u16() }
            .into())
    }
}

/// Join a path below `base`, treating `base` as a directory even when its
/// path lacks the trailing slash (installation URLs come in both forms).
pub fn join_path(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
        .with_context(|| format!("Cannot join {path} onto {base}"))
}

/// Stream a GET response to `output_path` in chunks of at most 4 KiB,
/// creating parent directories as needed.
///
/// A response with status 200 *and* a `Location` header is followed as if it
/// were a redirect. At least one provider (an Invenio installation) emits
/// this invalid combination, and we have to honor it.
pub async fn download_file(client: &Client, url: Url, output_path: &Path) -> Result<()> {
    const CHUNK_SIZE: usize = 4 * 1024;

    let mut url = url;
    loop {
        debug!("downloading {} -> {}", url, output_path.display());
        let resp = client.get(url.clone()).send().await?;

        if resp.status() == StatusCode::OK
            && let Some(location) = resp.headers().get(LOCATION)
        {
            let location = location.to_str().context("Location header is not valid UTF-8")?;
            url = url.join(location).context("Location header is not a valid URL")?;
            continue;
        }

        let mut resp = ensure_status(resp)?;

        if let Some(parent) = output_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create directory {}", parent.display())
            })?;
        }

        let mut file = tokio::fs::File::create(output_path)
            .await
            .with_context(|| format!("Failed to create {}", output_path.display()))?;

        while let Some(chunk) = resp.chunk().await? {
            for slice in chunk.chunks(CHUNK_SIZE) {
                file.write_all(slice).await?;
            }
        }
        file.flush().await?;
        return Ok(());
    }
}
