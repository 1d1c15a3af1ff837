//! Figshare article resolution: URL shape parsing, then version pinning.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

use crate::core::error::RepofetchError;
use crate::repos::{Answer, FigshareDataset, ImmutableFigshareDataset, Repo, RepoKind};
use crate::utils::http;

/// Parses article URLs into [`FigshareDataset`]. Pure, no network.
///
/// Article ids and version numbers are both integers; a URL ending in two
/// integer segments carries an explicit version, one ending in a single
/// integer segment does not.
pub struct FigshareResolver;

#[async_trait]
impl super::Resolve for FigshareResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::FigshareUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::FigshareUrl(figshare_url) = question else {
            return Ok(None);
        };
        let installation = &figshare_url.installation;
        let url = &figshare_url.url;

        let rest = url.path().strip_prefix(installation.url.path()).unwrap_or(url.path());
        if !(rest.starts_with("articles/") || rest.starts_with("account/articles/")) {
            return Ok(None);
        }

        let segments: Vec<&str> = url.path().split('/').filter(|p| !p.is_empty()).collect();
        let last = segments.last().and_then(|s| s.parse::<u64>().ok());
        let second_last =
            segments.len().checked_sub(2).and_then(|i| segments[i].parse::<u64>().ok());

        let dataset = match (second_last, last) {
            (Some(article_id), Some(version)) => FigshareDataset {
                installation: installation.clone(),
                article_id,
                version: Some(version),
            },
            (None, Some(article_id)) => {
                FigshareDataset { installation: installation.clone(), article_id, version: None }
            }
            _ => return Ok(None),
        };
        Ok(Some(Answer::MaybeExists(dataset.into())))
    }
}

/// Pins a [`FigshareDataset`] to a concrete published version.
///
/// With an explicit version we take the caller's word for it
/// (`MaybeExists`); without one we ask the versions API and pin to the last
/// published version, which also proves the article exists.
pub struct ImmutableFigshareResolver;

#[async_trait]
impl super::Resolve for ImmutableFigshareResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::FigshareDataset]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::FigshareDataset(dataset) = question else {
            return Ok(None);
        };

        if let Some(version) = dataset.version {
            return Ok(Some(Answer::MaybeExists(
                ImmutableFigshareDataset {
                    installation: dataset.installation.clone(),
                    article_id: dataset.article_id,
                    version,
                }
                .into(),
            )));
        }

        let api_url = http::join_path(
            &dataset.installation.api_url,
            &format!("articles/{}/versions", dataset.article_id),
        )?;

        let client = http::client()?;
        let resp = client.get(api_url.clone()).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Some(Answer::DoesNotExist {
                kind: RepoKind::ImmutableFigshareDataset,
                message: format!(
                    "Article ID {} not found on figshare installation {}",
                    dataset.article_id, dataset.installation.url
                ),
            })),
            StatusCode::OK => {
                let versions: serde_json::Value = resp.json().await?;
                let last_version = versions
                    .as_array()
                    .and_then(|list| list.last())
                    .and_then(|entry| entry["version"].as_u64())
                    .ok_or_else(|| RepofetchError::MalformedResponse {
                        url: api_url.to_string(),
                        reason: "versions response has no published versions".to_string(),
                    })?;
                Ok(Some(Answer::Exists(
                    ImmutableFigshareDataset {
                        installation: dataset.installation.clone(),
                        article_id: dataset.article_id,
                        version: last_version,
                    }
                    .into(),
                )))
            }
            status => Err(RepofetchError::HttpStatus {
                url: api_url.to_string(),
                status: status.as_u16(),
            }
            .into()),
        }
    }
}
