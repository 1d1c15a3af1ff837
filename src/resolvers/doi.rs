//! Handle-system resolution. Called the DOI resolver because DOIs are the
//! handles people actually paste at us.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::core::error::RepofetchError;
use crate::repos::{Answer, Doi, Repo, RepoKind};
use crate::utils::http;

/// Dereferences `doi:` / `hdl:` identifiers (and their resolver-site HTTP
/// forms) through the central handle REST service.
pub struct DoiResolver {
    api_base: Url,
}

impl Default for DoiResolver {
    fn default() -> Self {
        Self {
            api_base: Url::parse("https://doi.org/api/handles/")
                .expect("static handle API URL is valid"),
        }
    }
}

impl DoiResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the resolver at a different handle endpoint (used by tests).
    #[must_use]
    pub fn with_api_base(api_base: Url) -> Self {
        Self { api_base }
    }

    /// Pull the bare handle out of the supported question shapes, or `None`
    /// when this isn't a handle at all.
    fn extract_handle(question: &Url) -> Option<String> {
        match question.scheme() {
            "doi" | "hdl" => Some(question.path().to_string()),
            "http" | "https" => match question.host_str() {
                Some("doi.org" | "www.doi.org" | "hdl.handle.net") => {
                    Some(question.path().trim_start_matches('/').to_string())
                }
                _ => None,
            },
            _ => None,
        }
    }
}

#[async_trait]
impl super::Resolve for DoiResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::RawUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::RawUrl(raw) = question else {
            return Ok(None);
        };
        let Some(handle) = Self::extract_handle(&raw.url) else {
            return Ok(None);
        };

        let api_url = self
            .api_base
            .join(&handle)
            .with_context(|| format!("Handle {handle} does not form a valid API URL"))?;

        let client = http::client()?;
        let resp = client.get(api_url.clone()).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                // Validly formatted, but nobody ever registered it
                Ok(Some(Answer::DoesNotExist {
                    kind: RepoKind::Doi,
                    message: format!("{handle} is not a registered DOI or handle"),
                }))
            }
            StatusCode::OK => {
                let data: serde_json::Value = resp.json().await?;
                let values = data["values"].as_array().ok_or_else(|| {
                    RepofetchError::MalformedResponse {
                        url: api_url.to_string(),
                        reason: "handle response has no values array".to_string(),
                    }
                })?;

                // The first URL-typed entry is the dereference target
                for value in values {
                    if value["type"] == "URL" {
                        let target = value["data"]["value"].as_str().ok_or_else(|| {
                            RepofetchError::MalformedResponse {
                                url: api_url.to_string(),
                                reason: "URL value entry has no string data".to_string(),
                            }
                        })?;
                        let target = Url::parse(target).with_context(|| {
                            format!("Handle {handle} dereferences to an unparseable URL")
                        })?;
                        return Ok(Some(Answer::Exists(Doi { url: target }.into())));
                    }
                }

                Ok(Some(Answer::DoesNotExist {
                    kind: RepoKind::Doi,
                    message: format!("{handle} does not point to any URL"),
                }))
            }
            status => Err(RepofetchError::HttpStatus {
                url: api_url.to_string(),
                status: status.as_u16(),
            }
            .into()),
        }
    }
}
