//! Zenodo / Invenio record resolution.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use url::Url;

use crate::repos::{Answer, Repo, RepoKind, ZenodoDataset};
use crate::utils::http;

/// Resolves record URLs in any Invenio installation (Zenodo being the big
/// one) into record ids.
pub struct ZenodoResolver;

#[async_trait]
impl super::Resolve for ZenodoResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::ZenodoUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::ZenodoUrl(zenodo_url) = question else {
            return Ok(None);
        };
        let installation = &zenodo_url.installation;
        let mut url = zenodo_url.url.clone();

        // DOI landing URLs (`/doi/<prefix>/<suffix>`) don't carry the record
        // id. There is no API that maps a DOI to a record id, so we HEAD the
        // URL with redirects disabled and walk Location headers until the
        // path stops being a /doi/ one - the concept DOI can point at
        // *different* records over time, which is exactly why we pin it here.
        let client = http::no_redirect_client()?;
        loop {
            let rest = url
                .path()
                .strip_prefix(installation.path())
                .unwrap_or_else(|| url.path().trim_start_matches('/'));

            if !(rest.starts_with("record/")
                || rest.starts_with("records/")
                || rest.starts_with("doi/"))
            {
                return Ok(None);
            }

            if rest.starts_with("doi/") {
                let segment_count = url.path().split('/').filter(|p| !p.is_empty()).count();
                if segment_count != 3 {
                    // Not a <installation>/doi/<prefix>/<suffix> URL
                    return Ok(None);
                }

                let resp = client.head(url.clone()).send().await?;
                if resp.status() == StatusCode::NOT_FOUND {
                    return Ok(Some(Answer::DoesNotExist {
                        kind: RepoKind::ZenodoDataset,
                        message: format!("{url} is not a valid Zenodo DOI URL"),
                    }));
                }
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .context("Zenodo DOI URL did not redirect")?
                    .to_str()
                    .context("Location header is not valid UTF-8")?;
                url = url.join(location).context("Location header is not a valid URL")?;
                continue;
            }

            // /record/<id> or /records/<id>: the record id is the last path
            // segment
            let record_id = url
                .path()
                .rsplit('/')
                .find(|segment| !segment.is_empty())
                .unwrap_or_default()
                .to_string();
            return Ok(Some(Answer::MaybeExists(
                ZenodoDataset { installation_url: installation.clone(), record_id }.into(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::ZenodoUrl;
    use crate::resolvers::Resolve;

    fn question(installation: &str, url: &str) -> Repo {
        ZenodoUrl {
            installation: Url::parse(installation).unwrap(),
            url: Url::parse(url).unwrap(),
        }
        .into()
    }

    #[tokio::test]
    async fn record_urls_need_no_network() {
        let answer = ZenodoResolver
            .resolve(&question("https://zenodo.org/", "https://zenodo.org/records/14007206"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            answer,
            Answer::MaybeExists(
                ZenodoDataset {
                    installation_url: Url::parse("https://zenodo.org/").unwrap(),
                    record_id: "14007206".into(),
                }
                .into()
            )
        );
    }

    #[tokio::test]
    async fn singular_record_form_works_too() {
        let answer = ZenodoResolver
            .resolve(&question("https://zenodo.org/", "https://zenodo.org/record/3232985"))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(answer, Answer::MaybeExists(Repo::ZenodoDataset(_))));
    }

    #[tokio::test]
    async fn doi_urls_follow_the_location_header() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/doi/10.5281/zenodo.805993")
            .with_status(302)
            .with_header("Location", "/records/14007206")
            .create_async()
            .await;

        let base = format!("{}/", server.url());
        let answer = ZenodoResolver
            .resolve(&question(&base, &format!("{}doi/10.5281/zenodo.805993", base)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            answer,
            Answer::MaybeExists(
                ZenodoDataset {
                    installation_url: Url::parse(&base).unwrap(),
                    record_id: "14007206".into(),
                }
                .into()
            )
        );
    }

    #[tokio::test]
    async fn missing_doi_does_not_exist() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("HEAD", "/doi/10.5281/zenodo.999999999")
            .with_status(404)
            .create_async()
            .await;

        let base = format!("{}/", server.url());
        let answer = ZenodoResolver
            .resolve(&question(&base, &format!("{}doi/10.5281/zenodo.999999999", base)))
            .await
            .unwrap()
            .unwrap();

        assert!(answer.is_does_not_exist());
    }

    #[tokio::test]
    async fn malformed_doi_paths_are_not_recognized() {
        // Too many segments for a DOI landing URL
        let answer = ZenodoResolver
            .resolve(&question(
                "https://zenodo.org/",
                "https://zenodo.org/doi/10.5281/zenodo.805993/extra",
            ))
            .await
            .unwrap();
        assert_eq!(answer, None);
    }
}
