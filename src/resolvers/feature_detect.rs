//! Feature detection: the resolver of last resort.
//!
//! When no catalog recognized a URL, probe it with provider-agnostic
//! heuristics. Ordering is part of the design: Dataverse is probed before
//! raw git because some Dataverse installations also answer git's smart
//! HTTP discovery on the same host.
//!
//! Individual probes treat unexpected statuses and undecodable JSON as
//! "not this provider" and fall through, so one broken endpoint cannot hide
//! a different provider on the next probe. Transport failures still
//! propagate.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::repos::{Answer, CkanDataset, DataverseUrl, Git, GitLabUrl, Repo, RepoKind};
use crate::utils::http;

/// The OIDC claim only GitLab advertises; its presence in a discovery
/// document identifies the software.
const GITLAB_OIDC_CLAIM: &str = "https://gitlab.org/claims/groups/owner";

pub struct FeatureDetectResolver;

/// The URL's root with path, query, and fragment cleared.
fn root_of(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

/// GET a URL and parse the body as JSON. Unexpected statuses and undecodable
/// bodies mean "not this provider"; transport failures are real errors and
/// propagate.
async fn probe_json(client: &Client, url: Url) -> Result<Option<serde_json::Value>> {
    let resp = client.get(url).send().await?;
    if resp.status() != StatusCode::OK {
        return Ok(None);
    }
    Ok(resp.json().await.ok())
}

impl FeatureDetectResolver {
    /// Dataverse installations report their version on a fixed endpoint.
    async fn is_dataverse(&self, client: &Client, url: &Url) -> Result<Option<Answer>> {
        let installation = root_of(url);
        let api_url = http::join_path(&installation, "api/info/version")?;
        let Some(data) = probe_json(client, api_url).await? else {
            return Ok(None);
        };
        if data["status"] == "OK" && data["data"]["version"].is_string() {
            Ok(Some(Answer::MaybeExists(DataverseUrl { installation, url: url.clone() }.into())))
        } else {
            Ok(None)
        }
    }

    /// GitLab advertises itself through a GitLab-specific claim in its OIDC
    /// discovery document.
    async fn is_gitlab(&self, client: &Client, url: &Url) -> Result<Option<Answer>> {
        let installation = root_of(url);
        let discovery_url = http::join_path(&installation, ".well-known/openid-configuration")?;
        let Some(data) = probe_json(client, discovery_url).await? else {
            return Ok(None);
        };
        let matched = data["claims_supported"]
            .as_array()
            .is_some_and(|claims| claims.iter().any(|claim| claim == GITLAB_OIDC_CLAIM));
        if matched {
            Ok(Some(Answer::MaybeExists(GitLabUrl { installation, url: url.clone() }.into())))
        } else {
            Ok(None)
        }
    }

    /// Smart HTTP discovery: a 200 on `$GIT_URL/info/refs?service=git-upload-pack`
    /// means the URL is a clonable git repository.
    async fn is_git_repo(&self, client: &Client, url: &Url) -> Result<Option<Answer>> {
        let mut refs_url = url.clone();
        refs_url.set_path(&format!("{}/info/refs", url.path().trim_end_matches('/')));
        refs_url.set_query(Some("service=git-upload-pack"));

        let resp = client.get(refs_url).send().await?;
        if resp.status() == StatusCode::OK {
            Ok(Some(Answer::Exists(Git { repo: url.to_string(), r#ref: "HEAD".into() }.into())))
        } else {
            Ok(None)
        }
    }

    /// CKAN URLs carry a `/dataset/<id>` path; the installation is whatever
    /// precedes it, confirmed via the status API.
    async fn is_ckan(&self, client: &Client, url: &Url) -> Result<Option<Answer>> {
        let Some((base_path, rest)) = url.path().split_once("/dataset/") else {
            return Ok(None);
        };
        let Some(dataset_id) = rest.split('/').next().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let mut installation = url.clone();
        installation.set_path(base_path);
        installation.set_query(None);
        installation.set_fragment(None);

        let api_url = http::join_path(&installation, "api/3/action/status_show")?;
        let Some(data) = probe_json(client, api_url).await? else {
            return Ok(None);
        };
        if data["success"] == true {
            Ok(Some(Answer::MaybeExists(
                CkanDataset { installation_url: installation, dataset_id: dataset_id.to_string() }
                    .into(),
            )))
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl super::Resolve for FeatureDetectResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::RawUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::RawUrl(raw) = question else {
            return Ok(None);
        };
        if !matches!(raw.url.scheme(), "http" | "https") {
            return Ok(None);
        }

        let client = http::client()?;
        if let Some(answer) = self.is_dataverse(&client, &raw.url).await? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.is_gitlab(&client, &raw.url).await? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.is_git_repo(&client, &raw.url).await? {
            return Ok(Some(answer));
        }
        if let Some(answer) = self.is_ckan(&client, &raw.url).await? {
            return Ok(Some(answer));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::RawUrl;
    use crate::resolvers::Resolve;

    fn question(url: &str) -> Repo {
        RawUrl { url: Url::parse(url).unwrap() }.into()
    }

    #[tokio::test]
    async fn nothing_detected_on_a_plain_host() {
        let mut server = mockito::Server::new_async().await;
        // Every probe 404s
        server.mock("GET", mockito::Matcher::Any).with_status(404).create_async().await;

        let answer = FeatureDetectResolver
            .resolve(&question(&format!("{}/something", server.url())))
            .await
            .unwrap();
        assert_eq!(answer, None);
    }

    #[tokio::test]
    async fn dataverse_version_endpoint_identifies_the_installation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/info/version")
            .with_status(200)
            .with_body(r#"{"status": "OK", "data": {"version": "6.3", "build": "1"}}"#)
            .create_async()
            .await;

        let url = format!("{}/dataset.xhtml?persistentId=doi:10.70122/FK2/MBQA9G", server.url());
        let answer =
            FeatureDetectResolver.resolve(&question(&url)).await.unwrap().unwrap();

        assert_eq!(
            answer,
            Answer::MaybeExists(
                DataverseUrl {
                    installation: Url::parse(&format!("{}/", server.url())).unwrap(),
                    url: Url::parse(&url).unwrap(),
                }
                .into()
            )
        );
    }

    #[tokio::test]
    async fn gitlab_oidc_claim_identifies_gitlab() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/.well-known/openid-configuration")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "issuer": server.url(),
                    "claims_supported": ["sub", "iss", GITLAB_OIDC_CLAIM]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let url = format!("{}/inkscape/inkscape", server.url());
        let answer =
            FeatureDetectResolver.resolve(&question(&url)).await.unwrap().unwrap();
        assert!(matches!(answer, Answer::MaybeExists(Repo::GitLabUrl(_))));
    }

    #[tokio::test]
    async fn non_gitlab_oidc_documents_do_not_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/.well-known/openid-configuration")
            .with_status(200)
            .with_body(r#"{"issuer": "x", "claims_supported": ["sub", "iss"]}"#)
            .create_async()
            .await;

        let answer = FeatureDetectResolver
            .resolve(&question(&format!("{}/whatever", server.url())))
            .await
            .unwrap();
        assert_eq!(answer, None);
    }

    #[tokio::test]
    async fn smart_http_discovery_identifies_git() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/kvm/kvm.git/info/refs")
            .match_query(mockito::Matcher::UrlEncoded(
                "service".into(),
                "git-upload-pack".into(),
            ))
            .with_status(200)
            .with_body("001e# service=git-upload-pack\n")
            .create_async()
            .await;

        let url = format!("{}/kvm/kvm.git/", server.url());
        let answer =
            FeatureDetectResolver.resolve(&question(&url)).await.unwrap().unwrap();
        assert_eq!(
            answer,
            Answer::Exists(Git { repo: url.clone(), r#ref: "HEAD".into() }.into())
        );
    }

    #[tokio::test]
    async fn dataverse_wins_over_git_on_the_same_host() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/info/version")
            .with_status(200)
            .with_body(r#"{"status": "OK", "data": {"version": "6.3"}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repo/info/refs")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .create_async()
            .await;

        let answer = FeatureDetectResolver
            .resolve(&question(&format!("{}/repo", server.url())))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(answer, Answer::MaybeExists(Repo::DataverseUrl(_))));
    }

    #[tokio::test]
    async fn ckan_dataset_paths_probe_the_status_api() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/3/action/status_show")
            .with_status(200)
            .with_body(r#"{"help": "...", "success": true, "result": {"ckan_version": "2.10"}}"#)
            .create_async()
            .await;

        let url = format!(
            "{}/dataset/cumulative-provisional-counts-of-deaths-by-sex-race-and-age",
            server.url()
        );
        let answer =
            FeatureDetectResolver.resolve(&question(&url)).await.unwrap().unwrap();

        assert_eq!(
            answer,
            Answer::MaybeExists(
                CkanDataset {
                    installation_url: Url::parse(&server.url()).unwrap(),
                    dataset_id: "cumulative-provisional-counts-of-deaths-by-sex-race-and-age"
                        .into(),
                }
                .into()
            )
        );
    }

    #[tokio::test]
    async fn non_http_schemes_decline() {
        let answer =
            FeatureDetectResolver.resolve(&question("doi:10.1234/abcd")).await.unwrap();
        assert_eq!(answer, None);
    }
}
