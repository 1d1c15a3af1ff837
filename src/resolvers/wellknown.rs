//! Classifier for URLs under well-known provider installations.
//!
//! Pure string matching - no network I/O ever happens here. A URL (raw or
//! freshly dereferenced from a DOI) is matched against embedded catalogs of
//! known installations; the first catalog to match decides the provider.
//! URLs nobody recognizes fall through to the git-URL parser, the DOI
//! resolver, and eventually feature detection.

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::repos::{
    Answer, DataverseUrl, FigshareInstallation, FigshareUrl, GistUrl, GitHubUrl, GitLabUrl,
    GoogleDriveFolder, HydroshareDataset, Repo, RepoKind, ZenodoUrl,
};

use super::Resolve;

/// Known Dataverse installations, embedded at build time. The list drifts as
/// installations come and go; refreshing it is a release activity.
static DATAVERSE_INSTALLATIONS: LazyLock<Vec<Url>> = LazyLock::new(|| {
    #[derive(Deserialize)]
    struct Catalog {
        installations: Vec<Entry>,
    }
    #[derive(Deserialize)]
    struct Entry {
        url: Url,
    }

    let catalog: Catalog = serde_json::from_str(include_str!("dataverse.json"))
        .expect("embedded dataverse catalog is valid JSON");
    catalog.installations.into_iter().map(|entry| entry.url).collect()
});

static ZENODO_INSTALLATIONS: LazyLock<Vec<Url>> = LazyLock::new(|| {
    ["https://sandbox.zenodo.org/", "https://zenodo.org/", "https://data.caltech.edu/"]
        .iter()
        .map(|u| Url::parse(u).expect("static zenodo installation URL is valid"))
        .collect()
});

static FIGSHARE_INSTALLATIONS: LazyLock<Vec<FigshareInstallation>> = LazyLock::new(|| {
    vec![FigshareInstallation {
        url: Url::parse("https://figshare.com/").expect("static figshare URL is valid"),
        api_url: Url::parse("https://api.figshare.com/v2/").expect("static figshare URL is valid"),
    }]
});

/// Resolver that classifies raw URLs against the well-known catalogs.
pub struct WellKnownProvidersResolver;

/// Hosts match case-insensitively and schemes are intentionally ignored, so
/// `http` and `https` forms of an installation interchange.
fn under_installation(installation: &Url, question: &Url) -> bool {
    installation.host_str() == question.host_str()
        && question.path().starts_with(installation.path())
}

/// The question's path with the installation's base path stripped.
fn remainder<'a>(installation: &Url, question: &'a Url) -> &'a str {
    &question.path()[installation.path().len()..]
}

fn path_segments(url: &Url) -> Vec<&str> {
    url.path().split('/').filter(|part| !part.trim().is_empty()).collect()
}

impl WellKnownProvidersResolver {
    fn detect_github(&self, question: &Url) -> Option<Repo> {
        // git+<scheme> URLs belong to the git-URL parser
        if !matches!(question.scheme(), "http" | "https") {
            return None;
        }
        match question.host_str() {
            Some("github.com" | "www.github.com") => Some(
                GitHubUrl {
                    installation: Url::parse("https://github.com").expect("static URL is valid"),
                    url: question.clone(),
                }
                .into(),
            ),
            _ => None,
        }
    }

    fn detect_gist(&self, question: &Url) -> Option<Repo> {
        if !matches!(question.scheme(), "http" | "https") {
            return None;
        }
        match question.host_str() {
            Some("gist.github.com") => Some(
                GistUrl {
                    installation: Url::parse("https://gist.github.com")
                        .expect("static URL is valid"),
                    url: question.clone(),
                }
                .into(),
            ),
            _ => None,
        }
    }

    fn detect_gitlab(&self, question: &Url) -> Option<Repo> {
        if !matches!(question.scheme(), "http" | "https") {
            return None;
        }
        match question.host_str() {
            Some("gitlab.com" | "www.gitlab.com") => Some(
                GitLabUrl {
                    installation: Url::parse("https://gitlab.com").expect("static URL is valid"),
                    url: question.clone(),
                }
                .into(),
            ),
            _ => None,
        }
    }

    fn detect_google_drive(&self, question: &Url) -> Option<Repo> {
        if question.host_str() != Some("drive.google.com") {
            return None;
        }
        // Folder URLs look like /drive/folders/<id> or /drive/u/0/folders/<id>
        let segments = path_segments(question);
        let folders_at = segments.iter().position(|segment| *segment == "folders")?;
        let id = segments.get(folders_at + 1)?;
        Some(GoogleDriveFolder { id: (*id).to_string() }.into())
    }

    fn detect_hydroshare(&self, question: &Url) -> Option<Repo> {
        if !matches!(question.host_str(), Some("www.hydroshare.org" | "hydroshare.org")) {
            return None;
        }
        let segments = path_segments(question);
        match segments.as_slice() {
            ["resource", resource_id, ..] => {
                Some(HydroshareDataset { resource_id: (*resource_id).to_string() }.into())
            }
            _ => None,
        }
    }

    fn detect_dataverse(&self, question: &Url) -> Option<Repo> {
        let installation = DATAVERSE_INSTALLATIONS
            .iter()
            .find(|installation| under_installation(installation, question))?;
        Some(DataverseUrl { installation: installation.clone(), url: question.clone() }.into())
    }

    fn detect_zenodo(&self, question: &Url) -> Option<Repo> {
        let installation = ZENODO_INSTALLATIONS.iter().find(|installation| {
            under_installation(installation, question) && {
                let rest = remainder(installation, question);
                rest.starts_with("record/") || rest.starts_with("records/") || rest.starts_with("doi/")
            }
        })?;
        Some(ZenodoUrl { installation: installation.clone(), url: question.clone() }.into())
    }

    fn detect_figshare(&self, question: &Url) -> Option<Repo> {
        let installation = FIGSHARE_INSTALLATIONS.iter().find(|installation| {
            under_installation(&installation.url, question) && {
                let rest = remainder(&installation.url, question);
                rest.starts_with("articles/") || rest.starts_with("account/articles/")
            }
        })?;
        Some(FigshareUrl { installation: installation.clone(), url: question.clone() }.into())
    }

    fn classify(&self, question: &Url) -> Option<Repo> {
        let detectors: [fn(&Self, &Url) -> Option<Repo>; 8] = [
            Self::detect_github,
            Self::detect_gist,
            Self::detect_gitlab,
            Self::detect_google_drive,
            Self::detect_hydroshare,
            Self::detect_dataverse,
            Self::detect_zenodo,
            Self::detect_figshare,
        ];
        detectors.iter().find_map(|detect| detect(self, question))
    }
}

#[async_trait]
impl Resolve for WellKnownProvidersResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::RawUrl, RepoKind::Doi]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let url = match question {
            Repo::RawUrl(raw) => &raw.url,
            Repo::Doi(doi) => &doi.url,
            _ => return Ok(None),
        };
        Ok(self.classify(url).map(Answer::MaybeExists))
    }
}
