//! Descriptor catalog for the resolver pipeline.
//!
//! Every question the pipeline can be asked and every answer it can produce
//! is one of the descriptor types in this module, collected into the sealed
//! [`Repo`] union. Descriptors are pure values: they are produced by
//! resolvers (or the initial URL parse), never mutated, and hold no external
//! resources.
//!
//! Each variant carries an immutability property (see [`Repo::immutable`]).
//! An immutable descriptor identifies content that is guaranteed not to
//! change out from under us: a git commit SHA, a Zenodo record, a Figshare
//! article pinned to a version, a content-hashed Drive folder.

pub mod answer;
pub mod serialize;

pub use answer::Answer;

use serde::Serialize;
use url::Url;

/// A parsed but not yet classified URL. The entry point of every string
/// question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawUrl {
    pub url: Url,
}

/// A URL known to live under a GitHub installation. Not necessarily a
/// repository URL - it can point at anything on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitHubUrl {
    pub installation: Url,
    pub url: Url,
}

/// A URL known to live under a GitLab installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitLabUrl {
    pub installation: Url,
    pub url: Url,
}

/// A URL known to live under a Gist installation. Gists are cloneable git
/// repositories, but the URL can also point at revisions or user pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GistUrl {
    pub installation: Url,
    pub url: Url,
}

/// A URL under a Zenodo / Invenio installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZenodoUrl {
    pub installation: Url,
    pub url: Url,
}

/// A concrete Figshare deployment: the public site plus its v2 API base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigshareInstallation {
    pub url: Url,
    #[serde(rename = "apiUrl")]
    pub api_url: Url,
}

/// A URL under a Figshare installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigshareUrl {
    pub installation: FigshareInstallation,
    pub url: Url,
}

/// A URL under a Dataverse installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataverseUrl {
    pub installation: Url,
    pub url: Url,
}

/// A DOI or handle that has been dereferenced into its target URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doi {
    pub url: Url,
}

/// A git repository plus a symbolic ref (branch, tag, "HEAD", or something
/// SHA-shaped). Mutable: the ref can move.
///
/// The repo locator is deliberately a string, not a [`Url`] - scp-like
/// `git@host:path` remotes and `ssh://` forms must reach the git binary
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Git {
    pub repo: String,
    pub r#ref: String,
}

/// Same shape as [`Git`], but fully resolved: the repository is known to be
/// reachable and the ref is a 40-hex commit SHA (or assumed to be one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImmutableGit {
    pub repo: String,
    pub r#ref: String,
}

/// A GitHub pull request, further resolvable into [`Git`] at its head ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitHubPr {
    pub installation: Url,
    pub url: Url,
}

/// An artifact uploaded by a GitHub Actions run. Artifacts never change
/// after upload (they do expire, which is an existence question, not a
/// mutability one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitHubActionArtifact {
    pub installation: Url,
    pub account: String,
    pub repo: String,
    pub artifact_id: u64,
}

/// A dataset in a Dataverse installation, identified by persistent id.
/// Dataverse datasets are versioned elsewhere, so this is mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataverseDataset {
    #[serde(rename = "installationUrl")]
    pub installation_url: Url,
    #[serde(rename = "persistentId")]
    pub persistent_id: String,
}

/// A record in a Zenodo / Invenio installation. Records are immutable: a
/// new version gets its own record id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZenodoDataset {
    #[serde(rename = "installationUrl")]
    pub installation_url: Url,
    #[serde(rename = "recordId")]
    pub record_id: String,
}

/// A Figshare article, optionally pinned to a version. Without a version we
/// don't know what we'll get tomorrow, so this is mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FigshareDataset {
    pub installation: FigshareInstallation,
    #[serde(rename = "articleId")]
    pub article_id: u64,
    pub version: Option<u64>,
}

/// A Figshare article pinned to a concrete published version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImmutableFigshareDataset {
    pub installation: FigshareInstallation,
    #[serde(rename = "articleId")]
    pub article_id: u64,
    pub version: u64,
}

/// A Hydroshare resource. Mutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydroshareDataset {
    pub resource_id: String,
}

/// A dataset in a CKAN installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CkanDataset {
    #[serde(rename = "installationUrl")]
    pub installation_url: Url,
    pub dataset_id: String,
}

/// A Google Drive folder by id. Contents can change at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleDriveFolder {
    pub id: String,
}

/// A Google Drive folder pinned by a hash over its recursive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImmutableGoogleDriveFolder {
    pub id: String,
    pub dir_hash: String,
}

/// A directly downloadable archive. Immutable only when the server gave us
/// a stable etag to pin it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressedFile {
    pub url: Url,
    pub mime_type: String,
    pub etag: Option<String>,
}

macro_rules! descriptors {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Sealed tagged union over every descriptor variant.
        ///
        /// Resolvers and fetchers declare which [`RepoKind`]s they accept;
        /// the dispatch registries key on the discriminant of the value
        /// flowing through the pipeline.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Repo {
            $($variant($variant),)+
        }

        /// Fieldless discriminant of [`Repo`]. Doubles as the stable
        /// descriptor name in serialized answers.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RepoKind {
            $($variant,)+
        }

        impl Repo {
            /// The discriminant of this descriptor.
            #[must_use]
            pub const fn kind(&self) -> RepoKind {
                match self {
                    $(Repo::$variant(_) => RepoKind::$variant,)+
                }
            }
        }

        impl RepoKind {
            /// Stable descriptor name, used in canonical JSON and error
            /// messages.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(RepoKind::$variant => $name,)+
                }
            }
        }

        impl Serialize for Repo {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $(Repo::$variant(inner) => inner.serialize(serializer),)+
                }
            }
        }

        $(
            impl From<$variant> for Repo {
                fn from(value: $variant) -> Self {
                    Repo::$variant(value)
                }
            }
        )+
    };
}

descriptors! {
    RawUrl => "RawURL",
    GitHubUrl => "GitHubURL",
    GitLabUrl => "GitLabURL",
    GistUrl => "GistURL",
    ZenodoUrl => "ZenodoURL",
    FigshareUrl => "FigshareURL",
    DataverseUrl => "DataverseURL",
    Doi => "Doi",
    Git => "Git",
    ImmutableGit => "ImmutableGit",
    GitHubPr => "GitHubPR",
    GitHubActionArtifact => "GitHubActionArtifact",
    DataverseDataset => "DataverseDataset",
    ZenodoDataset => "ZenodoDataset",
    FigshareDataset => "FigshareDataset",
    ImmutableFigshareDataset => "ImmutableFigshareDataset",
    HydroshareDataset => "HydroshareDataset",
    CkanDataset => "CKANDataset",
    GoogleDriveFolder => "GoogleDriveFolder",
    ImmutableGoogleDriveFolder => "ImmutableGoogleDriveFolder",
    CompressedFile => "CompressedFile",
}

impl Repo {
    /// Whether this descriptor identifies content guaranteed not to change.
    ///
    /// Immutable descriptors are potential terminals: the pipeline never
    /// needs to refine them further. Every variant's immutability is a
    /// constant of the variant, except [`CompressedFile`], which is pinned
    /// only when the server handed us an etag.
    #[must_use]
    pub fn immutable(&self) -> bool {
        match self {
            Repo::ImmutableGit(_)
            | Repo::ZenodoDataset(_)
            | Repo::ImmutableFigshareDataset(_)
            | Repo::ImmutableGoogleDriveFolder(_)
            | Repo::GitHubActionArtifact(_) => true,
            Repo::CompressedFile(file) => file.etag.is_some(),
            _ => false,
        }
    }
}

impl std::fmt::Display for Repo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.kind().name();
        match self {
            Repo::RawUrl(v) => write!(f, "{name}({})", v.url),
            Repo::GitHubUrl(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::GitLabUrl(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::GistUrl(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::ZenodoUrl(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::FigshareUrl(v) => write!(f, "{name}({}, {})", v.installation.url, v.url),
            Repo::DataverseUrl(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::Doi(v) => write!(f, "{name}({})", v.url),
            Repo::Git(v) => write!(f, "{name}({}, {})", v.repo, v.r#ref),
            Repo::ImmutableGit(v) => write!(f, "{name}({}, {})", v.repo, v.r#ref),
            Repo::GitHubPr(v) => write!(f, "{name}({}, {})", v.installation, v.url),
            Repo::GitHubActionArtifact(v) => {
                write!(f, "{name}({}, {}/{}, {})", v.installation, v.account, v.repo, v.artifact_id)
            }
            Repo::DataverseDataset(v) => {
                write!(f, "{name}({}, {})", v.installation_url, v.persistent_id)
            }
            Repo::ZenodoDataset(v) => write!(f, "{name}({}, {})", v.installation_url, v.record_id),
            Repo::FigshareDataset(v) => match v.version {
                Some(version) => {
                    write!(f, "{name}({}, {}, {version})", v.installation.url, v.article_id)
                }
                None => write!(f, "{name}({}, {})", v.installation.url, v.article_id),
            },
            Repo::ImmutableFigshareDataset(v) => {
                write!(f, "{name}({}, {}, {})", v.installation.url, v.article_id, v.version)
            }
            Repo::HydroshareDataset(v) => write!(f, "{name}({})", v.resource_id),
            Repo::CkanDataset(v) => write!(f, "{name}({}, {})", v.installation_url, v.dataset_id),
            Repo::GoogleDriveFolder(v) => write!(f, "{name}({})", v.id),
            Repo::ImmutableGoogleDriveFolder(v) => write!(f, "{name}({}, {})", v.id, v.dir_hash),
            Repo::CompressedFile(v) => match &v.etag {
                Some(etag) => write!(f, "{name}({}, {}, {etag})", v.url, v.mime_type),
                None => write!(f, "{name}({}, {})", v.url, v.mime_type),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn kind_names_are_stable() {
        let repo: Repo = GitHubUrl {
            installation: url("https://github.com"),
            url: url("https://github.com/a/b"),
        }
        .into();
        assert_eq!(repo.kind().name(), "GitHubURL");
        assert_eq!(RepoKind::CkanDataset.name(), "CKANDataset");
        assert_eq!(RepoKind::GitHubPr.name(), "GitHubPR");
        assert_eq!(RepoKind::ImmutableGit.name(), "ImmutableGit");
    }

    #[test]
    fn immutability_follows_the_variant() {
        let mutable: Vec<Repo> = vec![
            Git { repo: "https://example.com/r".into(), r#ref: "HEAD".into() }.into(),
            GoogleDriveFolder { id: "abc".into() }.into(),
            FigshareDataset {
                installation: figshare(),
                article_id: 9_782_777,
                version: Some(3),
            }
            .into(),
            HydroshareDataset { resource_id: "x".into() }.into(),
        ];
        for repo in mutable {
            assert!(!repo.immutable(), "{repo} should be mutable");
        }

        let immutable: Vec<Repo> = vec![
            ImmutableGit {
                repo: "https://example.com/r".into(),
                r#ref: "ada2170a2181ae1760d85eab74e5264d0c6bb67f".into(),
            }
            .into(),
            ZenodoDataset {
                installation_url: url("https://zenodo.org/"),
                record_id: "14007206".into(),
            }
            .into(),
            ImmutableFigshareDataset { installation: figshare(), article_id: 1, version: 3 }.into(),
            ImmutableGoogleDriveFolder { id: "abc".into(), dir_hash: "h".into() }.into(),
            GitHubActionArtifact {
                installation: url("https://github.com"),
                account: "a".into(),
                repo: "r".into(),
                artifact_id: 5,
            }
            .into(),
        ];
        for repo in immutable {
            assert!(repo.immutable(), "{repo} should be immutable");
        }
    }

    #[test]
    fn compressed_file_is_pinned_by_etag() {
        let with_etag: Repo = CompressedFile {
            url: url("https://example.com/data.zip"),
            mime_type: "application/zip".into(),
            etag: Some("\"abc123\"".into()),
        }
        .into();
        let without_etag: Repo = CompressedFile {
            url: url("https://example.com/data.zip"),
            mime_type: "application/zip".into(),
            etag: None,
        }
        .into();
        assert!(with_etag.immutable());
        assert!(!without_etag.immutable());
    }

    #[test]
    fn display_is_human_readable() {
        let repo: Repo = Git {
            repo: "https://github.com/pyOpenSci/pyos-package-template".into(),
            r#ref: "HEAD".into(),
        }
        .into();
        assert_eq!(
            repo.to_string(),
            "Git(https://github.com/pyOpenSci/pyos-package-template, HEAD)"
        );
    }

    fn figshare() -> FigshareInstallation {
        FigshareInstallation {
            url: url("https://figshare.com/"),
            api_url: url("https://api.figshare.com/v2/"),
        }
    }
}
