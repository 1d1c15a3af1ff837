//! The resolver pipeline: a dispatch registry over provider resolvers and
//! the loop that drives a question through them.
//!
//! # Dispatch
//!
//! Every resolver declares which descriptor kinds it accepts through
//! [`Resolve::accepted_kinds`]. At first use, the registry maps each kind to
//! the resolvers accepting it, *in master-list order* - that order is part
//! of the design. Multiple resolvers on one kind express either a
//! preference chain (catalog lookup before feature detection) or
//! progressive refinement (`Git` into `ImmutableGit`).
//!
//! # The loop
//!
//! Each round asks the applicable resolvers in order and keeps the first
//! non-null answer. Recursion feeds the answer's descriptor back in as the
//! next question and stops when no resolver applies, when a resolver proves
//! the referent absent, or when recursion is off. Resolving the final
//! descriptor of a recursive answer again yields nothing new - the pipeline
//! is a fixed point.

pub mod dataverse;
pub mod doi;
pub mod drive;
pub mod feature_detect;
pub mod figshare;
pub mod github;
pub mod gitlab;
pub mod giturl;
pub mod immutable_git;
pub mod wellknown;
pub mod zenodo;

use std::collections::HashMap;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::repos::{Answer, RawUrl, Repo, RepoKind};

pub use dataverse::DataverseResolver;
pub use doi::DoiResolver;
pub use drive::GoogleDriveFolderResolver;
pub use feature_detect::FeatureDetectResolver;
pub use figshare::{FigshareResolver, ImmutableFigshareResolver};
pub use github::{GistResolver, GitHubPrResolver, GitHubResolver};
pub use gitlab::GitLabResolver;
pub use giturl::GitUrlResolver;
pub use immutable_git::ImmutableGitResolver;
pub use wellknown::WellKnownProvidersResolver;
pub use zenodo::ZenodoResolver;

/// One provider resolver.
///
/// `resolve` answers `Ok(None)` when it does not recognize the question -
/// that is not an error, it just hands the question to the next resolver in
/// line. Resolvers are stateless after construction and live as singletons
/// in the registry.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// The descriptor kinds this resolver accepts, declared statically so
    /// the registry can be built without ever invoking the resolver.
    fn accepted_kinds(&self) -> &'static [RepoKind];

    /// Try to answer the question, or decline with `None`.
    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>>;
}

/// Master resolver list. Order defines per-kind precedence.
static ALL_RESOLVERS: LazyLock<Vec<Box<dyn Resolve>>> = LazyLock::new(|| {
    vec![
        Box::new(WellKnownProvidersResolver),
        Box::new(GitHubResolver),
        Box::new(GitHubPrResolver::new()),
        Box::new(GistResolver),
        Box::new(GoogleDriveFolderResolver),
        Box::new(GitUrlResolver),
        Box::new(GitLabResolver),
        Box::new(DoiResolver::new()),
        Box::new(ZenodoResolver),
        Box::new(FigshareResolver),
        Box::new(ImmutableFigshareResolver),
        Box::new(DataverseResolver),
        Box::new(ImmutableGitResolver),
        Box::new(FeatureDetectResolver),
    ]
});

/// Descriptor kind -> indexes into [`ALL_RESOLVERS`], in master order.
/// Read-only after construction.
static RESOLVERS_BY_KIND: LazyLock<HashMap<RepoKind, Vec<usize>>> = LazyLock::new(|| {
    let mut registry: HashMap<RepoKind, Vec<usize>> = HashMap::new();
    for (index, resolver) in ALL_RESOLVERS.iter().enumerate() {
        for kind in resolver.accepted_kinds() {
            registry.entry(*kind).or_default().push(index);
        }
    }
    registry
});

/// Parse a string question into its initial descriptor.
///
/// Bare DOIs (`10.xxxx/yyyy`) are accepted for convenience with an implied
/// `doi:` scheme, since a strict URL parse has nowhere to put them.
/// Anything else unparseable yields `None`, which resolves to an empty
/// answer list rather than an error.
#[must_use]
pub fn parse_question(question: &str) -> Option<Repo> {
    match Url::parse(question) {
        Ok(url) => Some(RawUrl { url }.into()),
        Err(url::ParseError::RelativeUrlWithoutBase) if question.starts_with("10.") => {
            Url::parse(&format!("doi:{question}")).ok().map(|url| RawUrl { url }.into())
        }
        Err(_) => None,
    }
}

/// Resolve a string question (URL or DOI).
pub async fn resolve(question: &str, recursive: bool) -> Result<Vec<Answer>> {
    match parse_question(question) {
        Some(repo) => resolve_repo(repo, recursive).await,
        None => Ok(Vec::new()),
    }
}

/// Resolve a descriptor question through the registry.
///
/// Answers are appended strictly in resolution order; each answer's
/// descriptor is the exact input to the next round.
pub async fn resolve_repo(question: Repo, recursive: bool) -> Result<Vec<Answer>> {
    let mut answers = Vec::new();
    let mut question = question;

    loop {
        let Some(applicable) = RESOLVERS_BY_KIND.get(&question.kind()) else {
            // No resolver for this kind: a terminal descriptor
            break;
        };
        debug!(
            "resolving {} with {} applicable resolver(s)",
            question,
            applicable.len()
        );

        let mut round_answer = None;
        for &index in applicable {
            if let Some(answer) = ALL_RESOLVERS[index].resolve(&question).await? {
                // First non-null answer wins the round
                round_answer = Some(answer);
                break;
            }
        }

        let Some(answer) = round_answer else {
            break;
        };
        debug!("answer: {answer}");
        answers.push(answer);

        if !recursive {
            break;
        }
        match answers.last().expect("an answer was just appended") {
            Answer::DoesNotExist { .. } => break,
            Answer::Exists(repo) | Answer::MaybeExists(repo) => {
                question = repo.clone();
            }
        }
    }

    Ok(answers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::{Doi, Git, GitHubUrl, ImmutableGit};

    #[test]
    fn registry_orders_raw_url_resolvers_by_specificity() {
        let raw_url_resolvers: Vec<&'static [RepoKind]> = RESOLVERS_BY_KIND[&RepoKind::RawUrl]
            .iter()
            .map(|&index| ALL_RESOLVERS[index].accepted_kinds())
            .collect();
        // well-known catalog first, feature detection dead last
        assert_eq!(raw_url_resolvers.len(), 4);
        assert!(raw_url_resolvers[0].contains(&RepoKind::Doi)); // the classifier also takes Doi
        assert_eq!(
            RESOLVERS_BY_KIND[&RepoKind::RawUrl].last(),
            Some(&(ALL_RESOLVERS.len() - 1))
        );
    }

    #[test]
    fn terminal_kinds_have_no_resolvers() {
        for kind in [
            RepoKind::ImmutableGit,
            RepoKind::ZenodoDataset,
            RepoKind::DataverseDataset,
            RepoKind::ImmutableFigshareDataset,
            RepoKind::HydroshareDataset,
            RepoKind::CkanDataset,
            RepoKind::ImmutableGoogleDriveFolder,
            RepoKind::GitHubActionArtifact,
            RepoKind::CompressedFile,
        ] {
            assert!(!RESOLVERS_BY_KIND.contains_key(&kind), "{} should be terminal", kind.name());
        }
    }

    #[test]
    fn question_parsing_accepts_urls_and_bare_dois() {
        assert!(matches!(
            parse_question("https://github.com/a/b"),
            Some(Repo::RawUrl(_))
        ));
        let Some(Repo::RawUrl(raw)) = parse_question("10.7910/DVN/6ZXAGT") else {
            panic!("bare DOI should parse");
        };
        assert_eq!(raw.url.scheme(), "doi");
        assert_eq!(raw.url.path(), "10.7910/DVN/6ZXAGT");
        // Handles without the DOI prefix are not given the convenience
        assert_eq!(parse_question("11529/10016"), None);
        assert_eq!(parse_question("not a url at all"), None);
    }

    #[tokio::test]
    async fn unresolvable_strings_yield_empty_answers() {
        assert_eq!(resolve("11529/10016", true).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn github_url_classifies_in_one_non_recursive_round() {
        let answers =
            resolve("https://github.com/pyOpenSci/pyos-package-template", false).await.unwrap();
        assert_eq!(
            answers,
            vec![Answer::MaybeExists(
                GitHubUrl {
                    installation: Url::parse("https://github.com").unwrap(),
                    url: Url::parse("https://github.com/pyOpenSci/pyos-package-template").unwrap(),
                }
                .into()
            )]
        );
    }

    #[tokio::test]
    async fn github_non_repo_urls_resolve_to_a_single_dead_end() {
        // The classifier recognizes the host, the shape parser declines, and
        // with recursion the GitHubURL answer has nowhere further to go
        let answers = resolve("https://github.com/pyOpenSci", true).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0], Answer::MaybeExists(Repo::GitHubUrl(_))));
    }

    #[tokio::test]
    async fn git_file_urls_pin_to_a_sha_end_to_end() {
        // Fully offline recursion: git+file URL -> Git -> ImmutableGit
        let (_guard, url, sha) = local_repo();

        let answers = resolve(&format!("git+{url}"), true).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(
            answers[0],
            Answer::MaybeExists(Git { repo: url.clone(), r#ref: "HEAD".into() }.into())
        );
        assert_eq!(
            answers[1],
            Answer::Exists(ImmutableGit { repo: url.clone(), r#ref: sha.clone() }.into())
        );

        // Idempotence: the final descriptor is a fixed point
        let again =
            resolve_repo(ImmutableGit { repo: url, r#ref: sha }.into(), true).await.unwrap();
        assert_eq!(again, Vec::new());
    }

    #[tokio::test]
    async fn does_not_exist_is_the_last_answer() {
        let (_guard, url, _sha) = local_repo();

        let answers = resolve_repo(
            Git { repo: url.clone(), r#ref: "no-such-branch".into() }.into(),
            true,
        )
        .await
        .unwrap();
        assert_eq!(answers.len(), 1);
        assert!(answers[0].is_does_not_exist());
    }

    #[tokio::test]
    async fn non_recursive_stops_after_one_round() {
        let (_guard, url, _sha) = local_repo();

        let answers =
            resolve_repo(Git { repo: url.clone(), r#ref: "main".into() }.into(), false)
                .await
                .unwrap();
        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0], Answer::Exists(Repo::ImmutableGit(_))));
    }

    #[tokio::test]
    async fn answers_chain_question_to_question() {
        let (_guard, url, _sha) = local_repo();

        let answers = resolve(&format!("git+{url}@main"), true).await.unwrap();
        assert!(answers.len() >= 2);
        for pair in answers.windows(2) {
            let previous = pair[0].repo().expect("non-terminal answers carry descriptors");
            // The next answer must have been produced from this descriptor's
            // kind - Git refines into ImmutableGit here
            assert_eq!(previous.kind(), RepoKind::Git);
            assert!(matches!(pair[1], Answer::Exists(Repo::ImmutableGit(_))));
        }
    }

    #[tokio::test]
    async fn doi_descriptor_reclassifies_through_wellknown() {
        // A Doi wrapping a Zenodo record URL classifies without network I/O
        let answers = resolve_repo(
            Doi { url: Url::parse("https://zenodo.org/records/14007206").unwrap() }.into(),
            false,
        )
        .await
        .unwrap();
        assert_eq!(answers.len(), 1);
        assert!(matches!(answers[0], Answer::MaybeExists(Repo::ZenodoUrl(_))));
    }

    /// Throwaway local repository with one commit on `main`.
    fn local_repo() -> (tempfile::TempDir, String, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path();
        let run = |args: &[&str]| {
            let output = std::process::Command::new("git")
                .args(args)
                .current_dir(path)
                .env("GIT_AUTHOR_NAME", "test")
                .env("GIT_AUTHOR_EMAIL", "test@example.com")
                .env("GIT_COMMITTER_NAME", "test")
                .env("GIT_COMMITTER_EMAIL", "test@example.com")
                .output()
                .unwrap();
            assert!(
                output.status.success(),
                "git {args:?}: {}",
                String::from_utf8_lossy(&output.stderr)
            );
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };
        run(&["init", "--initial-branch=main", "."]);
        std::fs::write(path.join("README.md"), "hello").unwrap();
        run(&["add", "."]);
        run(&["commit", "-m", "initial"]);
        let sha = run(&["rev-parse", "HEAD"]);
        let url = format!("file://{}", path.display());
        (dir, url, sha)
    }
}
