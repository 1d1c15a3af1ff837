//! Raw git URL parsing, pip-style.
//!
//! Recognizes the VCS scheme convention pip uses (`git+https://...@ref`):
//! the `git+` prefix selects the transport, and an `@` in the path splits
//! off the ref. Never probes the remote - that is the immutable-git
//! resolver's job on the next round.

use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::repos::{Answer, Git, Repo, RepoKind};

pub struct GitUrlResolver;

#[async_trait]
impl super::Resolve for GitUrlResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::RawUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::RawUrl(raw) = question else {
            return Ok(None);
        };
        if !matches!(
            raw.url.scheme(),
            "git+https" | "git+ssh" | "git" | "git+file" | "git+http" | "git+git"
        ) {
            return Ok(None);
        }

        // `Url::set_scheme` refuses special<->non-special transitions, so
        // strip the prefix textually and re-parse
        let stripped = raw.url.as_str().strip_prefix("git+").unwrap_or(raw.url.as_str());
        let repo_url = Url::parse(stripped)
            .with_context(|| format!("{} is not a valid git URL", raw.url))?;

        let (repo, reference) = match repo_url.path().rsplit_once('@') {
            Some((path, reference)) => {
                let mut repo = repo_url.clone();
                repo.set_path(path);
                repo.set_query(None);
                repo.set_fragment(None);
                (repo.to_string(), reference.to_string())
            }
            None => (repo_url.to_string(), "HEAD".to_string()),
        };

        Ok(Some(Answer::MaybeExists(Git { repo, r#ref: reference }.into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::RawUrl;
    use crate::resolvers::Resolve;

    async fn parse(url: &str) -> Option<Answer> {
        let question: Repo = RawUrl { url: Url::parse(url).unwrap() }.into();
        GitUrlResolver.resolve(&question).await.unwrap()
    }

    #[tokio::test]
    async fn git_https_defaults_to_head() {
        assert_eq!(
            parse("git+https://github.com/ropensci/targets").await.unwrap(),
            Answer::MaybeExists(
                Git { repo: "https://github.com/ropensci/targets".into(), r#ref: "HEAD".into() }
                    .into()
            )
        );
    }

    #[tokio::test]
    async fn at_sign_in_the_path_splits_the_ref() {
        assert_eq!(
            parse("git+https://github.com/ropensci/targets@v1.2").await.unwrap(),
            Answer::MaybeExists(
                Git { repo: "https://github.com/ropensci/targets".into(), r#ref: "v1.2".into() }
                    .into()
            )
        );
    }

    #[tokio::test]
    async fn ssh_userinfo_is_not_mistaken_for_a_ref() {
        let answer = parse("git+ssh://git@github.com/org/repo").await.unwrap();
        assert_eq!(
            answer.repo().unwrap(),
            &Repo::from(Git { repo: "ssh://git@github.com/org/repo".into(), r#ref: "HEAD".into() })
        );
    }

    #[tokio::test]
    async fn bare_git_scheme_is_kept() {
        let answer = parse("git://git.kernel.org/pub/scm/git/git.git").await.unwrap();
        assert_eq!(
            answer.repo().unwrap(),
            &Repo::from(Git {
                repo: "git://git.kernel.org/pub/scm/git/git.git".into(),
                r#ref: "HEAD".into()
            })
        );
    }

    #[tokio::test]
    async fn plain_http_urls_decline() {
        assert_eq!(parse("https://github.com/ropensci/targets").await, None);
    }
}
