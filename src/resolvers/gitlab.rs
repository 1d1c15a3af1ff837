//! GitLab URL-shape parsing.
//!
//! GitLab nests repositories arbitrarily deep (`group/subgroup/project`) and
//! marks non-repo routes with a `-` path segment, so parsing is shaped
//! around finding that marker.

use anyhow::Result;
use async_trait::async_trait;
use url::Url;

use crate::repos::{Answer, Git, Repo, RepoKind};

pub struct GitLabResolver;

fn path_segments(url: &Url) -> Vec<&str> {
    url.path().split('/').filter(|part| !part.trim().is_empty()).collect()
}

#[async_trait]
impl super::Resolve for GitLabResolver {
    fn accepted_kinds(&self) -> &'static [RepoKind] {
        &[RepoKind::GitLabUrl]
    }

    async fn resolve(&self, question: &Repo) -> Result<Option<Answer>> {
        let Repo::GitLabUrl(gitlab_url) = question else {
            return Ok(None);
        };
        let url = &gitlab_url.url;
        let parts = path_segments(url);

        if matches!(parts.len(), 2 | 3) {
            // <ns>/<repo> or <group>/<ns>/<repo>
            let mut repo = url.clone();
            repo.set_query(None);
            repo.set_fragment(None);
            return Ok(Some(Answer::MaybeExists(
                Git { repo: repo.to_string(), r#ref: "HEAD".into() }.into(),
            )));
        }

        let Some(dash_index) = parts.iter().position(|part| *part == "-") else {
            return Ok(None);
        };
        // GitLab has dashes in lots of URLs; only tree and blob routes name
        // a ref we can use
        if !matches!(parts.get(dash_index + 1), Some(&"tree" | &"blob")) {
            return Ok(None);
        }
        let Some(reference) = parts.get(dash_index + 2) else {
            return Ok(None);
        };

        let mut repo = url.clone();
        repo.set_path(&parts[..dash_index].join("/"));
        repo.set_query(None);
        repo.set_fragment(None);
        Ok(Some(Answer::MaybeExists(
            Git { repo: repo.to_string(), r#ref: (*reference).to_string() }.into(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolvers::Resolve;

    fn question(url: &str) -> Repo {
        crate::repos::GitLabUrl {
            installation: Url::parse("https://gitlab.com").unwrap(),
            url: Url::parse(url).unwrap(),
        }
        .into()
    }

    #[tokio::test]
    async fn two_and_three_segment_paths_are_repos() {
        let answer = GitLabResolver
            .resolve(&question("https://gitlab.com/inkscape/inkscape"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            answer.repo().unwrap(),
            &Repo::from(Git {
                repo: "https://gitlab.com/inkscape/inkscape".into(),
                r#ref: "HEAD".into()
            })
        );

        let answer = GitLabResolver
            .resolve(&question("https://gitlab.com/fdroid/ci/images"))
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(answer, Answer::MaybeExists(Repo::Git(_))));
    }

    #[tokio::test]
    async fn tree_routes_split_on_the_dash_marker() {
        let answer = GitLabResolver
            .resolve(&question("https://gitlab.com/inkscape/inkscape/-/tree/1.3.x/share"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            answer.repo().unwrap(),
            &Repo::from(Git {
                repo: "https://gitlab.com/inkscape/inkscape".into(),
                r#ref: "1.3.x".into()
            })
        );
    }

    #[tokio::test]
    async fn non_tree_dash_routes_decline() {
        for url in [
            "https://gitlab.com/inkscape/inkscape/-/issues/123",
            "https://gitlab.com/inkscape/inkscape/-",
            "https://gitlab.com/inkscape/inkscape/-/tree",
        ] {
            assert_eq!(GitLabResolver.resolve(&question(url)).await.unwrap(), None, "{url}");
        }
    }

    #[tokio::test]
    async fn query_and_fragment_are_stripped() {
        let answer = GitLabResolver
            .resolve(&question("https://gitlab.com/inkscape/inkscape?tab=readme#usage"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            answer.repo().unwrap(),
            &Repo::from(Git {
                repo: "https://gitlab.com/inkscape/inkscape".into(),
                r#ref: "HEAD".into()
            })
        );
    }
}
