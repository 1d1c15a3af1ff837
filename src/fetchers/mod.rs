//! Fetchers: materialize a terminal descriptor into an output directory.
//!
//! Dispatch works exactly like the resolver registry: each fetcher declares
//! the descriptor kinds it consumes, and the first (only) fetcher for a
//! kind handles it. The output directory must exist and be empty at call
//! time; on failure it may contain partial contents - fetches are not
//! transactional.

pub mod artifact;
pub mod ckan;
pub mod compressed;
pub mod dataverse;
pub mod drive;
pub mod figshare;
pub mod git;
pub mod hydroshare;
pub mod zenodo;

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::repos::{Repo, RepoKind};

pub use artifact::GitHubActionArtifactFetcher;
pub use ckan::CkanFetcher;
pub use compressed::CompressedFileFetcher;
pub use dataverse::DataverseFetcher;
pub use drive::GoogleDriveFetcher;
pub use figshare::FigshareFetcher;
pub use git::ImmutableGitFetcher;
pub use hydroshare::HydroshareFetcher;
pub use zenodo::ZenodoFetcher;

/// One materialization routine.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// The descriptor kinds this fetcher consumes.
    fn accepted_kinds(&self) -> &'static [RepoKind];

    /// Write the descriptor's contents into `output_dir` (existing, empty).
    async fn fetch(&self, repo: &Repo, output_dir: &Path) -> Result<()>;
}

static ALL_FETCHERS: LazyLock<Vec<Box<dyn Fetch>>> = LazyLock::new(|| {
    vec![
        Box::new(ImmutableGitFetcher),
        Box::new(DataverseFetcher),
        Box::new(ZenodoFetcher),
        Box::new(FigshareFetcher),
        Box::new(HydroshareFetcher::new()),
        Box::new(CkanFetcher),
        Box::new(GoogleDriveFetcher),
        Box::new(GitHubActionArtifactFetcher::new()),
        Box::new(CompressedFileFetcher),
    ]
});

static FETCHERS_BY_KIND: LazyLock<HashMap<RepoKind, usize>> = LazyLock::new(|| {
    let mut registry = HashMap::new();
    for (index, fetcher) in ALL_FETCHERS.iter().enumerate() {
        for kind in fetcher.accepted_kinds() {
            registry.entry(*kind).or_insert(index);
        }
    }
    registry
});

/// Materialize `repo` into `output_dir` with the fetcher registered for its
/// kind.
pub async fn fetch(repo: &Repo, output_dir: &Path) -> Result<()> {
    let Some(&index) = FETCHERS_BY_KIND.get(&repo.kind()) else {
        bail!("Don't know how to fetch a {}", repo.kind().name());
    };
    ALL_FETCHERS[index].fetch(repo, output_dir).await
}
