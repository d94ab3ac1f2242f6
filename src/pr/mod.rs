pub mod github;
pub mod resolve;
pub mod snapshot;
pub mod types;

pub use github::GitHubClient;
pub use types::{
    CommitRecord, FileChange, PullDetails, PullRequestRef, PullRequestSnapshot, PullSummary,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status} for {url}: {body}")]
    ApiStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),
}

/// The source-control host operations a run needs.
/// Implementations must be Send + Sync so the pipeline can hold them
/// across await points.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Pull requests associated with a commit, in the host's order.
    async fn pulls_for_commit(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<Vec<PullSummary>, PrError>;

    /// Title and body of one pull request.
    async fn pull(&self, pr: &PullRequestRef) -> Result<PullDetails, PrError>;

    /// Changed files in host order. `wanted` is a hint: an implementation
    /// may stop paging once it holds that many entries.
    async fn files(&self, pr: &PullRequestRef, wanted: usize) -> Result<Vec<FileChange>, PrError>;

    /// Commits in host order, with the same `wanted` hint as [`files`](Self::files).
    async fn commits(
        &self,
        pr: &PullRequestRef,
        wanted: usize,
    ) -> Result<Vec<CommitRecord>, PrError>;

    /// Overwrite the pull request description.
    async fn update_body(&self, pr: &PullRequestRef, body: &str) -> Result<(), PrError>;
}
