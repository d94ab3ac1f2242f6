use tracing::{debug, instrument};

use super::types::{PullRequestRef, PullRequestSnapshot};
use super::{PrError, PullRequestHost};

/// Body text kept in the snapshot, in characters.
pub const MAX_BODY_CHARS: usize = 500;
/// Files and commits kept in the snapshot.
pub const MAX_LIST_ENTRIES: usize = 5;

/// Fetch the pull request and build its bounded snapshot.
/// Any failed request fails the whole collection.
#[instrument(skip(host), fields(pr = %pr))]
pub async fn collect<H>(host: &H, pr: &PullRequestRef) -> Result<PullRequestSnapshot, PrError>
where
    H: PullRequestHost + ?Sized,
{
    let details = host.pull(pr).await?;

    let mut files = host.files(pr, MAX_LIST_ENTRIES).await?;
    let mut commits = host.commits(pr, MAX_LIST_ENTRIES).await?;
    debug!(files = files.len(), commits = commits.len(), "fetched pull request lists");
    files.truncate(MAX_LIST_ENTRIES);
    commits.truncate(MAX_LIST_ENTRIES);

    Ok(PullRequestSnapshot {
        title: details.title,
        body: truncate_chars(details.body.as_deref().unwrap_or_default(), MAX_BODY_CHARS),
        files,
        commits,
    })
}

/// The first `max` characters of `text`, cut without regard to words.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
