use tracing::{debug, info, instrument};

use super::types::PullSummary;
use super::{PrError, PullRequestHost};
use crate::action::EventContext;

/// Find the pull request number this run should describe.
///
/// Events that carry a pull request return its number without touching the
/// API. Anything else (a push, say) looks up the pull requests associated
/// with the triggering commit and takes the first open one whose head branch
/// is the triggering ref. `Ok(None)` means nothing matched.
#[instrument(skip(host, ctx), fields(event = %ctx.event_name, sha = %ctx.sha))]
pub async fn resolve_pull_number<H>(host: &H, ctx: &EventContext) -> Result<Option<u64>, PrError>
where
    H: PullRequestHost + ?Sized,
{
    if let Some(number) = ctx.pull_number {
        debug!(number, "event payload carries pull request number");
        return Ok(Some(number));
    }

    info!(git_ref = %ctx.git_ref, "looking up pull requests for commit");
    let pulls = host.pulls_for_commit(&ctx.owner, &ctx.repo, &ctx.sha).await?;
    let number = first_open_for_ref(&pulls, &ctx.git_ref);
    debug!(candidates = pulls.len(), selected = ?number, "filtered associated pull requests");
    Ok(number)
}

/// First pull request, in the given order, that is open and whose head
/// branch is `git_ref`. Both `refs/heads/<branch>` and a bare branch name
/// are accepted for `git_ref`.
pub fn first_open_for_ref(pulls: &[PullSummary], git_ref: &str) -> Option<u64> {
    let branch = git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref);
    pulls
        .iter()
        .find(|pull| pull.state == "open" && pull.head_ref == branch)
        .map(|pull| pull.number)
}
