use std::fmt;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::action::EventContext;
use crate::llm::{CompletionClient, LlmError};
use crate::pr::{resolve, snapshot, PrError, PullRequestHost, PullRequestRef};
use crate::prompt;

/// The stages a run goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    Collecting,
    Composing,
    Completing,
    Updating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Resolving => "resolving",
            Stage::Collecting => "collecting",
            Stage::Composing => "composing",
            Stage::Completing => "completing",
            Stage::Updating => "updating",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("No open pull request found for {event_name}, {sha}")]
    NoPullRequest { event_name: String, sha: String },

    #[error("Failed to look up pull requests for commit: {0}")]
    Resolution(#[source] PrError),

    #[error("Failed to collect pull request context: {0}")]
    Collection(#[source] PrError),

    #[error("Failed to compose prompt: {0}")]
    Composition(#[from] serde_json::Error),

    #[error("Completion request failed: {0}")]
    Completion(#[from] LlmError),

    #[error("Failed to update pull request description: {0}")]
    Update(#[source] PrError),
}

impl RunError {
    /// The stage the run was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            RunError::NoPullRequest { .. } | RunError::Resolution(_) => Stage::Resolving,
            RunError::Collection(_) => Stage::Collecting,
            RunError::Composition(_) => Stage::Composing,
            RunError::Completion(_) => Stage::Completing,
            RunError::Update(_) => Stage::Updating,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub pull: PullRequestRef,
    pub description: String,
    /// False when the update was skipped for a dry run
    pub updated: bool,
}

/// One run: resolve, collect, compose, complete, update.
pub struct Pipeline<'a, H: ?Sized, C: ?Sized> {
    host: &'a H,
    model: &'a C,
    template: &'a str,
    dry_run: bool,
}

impl<'a, H, C> Pipeline<'a, H, C>
where
    H: PullRequestHost + ?Sized,
    C: CompletionClient + ?Sized,
{
    pub fn new(host: &'a H, model: &'a C, template: &'a str) -> Self {
        Self {
            host,
            model,
            template,
            dry_run: false,
        }
    }

    /// Run every stage except the final description update.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute the stages in order. The first failure ends the run; nothing
    /// is retried and nothing done by earlier stages is undone.
    pub async fn run(&self, ctx: &EventContext) -> Result<RunOutcome, RunError> {
        info!(stage = %Stage::Resolving, owner = %ctx.owner, repo = %ctx.repo, "resolving pull request");
        let number = resolve::resolve_pull_number(self.host, ctx)
            .await
            .map_err(RunError::Resolution)?
            .ok_or_else(|| RunError::NoPullRequest {
                event_name: ctx.event_name.clone(),
                sha: ctx.sha.clone(),
            })?;
        let pull = PullRequestRef {
            owner: ctx.owner.clone(),
            repo: ctx.repo.clone(),
            number,
        };
        info!(pr = %pull, "resolved pull request");

        self.describe(pull).await
    }

    #[instrument(skip(self, pull), fields(pr = %pull))]
    async fn describe(&self, pull: PullRequestRef) -> Result<RunOutcome, RunError> {
        info!(stage = %Stage::Collecting, "collecting pull request context");
        let snapshot = snapshot::collect(self.host, &pull)
            .await
            .map_err(RunError::Collection)?;
        info!(files = snapshot.files.len(), commits = snapshot.commits.len(), "collected snapshot");

        info!(stage = %Stage::Composing, "composing prompt");
        let input = prompt::compose(self.template, &snapshot)?;
        debug!(prompt = %input, "composed prompt");

        info!(stage = %Stage::Completing, model = self.model.model(), "requesting completion");
        let description = self.model.complete(&input).await?;
        info!(chars = description.chars().count(), "received description");

        if self.dry_run {
            info!(stage = %Stage::Updating, "dry run, leaving description unchanged");
        } else {
            info!(stage = %Stage::Updating, "overwriting pull request description");
            self.host
                .update_body(&pull, &description)
                .await
                .map_err(RunError::Update)?;
        }

        Ok(RunOutcome {
            pull,
            description,
            updated: !self.dry_run,
        })
    }
}
