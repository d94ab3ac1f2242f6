use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Missing runner environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid GITHUB_REPOSITORY value: {0} (expected owner/repo)")]
    InvalidRepository(String),

    #[error("Failed to read event payload: {0}")]
    PayloadRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    PayloadParse(#[from] serde_json::Error),
}

/// The triggering event, as seen by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub owner: String,
    pub repo: String,
    /// Commit SHA that triggered the run
    pub sha: String,
    /// Triggering ref, e.g. `refs/heads/feature`
    pub git_ref: String,
    /// Event name, e.g. `pull_request` or `push`
    pub event_name: String,
    /// `pull_request.number` from the payload, if the event carries one
    pub pull_number: Option<u64>,
}

impl EventContext {
    /// Read the event context from the runner's `GITHUB_*` variables.
    pub fn from_env() -> Result<EventContext, ContextError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EventContext::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<EventContext, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.is_empty())
                .ok_or(ContextError::MissingVar(key))
        };

        let repository = require("GITHUB_REPOSITORY")?;
        let sha = require("GITHUB_SHA")?;
        let event_name = require("GITHUB_EVENT_NAME")?;
        let env_ref = lookup("GITHUB_REF").unwrap_or_default();

        let payload = match lookup("GITHUB_EVENT_PATH").filter(|p| !p.is_empty()) {
            Some(path) => read_payload(Path::new(&path))?,
            None => Value::Null,
        };

        let (owner, repo) = repository
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
            .ok_or_else(|| ContextError::InvalidRepository(repository.clone()))?;

        Ok(Self::from_payload(owner, repo, &sha, &env_ref, &event_name, &payload))
    }

    /// Assemble a context from its parts. The payload's `ref` wins over the
    /// environment ref, since push payloads carry the pushed branch there.
    pub fn from_payload(
        owner: &str,
        repo: &str,
        sha: &str,
        env_ref: &str,
        event_name: &str,
        payload: &Value,
    ) -> EventContext {
        let git_ref = payload
            .get("ref")
            .and_then(Value::as_str)
            .unwrap_or(env_ref)
            .to_string();
        let pull_number = payload
            .get("pull_request")
            .and_then(|pr| pr.get("number"))
            .and_then(Value::as_u64);

        EventContext {
            owner: owner.to_string(),
            repo: repo.to_string(),
            sha: sha.to_string(),
            git_ref,
            event_name: event_name.to_string(),
            pull_number,
        }
    }
}

/// A payload file that doesn't exist is an empty payload, matching how the
/// runner behaves for events without one.
fn read_payload(path: &Path) -> Result<Value, ContextError> {
    if !path.exists() {
        return Ok(Value::Null);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
