use serde::{Deserialize, Serialize};

/// Identifies the pull request a run works on.
/// Created once by resolution and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// A pull request as listed for a commit, used to pick the run's target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSummary {
    pub number: u64,
    /// `open` or `closed`
    pub state: String,
    /// Head branch name, without the `refs/heads/` prefix
    pub head_ref: String,
}

/// Title and body of a single pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullDetails {
    pub title: String,
    /// None when the pull request has no description
    pub body: Option<String>,
}

/// One changed file, as reported by the pull request files endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub filename: String,
    /// `added`, `modified`, `removed`, `renamed`, ...
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    /// Unified diff of the file; absent for binary or very large files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

/// One commit on the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Bounded view of a pull request that goes into the prompt.
/// Field order here is the field order of the serialized JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestSnapshot {
    pub title: String,
    pub body: String,
    pub files: Vec<FileChange>,
    pub commits: Vec<CommitRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_request_ref_display() {
        let pr = PullRequestRef {
            owner: "org".to_string(),
            repo: "repo".to_string(),
            number: 42,
        };
        assert_eq!(pr.to_string(), "org/repo#42");
    }

    #[test]
    fn test_file_change_omits_missing_patch() {
        let file = FileChange {
            filename: "logo.png".to_string(),
            status: "added".to_string(),
            additions: 0,
            deletions: 0,
            changes: 0,
            patch: None,
        };
        let json = serde_json::to_string(&file).unwrap();
        assert_eq!(
            json,
            r#"{"filename":"logo.png","status":"added","additions":0,"deletions":0,"changes":0}"#
        );
    }

    #[test]
    fn test_snapshot_field_order() {
        let snapshot = PullRequestSnapshot {
            title: "Fix bug".to_string(),
            body: "desc".to_string(),
            files: vec![],
            commits: vec![CommitRecord {
                sha: "abc".to_string(),
                message: "fix".to_string(),
                author: None,
            }],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"title":"Fix bug","body":"desc","files":[],"commits":[{"sha":"abc","message":"fix"}]}"#
        );
    }
}
