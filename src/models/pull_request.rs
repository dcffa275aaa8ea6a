//! Pull request domain models and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use super::user::{User, UserId};

/// Maximum length of a pull request identifier (matches the `pull_requests.id` column).
pub const MAX_PR_ID_LEN: usize = 255;

/// Caller-supplied pull request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PrId(String);

impl PrId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.len() <= MAX_PR_ID_LEN
    }
}

impl fmt::Display for PrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PrId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Pull request status. `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrStatus {
    Open,
    Merged,
}

impl PrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OPEN" => Some(Self::Open),
            "MERGED" => Some(Self::Merged),
            _ => None,
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Self::Merged)
    }
}

impl fmt::Display for PrStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pull request row as stored, without author or reviewers hydrated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    pub id: PrId,
    pub name: String,
    pub author_id: UserId,
    pub status: PrStatus,
    pub need_more_reviewers: bool,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

/// Pull request with author and reviewers.
#[derive(Debug, Clone)]
pub struct PullRequest {
    pub id: PrId,
    pub name: String,
    pub author: User,
    pub status: PrStatus,
    pub reviewers: Vec<User>,
    pub need_more_reviewers: bool,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn hydrate(record: PullRequestRecord, author: User, reviewers: Vec<User>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            author,
            status: record.status,
            reviewers,
            need_more_reviewers: record.need_more_reviewers,
            created_at: record.created_at,
            merged_at: record.merged_at,
        }
    }
}

/// Request body for pull request creation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

/// Request body for merging a pull request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MergePullRequestRequest {
    pub pull_request_id: String,
}

/// Request body for replacing a reviewer.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReassignReviewerRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

/// Pull request payload returned by the API.
#[derive(Debug, Serialize, ToSchema)]
pub struct PullRequestResponse {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PrStatus,
    pub assigned_reviewers: Vec<String>,
    pub need_more_reviewers: bool,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(pr: PullRequest) -> Self {
        Self {
            pull_request_id: pr.id.to_string(),
            pull_request_name: pr.name,
            author_id: pr.author.id.to_string(),
            status: pr.status,
            assigned_reviewers: pr.reviewers.into_iter().map(|r| r.id.to_string()).collect(),
            need_more_reviewers: pr.need_more_reviewers,
            created_at: pr.created_at,
            merged_at: pr.merged_at,
        }
    }
}

/// Result of a merge request.
#[derive(Debug, Serialize, ToSchema)]
pub struct MergeResponse {
    pub pr_id: String,
}

/// Result of a reviewer replacement.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReassignResponse {
    pub pr_id: String,
    pub replaced_by: String,
}

/// Pull requests a user is reviewing.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewListResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequestResponse>,
}
