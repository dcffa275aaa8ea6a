//! Domain error types for the reviewer assignment service.
//!
//! Uses thiserror for ergonomic error handling with automatic Display implementations.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::db::txmanager::TxError;
use crate::repository::RepoError;

/// Coarse classification callers can rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    State,
    Exhaustion,
    Internal,
}

/// Application-level errors.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid user id")]
    InvalidUserId,

    #[error("invalid pull request id")]
    InvalidPullRequestId,

    #[error("invalid pull request name")]
    InvalidPullRequestName,

    #[error("invalid team name")]
    InvalidTeamName,

    #[error("no users provided for team creation")]
    NoUsersProvided,

    /// Malformed request that never reached a service
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("user not found")]
    UserNotFound,

    #[error("team not found")]
    TeamNotFound,

    #[error("pull request not found")]
    PullRequestNotFound,

    #[error("reviewer not found in pull request")]
    ReviewerNotFoundInPullRequest,

    #[error("user has no team")]
    UserHasNoTeam,

    #[error("no users in team")]
    NoUsersInTeam,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("team already exists")]
    TeamAlreadyExists,

    #[error("pull request already exists")]
    PullRequestAlreadyExists,

    #[error("one of the users already has a team")]
    UserAlreadyHasTeam,

    /// A concurrent reassignment picked the same replacement; safe to retry
    #[error("replacement reviewer already assigned, retry")]
    ReviewerAlreadyAssigned,

    #[error("pull request already merged")]
    PullRequestAlreadyMerged,

    #[error("no available active user to assign")]
    NoAvailableActiveUserToAssign,

    /// Unclassified storage or cache failure
    #[error(transparent)]
    Repository(#[from] RepoError),

    /// Transaction could not be started, committed or completed
    #[error(transparent)]
    Transaction(#[from] TxError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUserId
            | Self::InvalidPullRequestId
            | Self::InvalidPullRequestName
            | Self::InvalidTeamName
            | Self::NoUsersProvided
            | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::UserNotFound
            | Self::TeamNotFound
            | Self::PullRequestNotFound
            | Self::ReviewerNotFoundInPullRequest
            | Self::UserHasNoTeam
            | Self::NoUsersInTeam => ErrorKind::NotFound,
            Self::UserAlreadyExists
            | Self::TeamAlreadyExists
            | Self::PullRequestAlreadyExists
            | Self::UserAlreadyHasTeam
            | Self::ReviewerAlreadyAssigned => ErrorKind::Conflict,
            Self::PullRequestAlreadyMerged => ErrorKind::State,
            Self::NoAvailableActiveUserToAssign => ErrorKind::Exhaustion,
            Self::Repository(_) | Self::Transaction(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code used in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUserId
            | Self::InvalidPullRequestId
            | Self::InvalidPullRequestName
            | Self::InvalidTeamName
            | Self::NoUsersProvided
            | Self::InvalidInput(_) => "INVALID_INPUT",
            Self::UserNotFound
            | Self::TeamNotFound
            | Self::PullRequestNotFound
            | Self::UserHasNoTeam
            | Self::NoUsersInTeam => "NOT_FOUND",
            Self::ReviewerNotFoundInPullRequest => "NOT_ASSIGNED",
            Self::UserAlreadyExists => "USER_EXISTS",
            Self::TeamAlreadyExists => "TEAM_EXISTS",
            Self::PullRequestAlreadyExists => "PR_EXISTS",
            Self::UserAlreadyHasTeam => "USER_HAS_TEAM",
            Self::ReviewerAlreadyAssigned => "REVIEWER_ASSIGNED",
            Self::PullRequestAlreadyMerged => "PR_MERGED",
            Self::NoAvailableActiveUserToAssign => "NO_CANDIDATE",
            Self::Repository(RepoError::Cache(_)) => "CACHE_ERROR",
            Self::Repository(_) => "DATABASE_ERROR",
            Self::Transaction(TxError::Cancelled) => "CANCELLED",
            Self::Transaction(_) => "TRANSACTION_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict | ErrorKind::State | ErrorKind::Exhaustion => StatusCode::CONFLICT,
            ErrorKind::Internal => match self {
                Self::Transaction(TxError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self.kind() {
            ErrorKind::Internal => {
                tracing::error!("Internal error: {}", self);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.code().to_string(),
            message,
        })
    }
}

/// Error response body matching OpenAPI schema.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
