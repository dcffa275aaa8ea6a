//! Storage and cache ports used by the services.
//!
//! Every storage call takes the request [`TxContext`]; implementations run
//! their statements on whatever executor the context resolves to, so the
//! same call works inside and outside a unit of work.

pub mod cache;

use async_trait::async_trait;
use sea_orm::{DbErr, SqlErr};

use crate::db::txmanager::TxContext;
use crate::models::{
    PrId, PrStatus, PullRequestRecord, TeamId, TeamRecord, User, UserId,
};

pub use cache::{CounterCache, MemoryCounterCache, RedisCounterCache};

/// Signals raised by storage and cache implementations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("database error: {0}")]
    Database(#[source] DbErr),

    #[error("cache error: {0}")]
    Cache(String),
}

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => RepoError::AlreadyExists,
            _ => match err {
                DbErr::RecordNotFound(_) => RepoError::NotFound,
                other => RepoError::Database(other),
            },
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

#[async_trait]
pub trait UserStorage: Send + Sync {
    async fn create_user(&self, cx: &TxContext, user: &User) -> RepoResult<()>;

    async fn get_user_by_id(&self, cx: &TxContext, id: &UserId) -> RepoResult<User>;

    /// Active members of a team in membership order.
    async fn get_active_users_by_team(&self, cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>>;

    /// Sets the activity flag; `NotFound` when the user does not exist.
    async fn update_activity(&self, cx: &TxContext, id: &UserId, is_active: bool)
    -> RepoResult<User>;
}

#[async_trait]
pub trait TeamStorage: Send + Sync {
    async fn create_team(&self, cx: &TxContext, name: &str) -> RepoResult<TeamRecord>;

    async fn get_team_by_id(&self, cx: &TxContext, id: TeamId) -> RepoResult<TeamRecord>;

    async fn get_team_by_name(&self, cx: &TxContext, name: &str) -> RepoResult<TeamRecord>;

    async fn get_team_by_user_id(&self, cx: &TxContext, user: &UserId) -> RepoResult<TeamRecord>;

    /// `AlreadyExists` when the user already belongs to a team.
    async fn create_user_team_instance(
        &self,
        cx: &TxContext,
        user: &UserId,
        team: TeamId,
    ) -> RepoResult<()>;

    /// All members of a team in membership order.
    async fn get_users_by_team(&self, cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>>;
}

#[async_trait]
pub trait PullRequestStorage: Send + Sync {
    /// `AlreadyExists` on a duplicate id or name.
    async fn create_pull_request(&self, cx: &TxContext, pr: &PullRequestRecord) -> RepoResult<()>;

    async fn get_pull_request_by_id(&self, cx: &TxContext, id: &PrId)
    -> RepoResult<PullRequestRecord>;

    async fn get_pull_requests_by_reviewer_id(
        &self,
        cx: &TxContext,
        reviewer: &UserId,
    ) -> RepoResult<Vec<PullRequestRecord>>;

    async fn get_all_open_pull_requests(&self, cx: &TxContext)
    -> RepoResult<Vec<PullRequestRecord>>;

    /// Moving to `Merged` also stamps `merged_at`.
    async fn update_pull_request_status(
        &self,
        cx: &TxContext,
        id: &PrId,
        status: PrStatus,
    ) -> RepoResult<PullRequestRecord>;

    async fn create_pr_reviewer_instance(
        &self,
        cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()>;

    /// `NotFound` when the reviewer was not assigned.
    async fn delete_pr_reviewer_instance(
        &self,
        cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()>;

    /// Reviewers in assignment order.
    async fn get_reviewers_from_pr(&self, cx: &TxContext, pr: &PrId) -> RepoResult<Vec<User>>;
}
