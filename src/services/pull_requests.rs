//! Reviewer assignment: pull request creation, reviewer replacement and merge.

use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use tracing::{error, info, warn};

use crate::db::txmanager::{AccessMode, IsolationLevel, TxContext, TxManager};
use crate::error::{AppError, AppResult};
use crate::models::{PrId, PrStatus, PullRequest, PullRequestRecord, User, UserId};
use crate::repository::{CounterCache, PullRequestStorage, RepoError, TeamStorage, UserStorage};

use super::selection::{RngSource, pick_first_available, select_reviewers};

/// Owns the pull request state machine and reviewer selection.
pub struct ReviewerAssignmentService {
    tx: Arc<TxManager>,
    users: Arc<dyn UserStorage>,
    teams: Arc<dyn TeamStorage>,
    pull_requests: Arc<dyn PullRequestStorage>,
    counters: Arc<dyn CounterCache>,
    rng: RngSource,
}

impl ReviewerAssignmentService {
    pub fn new(
        tx: Arc<TxManager>,
        users: Arc<dyn UserStorage>,
        teams: Arc<dyn TeamStorage>,
        pull_requests: Arc<dyn PullRequestStorage>,
        counters: Arc<dyn CounterCache>,
        rng: RngSource,
    ) -> Self {
        Self {
            tx,
            users,
            teams,
            pull_requests,
            counters,
            rng,
        }
    }

    /// Create an OPEN pull request and assign up to two reviewers from the
    /// author's team.
    pub async fn create_pr(
        &self,
        cx: &TxContext,
        author_id: &UserId,
        pr_id: &PrId,
        name: &str,
    ) -> AppResult<PullRequest> {
        let mut rng = self.rng.next_rng();
        self.create_pr_with_rng(cx, author_id, pr_id, name, &mut rng)
            .await
    }

    /// [`create_pr`](Self::create_pr) with a caller-supplied random source.
    pub async fn create_pr_with_rng(
        &self,
        cx: &TxContext,
        author_id: &UserId,
        pr_id: &PrId,
        name: &str,
        rng: &mut StdRng,
    ) -> AppResult<PullRequest> {
        if name.is_empty() {
            error!("Pull request name is empty");
            return Err(AppError::InvalidPullRequestName);
        }
        if !author_id.is_valid() {
            error!("Pull request author ID is invalid: '{}'", author_id);
            return Err(AppError::InvalidUserId);
        }
        if !pr_id.is_valid() {
            error!("Pull request ID is invalid: '{}'", pr_id);
            return Err(AppError::InvalidPullRequestId);
        }

        let result = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let author = self.users.get_user_by_id(&cx, author_id).await.map_err(|e| {
                        error!("Failed to get author {}: {}", author_id, e);
                        match e {
                            RepoError::NotFound => AppError::UserNotFound,
                            other => other.into(),
                        }
                    })?;

                    let record = PullRequestRecord {
                        id: pr_id.clone(),
                        name: name.to_string(),
                        author_id: author.id.clone(),
                        status: PrStatus::Open,
                        need_more_reviewers: true,
                        created_at: Utc::now(),
                        merged_at: None,
                    };
                    self.pull_requests
                        .create_pull_request(&cx, &record)
                        .await
                        .map_err(|e| match e {
                            RepoError::AlreadyExists => {
                                error!("Pull request already exists: {} ({})", pr_id, name);
                                AppError::PullRequestAlreadyExists
                            }
                            other => {
                                error!("Failed to create pull request {}: {}", pr_id, other);
                                other.into()
                            }
                        })?;

                    let team = self
                        .teams
                        .get_team_by_user_id(&cx, author_id)
                        .await
                        .map_err(|e| match e {
                            RepoError::NotFound => {
                                error!("User {} has no team", author_id);
                                AppError::UserHasNoTeam
                            }
                            other => {
                                error!("Failed to get team of user {}: {}", author_id, other);
                                other.into()
                            }
                        })?;

                    let members = self.teams.get_users_by_team(&cx, team.id).await.map_err(|e| {
                        error!("Failed to get users of team {}: {}", team.id, e);
                        AppError::from(e)
                    })?;

                    let reviewers = select_reviewers(&members, author_id, rng);

                    for reviewer in &reviewers {
                        self.pull_requests
                            .create_pr_reviewer_instance(&cx, pr_id, &reviewer.id)
                            .await
                            .map_err(|e| {
                                error!(
                                    "Failed to assign reviewer {} to pull request {}: {}",
                                    reviewer.id, pr_id, e
                                );
                                AppError::from(e)
                            })?;
                    }

                    for reviewer in &reviewers {
                        self.increment_counter(&reviewer.id).await?;
                    }

                    Ok::<_, AppError>(PullRequest::hydrate(record, author, reviewers))
                },
            )
            .await;

        match result {
            Ok(pr) => {
                info!(
                    pr_id = %pr.id,
                    reviewers = pr.reviewers.len(),
                    "Successfully created pull request"
                );
                Ok(pr)
            }
            Err(e) => {
                error!("Transaction failed while creating pull request {}: {}", pr_id, e);
                Err(e)
            }
        }
    }

    /// Replace `outgoing` with the first free active member of their team.
    ///
    /// Nothing is persisted when no replacement exists.
    pub async fn reassign_reviewer(
        &self,
        cx: &TxContext,
        pr_id: &PrId,
        outgoing: &UserId,
    ) -> AppResult<User> {
        if pr_id.is_empty() {
            error!("Pull request ID is empty");
            return Err(AppError::InvalidPullRequestId);
        }
        if outgoing.is_empty() {
            error!("Reviewer ID is empty");
            return Err(AppError::InvalidUserId);
        }

        let replacement = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let pr = self.load_pull_request(&cx, pr_id).await?;

                    if pr.status.is_merged() {
                        error!("Pull request {} already merged, can't reassign", pr_id);
                        return Err(AppError::PullRequestAlreadyMerged);
                    }

                    self.pull_requests
                        .delete_pr_reviewer_instance(&cx, pr_id, outgoing)
                        .await
                        .map_err(|e| {
                            error!(
                                "Failed to remove reviewer {} from pull request {}: {}",
                                outgoing, pr_id, e
                            );
                            match e {
                                RepoError::NotFound => AppError::ReviewerNotFoundInPullRequest,
                                other => other.into(),
                            }
                        })?;

                    let team = self
                        .teams
                        .get_team_by_user_id(&cx, outgoing)
                        .await
                        .map_err(|e| match e {
                            RepoError::NotFound => {
                                error!("User {} has no team", outgoing);
                                AppError::UserHasNoTeam
                            }
                            other => {
                                error!("Failed to get team of user {}: {}", outgoing, other);
                                other.into()
                            }
                        })?;

                    let active = self
                        .users
                        .get_active_users_by_team(&cx, team.id)
                        .await
                        .map_err(|e| {
                            error!("Failed to get active users of team {}: {}", team.id, e);
                            AppError::from(e)
                        })?;

                    let reviewers = self
                        .pull_requests
                        .get_reviewers_from_pr(&cx, pr_id)
                        .await
                        .map_err(|e| {
                            error!("Failed to get reviewers of pull request {}: {}", pr_id, e);
                            AppError::from(e)
                        })?;

                    let Some(replacement) =
                        pick_first_available(&active, &reviewers, &pr.author_id, outgoing)
                    else {
                        error!("No available active user to assign to pull request {}", pr_id);
                        return Err(AppError::NoAvailableActiveUserToAssign);
                    };

                    self.pull_requests
                        .create_pr_reviewer_instance(&cx, pr_id, &replacement.id)
                        .await
                        .map_err(|e| {
                            error!(
                                "Failed to assign reviewer {} to pull request {}: {}",
                                replacement.id, pr_id, e
                            );
                            match e {
                                RepoError::AlreadyExists => AppError::ReviewerAlreadyAssigned,
                                other => other.into(),
                            }
                        })?;

                    self.increment_counter(&replacement.id).await?;

                    Ok(replacement)
                },
            )
            .await?;

        info!(
            "Successfully reassigned reviewer on {}: {} -> {}",
            pr_id, outgoing, replacement.id
        );
        Ok(replacement)
    }

    /// Move the pull request to MERGED. Merging a merged pull request is a no-op.
    pub async fn merge_pr(&self, cx: &TxContext, pr_id: &PrId) -> AppResult<PullRequestRecord> {
        if pr_id.is_empty() {
            error!("Pull request ID is empty");
            return Err(AppError::InvalidPullRequestId);
        }

        self.tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let pr = self.load_pull_request(&cx, pr_id).await?;

                    if pr.status.is_merged() {
                        warn!("Pull request {} already merged, skipping merge", pr_id);
                        return Ok(pr);
                    }

                    let merged = self
                        .pull_requests
                        .update_pull_request_status(&cx, pr_id, PrStatus::Merged)
                        .await
                        .map_err(|e| {
                            error!("Failed to update status of pull request {}: {}", pr_id, e);
                            AppError::from(e)
                        })?;

                    info!("Successfully merged pull request {}", pr_id);
                    Ok(merged)
                },
            )
            .await
    }

    /// Pull requests `user_id` reviews, each with author and reviewers.
    pub async fn get_prs_by_user(
        &self,
        cx: &TxContext,
        user_id: &UserId,
    ) -> AppResult<Vec<PullRequest>> {
        if user_id.is_empty() {
            error!("User ID is empty");
            return Err(AppError::InvalidUserId);
        }

        let prs = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move {
                    let records = self
                        .pull_requests
                        .get_pull_requests_by_reviewer_id(&cx, user_id)
                        .await
                        .map_err(|e| {
                            error!("Failed to get pull requests of reviewer {}: {}", user_id, e);
                            AppError::from(e)
                        })?;

                    let mut prs = Vec::with_capacity(records.len());
                    for record in records {
                        let author = self
                            .users
                            .get_user_by_id(&cx, &record.author_id)
                            .await
                            .map_err(|e| {
                                error!("Failed to get author {}: {}", record.author_id, e);
                                AppError::from(e)
                            })?;
                        let reviewers = self
                            .pull_requests
                            .get_reviewers_from_pr(&cx, &record.id)
                            .await
                            .map_err(|e| {
                                error!("Failed to get reviewers of pull request {}: {}", record.id, e);
                                AppError::from(e)
                            })?;
                        prs.push(PullRequest::hydrate(record, author, reviewers));
                    }
                    Ok::<_, AppError>(prs)
                },
            )
            .await?;

        info!(
            "Successfully retrieved {} pull requests for user {}",
            prs.len(),
            user_id
        );
        Ok(prs)
    }

    async fn load_pull_request(&self, cx: &TxContext, pr_id: &PrId) -> AppResult<PullRequestRecord> {
        self.pull_requests
            .get_pull_request_by_id(cx, pr_id)
            .await
            .map_err(|e| {
                error!("Failed to get pull request {}: {}", pr_id, e);
                match e {
                    RepoError::NotFound => AppError::PullRequestNotFound,
                    other => other.into(),
                }
            })
    }

    async fn increment_counter(&self, user: &UserId) -> AppResult<()> {
        self.counters.increment_assign_count(user).await.map_err(|e| {
            error!("Failed to increment assign count of {}: {}", user, e);
            AppError::from(e)
        })
    }
}
