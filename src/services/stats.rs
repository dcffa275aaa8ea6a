//! Assignment counters: lookup and reconciliation against relational state.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::db::txmanager::{AccessMode, IsolationLevel, TxContext, TxManager};
use crate::error::{AppError, AppResult};
use crate::models::{PrStatus, UserId, UserStats};
use crate::repository::{CounterCache, PullRequestStorage, RepoError, UserStorage};

pub struct StatsService {
    tx: Arc<TxManager>,
    users: Arc<dyn UserStorage>,
    pull_requests: Arc<dyn PullRequestStorage>,
    counters: Arc<dyn CounterCache>,
}

impl StatsService {
    pub fn new(
        tx: Arc<TxManager>,
        users: Arc<dyn UserStorage>,
        pull_requests: Arc<dyn PullRequestStorage>,
        counters: Arc<dyn CounterCache>,
    ) -> Self {
        Self {
            tx,
            users,
            pull_requests,
            counters,
        }
    }

    /// Counter of an existing user; zero when never assigned.
    pub async fn get_assign_count(&self, cx: &TxContext, user_id: &UserId) -> AppResult<UserStats> {
        if user_id.is_empty() {
            error!("User ID is empty");
            return Err(AppError::InvalidUserId);
        }

        self.tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move { self.ensure_user(&cx, user_id).await },
            )
            .await?;

        let assigned_count = match self.counters.get_assign_count(user_id).await {
            Ok(count) => count,
            Err(RepoError::NotFound) => 0,
            Err(e) => {
                error!("Failed to read assign count of {}: {}", user_id, e);
                return Err(e.into());
            }
        };

        Ok(UserStats {
            user_id: user_id.to_string(),
            assigned_count,
        })
    }

    /// Rebuild one user's counter from the open pull requests they review.
    pub async fn reconcile_user(&self, cx: &TxContext, user_id: &UserId) -> AppResult<UserStats> {
        if user_id.is_empty() {
            error!("User ID is empty");
            return Err(AppError::InvalidUserId);
        }

        let open = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move {
                    self.ensure_user(&cx, user_id).await?;
                    let prs = self
                        .pull_requests
                        .get_pull_requests_by_reviewer_id(&cx, user_id)
                        .await
                        .map_err(|e| {
                            error!("Failed to get pull requests of reviewer {}: {}", user_id, e);
                            AppError::from(e)
                        })?;
                    Ok::<_, AppError>(prs.iter().filter(|p| p.status == PrStatus::Open).count() as i64)
                },
            )
            .await?;

        self.write_count(user_id, open).await?;

        info!("Reconciled assign count of {} to {}", user_id, open);
        Ok(UserStats {
            user_id: user_id.to_string(),
            assigned_count: open,
        })
    }

    /// Rebuild every counter from the open pull requests each user reviews.
    ///
    /// Covers users reviewing an open pull request and users already holding
    /// a counter. A counter with no open review behind it drops to zero, which
    /// matches what [`Self::reconcile_user`] writes for the same user.
    pub async fn reconcile_open_assignments(&self, cx: &TxContext) -> AppResult<Vec<UserStats>> {
        let mut counts = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move {
                    let open = self.pull_requests.get_all_open_pull_requests(&cx).await.map_err(|e| {
                        error!("Failed to list open pull requests: {}", e);
                        AppError::from(e)
                    })?;

                    let mut counts: BTreeMap<UserId, i64> = BTreeMap::new();
                    for pr in &open {
                        let reviewers = self
                            .pull_requests
                            .get_reviewers_from_pr(&cx, &pr.id)
                            .await
                            .map_err(|e| {
                                error!("Failed to get reviewers of pull request {}: {}", pr.id, e);
                                AppError::from(e)
                            })?;
                        for reviewer in reviewers {
                            *counts.entry(reviewer.id).or_insert(0) += 1;
                        }
                    }
                    Ok::<_, AppError>(counts)
                },
            )
            .await?;

        let counted = self.counters.list_counted_users().await.map_err(|e| {
            error!("Failed to list assign counters: {}", e);
            AppError::from(e)
        })?;
        for user_id in counted {
            counts.entry(user_id).or_insert(0);
        }

        let mut stats = Vec::with_capacity(counts.len());
        for (user_id, count) in counts {
            self.write_count(&user_id, count).await?;
            stats.push(UserStats {
                user_id: user_id.to_string(),
                assigned_count: count,
            });
        }

        if stats.is_empty() {
            warn!("No open reviews or counters found, nothing reconciled");
        } else {
            info!("Reconciled assign counts of {} users", stats.len());
        }
        Ok(stats)
    }

    async fn ensure_user(&self, cx: &TxContext, user_id: &UserId) -> AppResult<()> {
        self.users
            .get_user_by_id(cx, user_id)
            .await
            .map(|_| ())
            .map_err(|e| match e {
                RepoError::NotFound => {
                    error!("User not found: {}", user_id);
                    AppError::UserNotFound
                }
                other => {
                    error!("Failed to get user {}: {}", user_id, other);
                    other.into()
                }
            })
    }

    async fn write_count(&self, user_id: &UserId, count: i64) -> AppResult<()> {
        self.counters
            .set_assign_count(user_id, count)
            .await
            .map_err(|e| {
                error!("Failed to write assign count of {}: {}", user_id, e);
                AppError::from(e)
            })
    }
}
