//! Database operations for pull requests and reviewer assignments.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::entity::{pr_reviewer, pull_request, user};
use crate::models::{PrId, PrStatus, PullRequestRecord, User, UserId};
use crate::repository::{PullRequestStorage, RepoError, RepoResult};

use super::txmanager::{TxContext, TxManager, on_executor};
use super::users::model_to_user;

/// PostgreSQL implementation of [`PullRequestStorage`].
#[derive(Clone)]
pub struct PgPullRequestStorage {
    tx: Arc<TxManager>,
}

impl PgPullRequestStorage {
    pub fn new(tx: Arc<TxManager>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl PullRequestStorage for PgPullRequestStorage {
    async fn create_pull_request(&self, cx: &TxContext, pr: &PullRequestRecord) -> RepoResult<()> {
        let model = pull_request::ActiveModel {
            id: Set(pr.id.to_string()),
            name: Set(pr.name.clone()),
            author_id: Set(pr.author_id.to_string()),
            status: Set(pr.status.as_str().to_string()),
            need_more_reviewers: Set(pr.need_more_reviewers),
            created_at: Set(pr.created_at),
            merged_at: Set(pr.merged_at),
        };

        on_executor!(self.tx.executor(cx), |db| {
            pull_request::Entity::insert(model).exec(db).await
        })?;
        Ok(())
    }

    async fn get_pull_request_by_id(
        &self,
        cx: &TxContext,
        id: &PrId,
    ) -> RepoResult<PullRequestRecord> {
        let found = on_executor!(self.tx.executor(cx), |db| {
            pull_request::Entity::find_by_id(id.as_str()).one(db).await
        })?;

        found.ok_or(RepoError::NotFound).and_then(model_to_record)
    }

    async fn get_pull_requests_by_reviewer_id(
        &self,
        cx: &TxContext,
        reviewer: &UserId,
    ) -> RepoResult<Vec<PullRequestRecord>> {
        let models = on_executor!(self.tx.executor(cx), |db| {
            pull_request::Entity::find()
                .inner_join(pr_reviewer::Entity)
                .filter(pr_reviewer::Column::ReviewerId.eq(reviewer.as_str()))
                .order_by_asc(pull_request::Column::CreatedAt)
                .order_by_asc(pull_request::Column::Id)
                .all(db)
                .await
        })?;

        models.into_iter().map(model_to_record).collect()
    }

    async fn get_all_open_pull_requests(
        &self,
        cx: &TxContext,
    ) -> RepoResult<Vec<PullRequestRecord>> {
        let models = on_executor!(self.tx.executor(cx), |db| {
            pull_request::Entity::find()
                .filter(pull_request::Column::Status.eq(PrStatus::Open.as_str()))
                .order_by_asc(pull_request::Column::CreatedAt)
                .order_by_asc(pull_request::Column::Id)
                .all(db)
                .await
        })?;

        models.into_iter().map(model_to_record).collect()
    }

    async fn update_pull_request_status(
        &self,
        cx: &TxContext,
        id: &PrId,
        status: PrStatus,
    ) -> RepoResult<PullRequestRecord> {
        let updated = on_executor!(self.tx.executor(cx), |db| {
            match pull_request::Entity::find_by_id(id.as_str()).one(db).await? {
                Some(m) => {
                    let mut active: pull_request::ActiveModel = m.into();
                    active.status = Set(status.as_str().to_string());
                    if status.is_merged() {
                        active.merged_at = Set(Some(Utc::now()));
                    }
                    Ok(active.update(db).await?)
                }
                None => Err(RepoError::NotFound),
            }
        })?;

        model_to_record(updated)
    }

    async fn create_pr_reviewer_instance(
        &self,
        cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()> {
        let model = pr_reviewer::ActiveModel {
            pr_id: Set(pr.to_string()),
            reviewer_id: Set(reviewer.to_string()),
            assigned_at: Set(Utc::now()),
        };

        on_executor!(self.tx.executor(cx), |db| {
            pr_reviewer::Entity::insert(model).exec(db).await
        })?;
        Ok(())
    }

    async fn delete_pr_reviewer_instance(
        &self,
        cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()> {
        let result = on_executor!(self.tx.executor(cx), |db| {
            pr_reviewer::Entity::delete_many()
                .filter(pr_reviewer::Column::PrId.eq(pr.as_str()))
                .filter(pr_reviewer::Column::ReviewerId.eq(reviewer.as_str()))
                .exec(db)
                .await
        })?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_reviewers_from_pr(&self, cx: &TxContext, pr: &PrId) -> RepoResult<Vec<User>> {
        let models = on_executor!(self.tx.executor(cx), |db| {
            user::Entity::find()
                .inner_join(pr_reviewer::Entity)
                .filter(pr_reviewer::Column::PrId.eq(pr.as_str()))
                .order_by_asc(pr_reviewer::Column::AssignedAt)
                .order_by_asc(user::Column::Id)
                .all(db)
                .await
        })?;

        Ok(models.into_iter().map(model_to_user).collect())
    }
}

fn model_to_record(m: pull_request::Model) -> RepoResult<PullRequestRecord> {
    let status = PrStatus::parse(&m.status).ok_or_else(|| {
        RepoError::Database(DbErr::Custom(format!(
            "unknown pull request status '{}' for {}",
            m.status, m.id
        )))
    })?;

    Ok(PullRequestRecord {
        id: PrId::new(m.id),
        name: m.name,
        author_id: UserId::new(m.author_id),
        status,
        need_more_reviewers: m.need_more_reviewers,
        created_at: m.created_at,
        merged_at: m.merged_at,
    })
}
