//! Database operations for teams and memberships.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::entity::{team, user, user_team};
use crate::models::{TeamId, TeamRecord, User, UserId};
use crate::repository::{RepoError, RepoResult, TeamStorage};

use super::txmanager::{TxContext, TxManager, on_executor};
use super::users::model_to_user;

/// PostgreSQL implementation of [`TeamStorage`].
#[derive(Clone)]
pub struct PgTeamStorage {
    tx: Arc<TxManager>,
}

impl PgTeamStorage {
    pub fn new(tx: Arc<TxManager>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl TeamStorage for PgTeamStorage {
    async fn create_team(&self, cx: &TxContext, name: &str) -> RepoResult<TeamRecord> {
        let model = team::ActiveModel {
            id: NotSet,
            team_name: Set(name.to_string()),
            created_at: Set(Utc::now()),
        };

        let inserted = on_executor!(self.tx.executor(cx), |db| model.insert(db).await)?;
        Ok(model_to_team(inserted))
    }

    async fn get_team_by_id(&self, cx: &TxContext, id: TeamId) -> RepoResult<TeamRecord> {
        let found = on_executor!(self.tx.executor(cx), |db| {
            team::Entity::find_by_id(id.0).one(db).await
        })?;

        found.map(model_to_team).ok_or(RepoError::NotFound)
    }

    async fn get_team_by_name(&self, cx: &TxContext, name: &str) -> RepoResult<TeamRecord> {
        let found = on_executor!(self.tx.executor(cx), |db| {
            team::Entity::find()
                .filter(team::Column::TeamName.eq(name))
                .one(db)
                .await
        })?;

        found.map(model_to_team).ok_or(RepoError::NotFound)
    }

    async fn get_team_by_user_id(&self, cx: &TxContext, user: &UserId) -> RepoResult<TeamRecord> {
        let found = on_executor!(self.tx.executor(cx), |db| {
            team::Entity::find()
                .inner_join(user_team::Entity)
                .filter(user_team::Column::UserId.eq(user.as_str()))
                .one(db)
                .await
        })?;

        found.map(model_to_team).ok_or(RepoError::NotFound)
    }

    async fn create_user_team_instance(
        &self,
        cx: &TxContext,
        user: &UserId,
        team: TeamId,
    ) -> RepoResult<()> {
        let model = user_team::ActiveModel {
            user_id: Set(user.to_string()),
            team_id: Set(team.0),
            joined_at: Set(Utc::now()),
        };

        on_executor!(self.tx.executor(cx), |db| {
            user_team::Entity::insert(model).exec(db).await
        })?;
        Ok(())
    }

    async fn get_users_by_team(&self, cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>> {
        let models = on_executor!(self.tx.executor(cx), |db| {
            user::Entity::find()
                .inner_join(user_team::Entity)
                .filter(user_team::Column::TeamId.eq(team.0))
                .order_by_asc(user_team::Column::JoinedAt)
                .order_by_asc(user::Column::Id)
                .all(db)
                .await
        })?;

        Ok(models.into_iter().map(model_to_user).collect())
    }
}

fn model_to_team(m: team::Model) -> TeamRecord {
    TeamRecord {
        id: TeamId(m.id),
        name: m.team_name,
        created_at: m.created_at,
    }
}
