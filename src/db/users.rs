//! Database operations for users.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::entity::{user, user_team};
use crate::models::{TeamId, User, UserId};
use crate::repository::{RepoError, RepoResult, UserStorage};

use super::txmanager::{TxContext, TxManager, on_executor};

/// PostgreSQL implementation of [`UserStorage`].
#[derive(Clone)]
pub struct PgUserStorage {
    tx: Arc<TxManager>,
}

impl PgUserStorage {
    pub fn new(tx: Arc<TxManager>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UserStorage for PgUserStorage {
    async fn create_user(&self, cx: &TxContext, u: &User) -> RepoResult<()> {
        let model = user::ActiveModel {
            id: Set(u.id.to_string()),
            name: Set(u.name.clone()),
            is_active: Set(u.is_active),
            created_at: Set(Utc::now()),
        };

        on_executor!(self.tx.executor(cx), |db| user::Entity::insert(model).exec(db).await)?;
        Ok(())
    }

    async fn get_user_by_id(&self, cx: &TxContext, id: &UserId) -> RepoResult<User> {
        let found = on_executor!(self.tx.executor(cx), |db| {
            user::Entity::find_by_id(id.as_str()).one(db).await
        })?;

        found.map(model_to_user).ok_or(RepoError::NotFound)
    }

    async fn get_active_users_by_team(&self, cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>> {
        let models = on_executor!(self.tx.executor(cx), |db| {
            user::Entity::find()
                .inner_join(user_team::Entity)
                .filter(user_team::Column::TeamId.eq(team.0))
                .filter(user::Column::IsActive.eq(true))
                .order_by_asc(user_team::Column::JoinedAt)
                .order_by_asc(user::Column::Id)
                .all(db)
                .await
        })?;

        Ok(models.into_iter().map(model_to_user).collect())
    }

    async fn update_activity(
        &self,
        cx: &TxContext,
        id: &UserId,
        is_active: bool,
    ) -> RepoResult<User> {
        let updated = on_executor!(self.tx.executor(cx), |db| {
            match user::Entity::find_by_id(id.as_str()).one(db).await? {
                Some(m) => {
                    let mut active: user::ActiveModel = m.into();
                    active.is_active = Set(is_active);
                    Ok(active.update(db).await?)
                }
                None => Err(RepoError::NotFound),
            }
        })?;

        Ok(model_to_user(updated))
    }
}

pub(crate) fn model_to_user(m: user::Model) -> User {
    User {
        id: UserId::new(m.id),
        name: m.name,
        is_active: m.is_active,
    }
}
