//! User creation, lookup and activity management.

use std::sync::Arc;

use tracing::{error, info};

use crate::db::txmanager::{AccessMode, IsolationLevel, TxContext, TxManager};
use crate::error::{AppError, AppResult};
use crate::models::{User, UserId};
use crate::repository::{RepoError, TeamStorage, UserStorage};

pub struct UserService {
    tx: Arc<TxManager>,
    users: Arc<dyn UserStorage>,
    teams: Arc<dyn TeamStorage>,
}

impl UserService {
    pub fn new(tx: Arc<TxManager>, users: Arc<dyn UserStorage>, teams: Arc<dyn TeamStorage>) -> Self {
        Self { tx, users, teams }
    }

    /// Create an active user that belongs to no team.
    pub async fn create_user(&self, cx: &TxContext, id: &UserId, name: &str) -> AppResult<User> {
        if !id.is_valid() {
            error!("Invalid user ID: '{}'", id);
            return Err(AppError::InvalidUserId);
        }
        if name.is_empty() {
            error!("Username is empty for user {}", id);
            return Err(AppError::InvalidInput("username must not be empty".to_string()));
        }

        let user = User {
            id: id.clone(),
            name: name.to_string(),
            is_active: true,
        };

        self.tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| {
                    let user = &user;
                    async move {
                        self.users.create_user(&cx, user).await.map_err(|e| {
                            error!("Failed to create user {}: {}", user.id, e);
                            match e {
                                RepoError::AlreadyExists => AppError::UserAlreadyExists,
                                other => other.into(),
                            }
                        })
                    }
                },
            )
            .await?;

        info!("Successfully created user {}", id);
        Ok(user)
    }

    pub async fn get_user_by_id(&self, cx: &TxContext, id: &UserId) -> AppResult<User> {
        if id.is_empty() {
            error!("User ID is empty");
            return Err(AppError::InvalidUserId);
        }

        let user = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move { self.find_user(&cx, id).await },
            )
            .await?;

        info!("Successfully retrieved user {}", id);
        Ok(user)
    }

    pub async fn update_user_activity(
        &self,
        cx: &TxContext,
        id: &UserId,
        is_active: bool,
    ) -> AppResult<User> {
        if id.is_empty() {
            error!("User ID is empty");
            return Err(AppError::InvalidUserId);
        }

        let user = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let user = self.find_user(&cx, id).await?;
                    self.users
                        .update_activity(&cx, &user.id, is_active)
                        .await
                        .map_err(|e| {
                            error!("Failed to update activity of user {}: {}", id, e);
                            AppError::from(e)
                        })
                },
            )
            .await?;

        info!("Successfully set is_active={} for user {}", is_active, id);
        Ok(user)
    }

    /// Mark every member of the team inactive and return them.
    pub async fn deactivate_users_by_team_name(
        &self,
        cx: &TxContext,
        team_name: &str,
    ) -> AppResult<Vec<User>> {
        if team_name.is_empty() {
            error!("Team name is empty");
            return Err(AppError::InvalidTeamName);
        }

        let deactivated = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let team = self
                        .teams
                        .get_team_by_name(&cx, team_name)
                        .await
                        .map_err(|e| match e {
                            RepoError::NotFound => {
                                error!("Team not found: {}", team_name);
                                AppError::TeamNotFound
                            }
                            other => {
                                error!("Failed to get team {}: {}", team_name, other);
                                other.into()
                            }
                        })?;

                    let members = self.teams.get_users_by_team(&cx, team.id).await.map_err(|e| {
                        error!("Failed to get users of team {}: {}", team_name, e);
                        AppError::from(e)
                    })?;

                    if members.is_empty() {
                        info!("No users found for team {}", team_name);
                        return Err(AppError::NoUsersInTeam);
                    }

                    let mut deactivated = Vec::with_capacity(members.len());
                    for member in members {
                        let user = self
                            .users
                            .update_activity(&cx, &member.id, false)
                            .await
                            .map_err(|e| {
                                error!("Failed to deactivate user {}: {}", member.id, e);
                                AppError::from(e)
                            })?;
                        deactivated.push(user);
                    }
                    Ok(deactivated)
                },
            )
            .await;

        match deactivated {
            Ok(users) => {
                info!("Successfully deactivated {} users of team {}", users.len(), team_name);
                Ok(users)
            }
            Err(e) => {
                error!(
                    "Transaction failed while deactivating users of team {}: {}",
                    team_name, e
                );
                Err(e)
            }
        }
    }

    async fn find_user(&self, cx: &TxContext, id: &UserId) -> AppResult<User> {
        self.users.get_user_by_id(cx, id).await.map_err(|e| match e {
            RepoError::NotFound => {
                error!("User not found: {}", id);
                AppError::UserNotFound
            }
            other => {
                error!("Failed to get user {}: {}", id, other);
                other.into()
            }
        })
    }
}
