//! Team creation and lookup.

use std::sync::Arc;

use tracing::{error, info};

use crate::db::txmanager::{AccessMode, IsolationLevel, TxContext, TxManager};
use crate::error::{AppError, AppResult};
use crate::models::{MAX_USER_ID_LEN, Team, TeamMember, User};
use crate::repository::{RepoError, TeamStorage, UserStorage};

pub struct TeamService {
    tx: Arc<TxManager>,
    teams: Arc<dyn TeamStorage>,
    users: Arc<dyn UserStorage>,
}

impl TeamService {
    pub fn new(tx: Arc<TxManager>, teams: Arc<dyn TeamStorage>, users: Arc<dyn UserStorage>) -> Self {
        Self { tx, teams, users }
    }

    /// Create a team together with its members in one transaction.
    ///
    /// Members that do not exist yet are created. An existing user may join
    /// only when they have no team.
    pub async fn create_team(
        &self,
        cx: &TxContext,
        name: &str,
        members: &[TeamMember],
    ) -> AppResult<Team> {
        if members.is_empty() {
            error!("No users provided for team creation: {}", name);
            return Err(AppError::NoUsersProvided);
        }
        if name.is_empty() {
            error!("Team name is empty");
            return Err(AppError::InvalidTeamName);
        }
        for member in members {
            if !member.user_id.is_valid() || member.username.is_empty() {
                error!(
                    "Invalid team member '{}' (ids are 1..={} bytes, names non-empty)",
                    member.user_id, MAX_USER_ID_LEN
                );
                return Err(AppError::InvalidUserId);
            }
        }

        let result = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadWrite,
                |cx| async move {
                    let record = self.teams.create_team(&cx, name).await.map_err(|e| match e {
                        RepoError::AlreadyExists => {
                            error!("Team already exists: {}", name);
                            AppError::TeamAlreadyExists
                        }
                        other => {
                            error!("Failed to create team {}: {}", name, other);
                            other.into()
                        }
                    })?;

                    let mut users = Vec::with_capacity(members.len());
                    for member in members {
                        let user = User {
                            id: member.user_id.clone(),
                            name: member.username.clone(),
                            is_active: member.is_active,
                        };
                        let user = self.provision_member(&cx, user).await?;

                        self.teams
                            .create_user_team_instance(&cx, &user.id, record.id)
                            .await
                            .map_err(|e| match e {
                                RepoError::AlreadyExists => {
                                    error!("User {} already has a team", user.id);
                                    AppError::UserAlreadyHasTeam
                                }
                                other => {
                                    error!(
                                        "Failed to add user {} to team {}: {}",
                                        user.id, record.id, other
                                    );
                                    other.into()
                                }
                            })?;
                        users.push(user);
                    }

                    Ok::<_, AppError>(Team::from_record(record, users))
                },
            )
            .await;

        match result {
            Ok(team) => {
                info!(
                    "Successfully created team {} with {} members",
                    team.name,
                    team.members.len()
                );
                Ok(team)
            }
            Err(e) => {
                error!("Transaction failed while creating team {}: {}", name, e);
                Err(e)
            }
        }
    }

    /// Team with all of its members.
    pub async fn get_team_by_name(&self, cx: &TxContext, name: &str) -> AppResult<Team> {
        if name.is_empty() {
            error!("Team name is empty");
            return Err(AppError::InvalidTeamName);
        }

        let team = self
            .tx
            .with_tx(
                cx,
                IsolationLevel::ReadCommitted,
                AccessMode::ReadOnly,
                |cx| async move {
                    let record = self.teams.get_team_by_name(&cx, name).await.map_err(|e| match e {
                        RepoError::NotFound => {
                            error!("Team not found: {}", name);
                            AppError::TeamNotFound
                        }
                        other => {
                            error!("Failed to get team {}: {}", name, other);
                            other.into()
                        }
                    })?;

                    let members = self.teams.get_users_by_team(&cx, record.id).await.map_err(|e| {
                        error!("Failed to get users of team {}: {}", record.id, e);
                        AppError::from(e)
                    })?;

                    Ok::<_, AppError>(Team::from_record(record, members))
                },
            )
            .await?;

        info!("Successfully retrieved team {}", name);
        Ok(team)
    }

    /// Create the member, or reuse an existing user that has no team yet.
    ///
    /// Existence is checked before inserting: a failed insert would poison
    /// the surrounding PostgreSQL transaction.
    async fn provision_member(&self, cx: &TxContext, user: User) -> AppResult<User> {
        match self.users.get_user_by_id(cx, &user.id).await {
            Ok(existing) => match self.teams.get_team_by_user_id(cx, &existing.id).await {
                Ok(team) => {
                    error!("User {} already belongs to team {}", existing.id, team.name);
                    Err(AppError::UserAlreadyHasTeam)
                }
                Err(RepoError::NotFound) => Ok(existing),
                Err(e) => {
                    error!("Failed to get team of user {}: {}", existing.id, e);
                    Err(e.into())
                }
            },
            Err(RepoError::NotFound) => {
                self.users.create_user(cx, &user).await.map_err(|e| match e {
                    RepoError::AlreadyExists => {
                        error!("User {} was created concurrently", user.id);
                        AppError::UserAlreadyHasTeam
                    }
                    other => {
                        error!("Failed to create user {}: {}", user.id, other);
                        other.into()
                    }
                })?;
                Ok(user)
            }
            Err(e) => {
                error!("Failed to get user {}: {}", user.id, e);
                Err(e.into())
            }
        }
    }
}
