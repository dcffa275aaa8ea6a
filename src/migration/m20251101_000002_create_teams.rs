//! Migration: Create teams and memberships.
//!
//! The primary key on `user_teams.user_id` keeps a user in at most one team.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE teams (
                    id BIGSERIAL PRIMARY KEY,
                    team_name VARCHAR(255) NOT NULL UNIQUE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE TABLE user_teams (
                    user_id VARCHAR(255) PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                    team_id BIGINT NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
                    joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_user_teams_team_id ON user_teams(team_id, joined_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TABLE IF EXISTS user_teams CASCADE;
                DROP TABLE IF EXISTS teams CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
