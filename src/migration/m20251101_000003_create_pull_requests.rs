//! Migration: Create pull requests and reviewer assignments.

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
                CREATE TABLE pull_requests (
                    id VARCHAR(255) PRIMARY KEY,
                    name VARCHAR(255) NOT NULL UNIQUE,
                    author_id VARCHAR(255) NOT NULL REFERENCES users(id),
                    status VARCHAR(16) NOT NULL DEFAULT 'OPEN'
                        CHECK (status IN ('OPEN', 'MERGED')),
                    need_more_reviewers BOOLEAN NOT NULL DEFAULT TRUE,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    merged_at TIMESTAMPTZ
                );

                CREATE INDEX idx_pull_requests_open
                    ON pull_requests(created_at)
                    WHERE status = 'OPEN';

                CREATE TABLE pr_reviewers (
                    pr_id VARCHAR(255) NOT NULL REFERENCES pull_requests(id) ON DELETE CASCADE,
                    reviewer_id VARCHAR(255) NOT NULL REFERENCES users(id),
                    assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (pr_id, reviewer_id)
                );

                CREATE INDEX idx_pr_reviewers_reviewer_id ON pr_reviewers(reviewer_id);
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
                DROP TABLE IF EXISTS pr_reviewers CASCADE;
                DROP TABLE IF EXISTS pull_requests CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
