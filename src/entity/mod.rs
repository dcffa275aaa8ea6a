//! SeaORM entity definitions for PostgreSQL database.

pub mod pr_reviewer;
pub mod pull_request;
pub mod team;
pub mod user;
pub mod user_team;
