//! Database module providing connection management, migrations, the
//! transaction manager and the PostgreSQL storage implementations.

pub mod pull_requests;
pub mod teams;
pub mod txmanager;
pub mod users;

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::config::Config;
use crate::migration::Migrator;

pub use pull_requests::PgPullRequestStorage;
pub use teams::PgTeamStorage;
pub use txmanager::{AccessMode, Executor, IsolationLevel, TxContext, TxError, TxManager};
pub use users::PgUserStorage;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct DbPool {
    conn: DatabaseConnection,
}

impl DbPool {
    /// Connect to PostgreSQL using the pool settings from configuration.
    pub async fn new(config: &Config) -> Result<Self, DbErr> {
        let db = &config.database;
        let mut options = ConnectOptions::new(db.url.clone());
        options
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .connect_timeout(Duration::from_secs(db.connect_timeout_secs))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        info!(
            max_connections = db.max_connections,
            min_connections = db.min_connections,
            "Connected to PostgreSQL"
        );

        Ok(Self { conn })
    }

    /// Wrap an existing connection (used with mock connections in tests).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub fn into_connection(self) -> DatabaseConnection {
        self.conn
    }

    /// Round trip to the database, used by the readiness probe.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.conn.execute_unprepared("SELECT 1").await?;
        Ok(())
    }

    /// Apply all pending migrations.
    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(&self.conn, None).await?;
        info!("Database migrations applied");
        Ok(())
    }
}
