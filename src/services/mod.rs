//! Business logic services.

pub mod pull_requests;
pub mod selection;
pub mod stats;
pub mod teams;
pub mod users;

use std::sync::Arc;

use crate::db::txmanager::TxManager;
use crate::db::{DbPool, PgPullRequestStorage, PgTeamStorage, PgUserStorage};
use crate::repository::{CounterCache, PullRequestStorage, TeamStorage, UserStorage};

pub use pull_requests::ReviewerAssignmentService;
pub use selection::RngSource;
pub use stats::StatsService;
pub use teams::TeamService;
pub use users::UserService;

/// All services, shared by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub pool: DbPool,
    pub pull_requests: Arc<ReviewerAssignmentService>,
    pub teams: Arc<TeamService>,
    pub users: Arc<UserService>,
    pub stats: Arc<StatsService>,
}

impl AppServices {
    pub fn new(
        tx: Arc<TxManager>,
        users: Arc<dyn UserStorage>,
        teams: Arc<dyn TeamStorage>,
        pull_requests: Arc<dyn PullRequestStorage>,
        counters: Arc<dyn CounterCache>,
        rng: RngSource,
    ) -> Self {
        Self {
            pool: tx.pool().clone(),
            pull_requests: Arc::new(ReviewerAssignmentService::new(
                tx.clone(),
                users.clone(),
                teams.clone(),
                pull_requests.clone(),
                counters.clone(),
                rng,
            )),
            teams: Arc::new(TeamService::new(tx.clone(), teams.clone(), users.clone())),
            users: Arc::new(UserService::new(tx.clone(), users.clone(), teams)),
            stats: Arc::new(StatsService::new(tx, users, pull_requests, counters)),
        }
    }

    /// Services over the PostgreSQL storages.
    pub fn postgres(pool: DbPool, counters: Arc<dyn CounterCache>) -> Self {
        let tx = Arc::new(TxManager::new(pool));
        Self::new(
            tx.clone(),
            Arc::new(PgUserStorage::new(tx.clone())),
            Arc::new(PgTeamStorage::new(tx.clone())),
            Arc::new(PgPullRequestStorage::new(tx.clone())),
            counters,
            RngSource::entropy(),
        )
    }
}
