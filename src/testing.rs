//! In-memory fakes of the storage and cache ports for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

use crate::db::txmanager::{TxContext, TxManager};
use crate::db::DbPool;
use crate::models::{PrId, PrStatus, PullRequestRecord, TeamId, TeamRecord, User, UserId};
use crate::repository::{
    CounterCache, MemoryCounterCache, PullRequestStorage, RepoError, RepoResult, TeamStorage,
    UserStorage,
};

/// Transaction manager over a mock connection that records BEGIN/COMMIT/ROLLBACK.
pub fn mock_tx_manager() -> TxManager {
    TxManager::new(mock_pool())
}

pub fn mock_pool() -> DbPool {
    DbPool::from_connection(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    teams: Vec<TeamRecord>,
    memberships: Vec<(UserId, TeamId)>,
    pull_requests: Vec<PullRequestRecord>,
    reviewers: Vec<(PrId, UserId)>,
}

/// One fake backing all three storage ports so joins see the same rows.
///
/// Writes land immediately and ignore the transaction carried by the
/// context, so a rolled-back unit of work still leaves its rows here. Unit
/// tests check rollback through the mock transaction log only. That nothing
/// is left behind is checked against PostgreSQL in `tests/postgres_e2e`.
#[derive(Default)]
pub struct FakeStorage {
    state: Mutex<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashMap<&'static str, fn(&'static str) -> RepoError>>,
}

impl FakeStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enter(&self, op: &'static str) -> RepoResult<()> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        match self.failing.lock().unwrap().get(op) {
            Some(error) => Err(error(op)),
            None => Ok(()),
        }
    }

    /// Make every later call to `op` fail with a database error.
    pub fn fail_on(&self, op: &'static str) {
        self.failing
            .lock()
            .unwrap()
            .insert(op, |op| RepoError::Database(DbErr::Custom(format!("{} failed", op))));
    }

    /// Make every later call to `op` hit a unique key, as when a concurrent
    /// transaction inserted the same row first.
    pub fn collide_on(&self, op: &'static str) {
        self.failing
            .lock()
            .unwrap()
            .insert(op, |_| RepoError::AlreadyExists);
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn calls_of(&self, op: &str) -> usize {
        self.calls.lock().unwrap().get(op).copied().unwrap_or(0)
    }

    pub fn seed_user(&self, id: &str, is_active: bool) {
        self.state.lock().unwrap().users.push(User {
            id: UserId::from(id),
            name: format!("name-{}", id),
            is_active,
        });
    }

    /// Team with the given `(id, is_active)` members, in membership order.
    pub fn seed_team(&self, name: &str, members: &[(&str, bool)]) -> TeamId {
        for (id, is_active) in members {
            self.seed_user(id, *is_active);
        }
        let mut state = self.state.lock().unwrap();
        let id = TeamId(state.teams.len() as i64 + 1);
        state.teams.push(TeamRecord {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        });
        for (user, _) in members {
            state.memberships.push((UserId::from(*user), id));
        }
        id
    }

    pub fn seed_pull_request(&self, id: &str, author: &str, status: PrStatus, reviewers: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.pull_requests.push(PullRequestRecord {
            id: PrId::from(id),
            name: format!("name-{}", id),
            author_id: UserId::from(author),
            status,
            need_more_reviewers: true,
            created_at: Utc::now(),
            merged_at: status.is_merged().then(Utc::now),
        });
        for r in reviewers {
            state.reviewers.push((PrId::from(id), UserId::from(*r)));
        }
    }

    pub fn user(&self, id: &str) -> Option<User> {
        let state = self.state.lock().unwrap();
        state.users.iter().find(|u| u.id.as_str() == id).cloned()
    }

    pub fn pull_request(&self, id: &str) -> Option<PullRequestRecord> {
        let state = self.state.lock().unwrap();
        state.pull_requests.iter().find(|p| p.id.as_str() == id).cloned()
    }

    pub fn reviewer_ids(&self, pr: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .reviewers
            .iter()
            .filter(|(p, _)| p.as_str() == pr)
            .map(|(_, u)| u.to_string())
            .collect()
    }
}

impl State {
    fn members(&self, team: TeamId) -> Vec<User> {
        self.memberships
            .iter()
            .filter(|(_, t)| *t == team)
            .filter_map(|(u, _)| self.users.iter().find(|x| &x.id == u).cloned())
            .collect()
    }
}

#[async_trait]
impl UserStorage for FakeStorage {
    async fn create_user(&self, _cx: &TxContext, user: &User) -> RepoResult<()> {
        self.enter("create_user")?;
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.id == user.id) {
            return Err(RepoError::AlreadyExists);
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, _cx: &TxContext, id: &UserId) -> RepoResult<User> {
        self.enter("get_user_by_id")?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| &u.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_active_users_by_team(&self, _cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>> {
        self.enter("get_active_users_by_team")?;
        let state = self.state.lock().unwrap();
        Ok(state.members(team).into_iter().filter(|u| u.is_active).collect())
    }

    async fn update_activity(
        &self,
        _cx: &TxContext,
        id: &UserId,
        is_active: bool,
    ) -> RepoResult<User> {
        self.enter("update_activity")?;
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| &u.id == id)
            .ok_or(RepoError::NotFound)?;
        user.is_active = is_active;
        Ok(user.clone())
    }
}

#[async_trait]
impl TeamStorage for FakeStorage {
    async fn create_team(&self, _cx: &TxContext, name: &str) -> RepoResult<TeamRecord> {
        self.enter("create_team")?;
        let mut state = self.state.lock().unwrap();
        if state.teams.iter().any(|t| t.name == name) {
            return Err(RepoError::AlreadyExists);
        }
        let record = TeamRecord {
            id: TeamId(state.teams.len() as i64 + 1),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.teams.push(record.clone());
        Ok(record)
    }

    async fn get_team_by_id(&self, _cx: &TxContext, id: TeamId) -> RepoResult<TeamRecord> {
        self.enter("get_team_by_id")?;
        let state = self.state.lock().unwrap();
        state
            .teams
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_team_by_name(&self, _cx: &TxContext, name: &str) -> RepoResult<TeamRecord> {
        self.enter("get_team_by_name")?;
        let state = self.state.lock().unwrap();
        state
            .teams
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_team_by_user_id(&self, _cx: &TxContext, user: &UserId) -> RepoResult<TeamRecord> {
        self.enter("get_team_by_user_id")?;
        let state = self.state.lock().unwrap();
        let team = state
            .memberships
            .iter()
            .find(|(u, _)| u == user)
            .map(|(_, t)| *t)
            .ok_or(RepoError::NotFound)?;
        state
            .teams
            .iter()
            .find(|t| t.id == team)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn create_user_team_instance(
        &self,
        _cx: &TxContext,
        user: &UserId,
        team: TeamId,
    ) -> RepoResult<()> {
        self.enter("create_user_team_instance")?;
        let mut state = self.state.lock().unwrap();
        if state.memberships.iter().any(|(u, _)| u == user) {
            return Err(RepoError::AlreadyExists);
        }
        state.memberships.push((user.clone(), team));
        Ok(())
    }

    async fn get_users_by_team(&self, _cx: &TxContext, team: TeamId) -> RepoResult<Vec<User>> {
        self.enter("get_users_by_team")?;
        Ok(self.state.lock().unwrap().members(team))
    }
}

#[async_trait]
impl PullRequestStorage for FakeStorage {
    async fn create_pull_request(&self, _cx: &TxContext, pr: &PullRequestRecord) -> RepoResult<()> {
        self.enter("create_pull_request")?;
        let mut state = self.state.lock().unwrap();
        if state
            .pull_requests
            .iter()
            .any(|p| p.id == pr.id || p.name == pr.name)
        {
            return Err(RepoError::AlreadyExists);
        }
        state.pull_requests.push(pr.clone());
        Ok(())
    }

    async fn get_pull_request_by_id(
        &self,
        _cx: &TxContext,
        id: &PrId,
    ) -> RepoResult<PullRequestRecord> {
        self.enter("get_pull_request_by_id")?;
        let state = self.state.lock().unwrap();
        state
            .pull_requests
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn get_pull_requests_by_reviewer_id(
        &self,
        _cx: &TxContext,
        reviewer: &UserId,
    ) -> RepoResult<Vec<PullRequestRecord>> {
        self.enter("get_pull_requests_by_reviewer_id")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pull_requests
            .iter()
            .filter(|p| state.reviewers.iter().any(|(pr, u)| pr == &p.id && u == reviewer))
            .cloned()
            .collect())
    }

    async fn get_all_open_pull_requests(
        &self,
        _cx: &TxContext,
    ) -> RepoResult<Vec<PullRequestRecord>> {
        self.enter("get_all_open_pull_requests")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .pull_requests
            .iter()
            .filter(|p| p.status == PrStatus::Open)
            .cloned()
            .collect())
    }

    async fn update_pull_request_status(
        &self,
        _cx: &TxContext,
        id: &PrId,
        status: PrStatus,
    ) -> RepoResult<PullRequestRecord> {
        self.enter("update_pull_request_status")?;
        let mut state = self.state.lock().unwrap();
        let pr = state
            .pull_requests
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or(RepoError::NotFound)?;
        pr.status = status;
        if status.is_merged() {
            pr.merged_at = Some(Utc::now());
        }
        Ok(pr.clone())
    }

    async fn create_pr_reviewer_instance(
        &self,
        _cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()> {
        self.enter("create_pr_reviewer_instance")?;
        let mut state = self.state.lock().unwrap();
        if state.reviewers.iter().any(|(p, u)| p == pr && u == reviewer) {
            return Err(RepoError::AlreadyExists);
        }
        state.reviewers.push((pr.clone(), reviewer.clone()));
        Ok(())
    }

    async fn delete_pr_reviewer_instance(
        &self,
        _cx: &TxContext,
        pr: &PrId,
        reviewer: &UserId,
    ) -> RepoResult<()> {
        self.enter("delete_pr_reviewer_instance")?;
        let mut state = self.state.lock().unwrap();
        let before = state.reviewers.len();
        state.reviewers.retain(|(p, u)| !(p == pr && u == reviewer));
        if state.reviewers.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_reviewers_from_pr(&self, _cx: &TxContext, pr: &PrId) -> RepoResult<Vec<User>> {
        self.enter("get_reviewers_from_pr")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .reviewers
            .iter()
            .filter(|(p, _)| p == pr)
            .filter_map(|(_, u)| state.users.iter().find(|x| &x.id == u).cloned())
            .collect())
    }
}

/// Counter cache that can be switched into a failing state.
#[derive(Default)]
pub struct FakeCounterCache {
    inner: MemoryCounterCache,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl FakeCounterCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Current counter, zero when unset.
    pub async fn count(&self, user: &str) -> i64 {
        self.inner
            .get_assign_count(&UserId::from(user))
            .await
            .unwrap_or(0)
    }

    fn enter(&self) -> RepoResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(RepoError::Cache("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CounterCache for FakeCounterCache {
    async fn get_assign_count(&self, user: &UserId) -> RepoResult<i64> {
        self.enter()?;
        self.inner.get_assign_count(user).await
    }

    async fn set_assign_count(&self, user: &UserId, count: i64) -> RepoResult<()> {
        self.enter()?;
        self.inner.set_assign_count(user, count).await
    }

    async fn increment_assign_count(&self, user: &UserId) -> RepoResult<()> {
        self.enter()?;
        self.inner.increment_assign_count(user).await
    }

    async fn decrement_assign_count(&self, user: &UserId) -> RepoResult<()> {
        self.enter()?;
        self.inner.decrement_assign_count(user).await
    }

    async fn list_counted_users(&self) -> RepoResult<Vec<UserId>> {
        self.enter()?;
        self.inner.list_counted_users().await
    }
}

/// Everything a service test needs, wired over the fakes.
///
/// `tx` runs real BEGIN/COMMIT/ROLLBACK against a mock connection while the
/// storage fakes stay non-transactional, see [`FakeStorage`].
pub struct Harness {
    pub storage: Arc<FakeStorage>,
    pub cache: Arc<FakeCounterCache>,
    pub pool: DbPool,
    pub tx: Arc<TxManager>,
}

impl Harness {
    pub fn new() -> Self {
        let pool = mock_pool();
        Self {
            storage: FakeStorage::new(),
            cache: FakeCounterCache::new(),
            tx: Arc::new(TxManager::new(pool.clone())),
            pool,
        }
    }

    /// Debug rendering of the mock transaction log, drained on read.
    pub fn transaction_log(&self) -> String {
        let log = self.pool.clone().into_connection().into_transaction_log();
        format!("{:?}", log)
    }
}
