//! Redis-backed counters shared between instances.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::info;

use super::CounterCache;
use crate::models::UserId;
use crate::repository::{RepoError, RepoResult};

const KEY_PREFIX: &str = "assign_count:";

#[derive(Clone)]
pub struct RedisCounterCache {
    conn: ConnectionManager,
}

impl RedisCounterCache {
    /// Open a managed connection that reconnects on failure.
    pub async fn connect(url: &str) -> RepoResult<Self> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let conn = ConnectionManager::new(client).await.map_err(cache_err)?;
        info!("Connected to Redis");
        Ok(Self { conn })
    }

    fn key(user: &UserId) -> String {
        format!("{}{}", KEY_PREFIX, user)
    }

    fn user_of(key: &str) -> Option<UserId> {
        key.strip_prefix(KEY_PREFIX).map(UserId::from)
    }
}

fn cache_err(err: redis::RedisError) -> RepoError {
    RepoError::Cache(err.to_string())
}

#[async_trait]
impl CounterCache for RedisCounterCache {
    async fn get_assign_count(&self, user: &UserId) -> RepoResult<i64> {
        let mut conn = self.conn.clone();
        let count: Option<i64> = conn.get(Self::key(user)).await.map_err(cache_err)?;
        count.ok_or(RepoError::NotFound)
    }

    async fn set_assign_count(&self, user: &UserId, count: i64) -> RepoResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(Self::key(user), count).await.map_err(cache_err)?;
        Ok(())
    }

    async fn increment_assign_count(&self, user: &UserId) -> RepoResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.incr(Self::key(user), 1).await.map_err(cache_err)?;
        Ok(())
    }

    async fn decrement_assign_count(&self, user: &UserId) -> RepoResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.decr(Self::key(user), 1).await.map_err(cache_err)?;
        Ok(())
    }

    async fn list_counted_users(&self) -> RepoResult<Vec<UserId>> {
        let mut conn = self.conn.clone();
        let mut keys = conn
            .scan_match::<_, String>(format!("{}*", KEY_PREFIX))
            .await
            .map_err(cache_err)?;
        let mut users = Vec::new();
        while let Some(key) = keys.next_item().await {
            users.extend(Self::user_of(&key));
        }
        Ok(users)
    }
}
