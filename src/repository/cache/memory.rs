//! In-process counters for single-instance deployments and tests.

use async_trait::async_trait;
use dashmap::DashMap;

use super::CounterCache;
use crate::models::UserId;
use crate::repository::{RepoError, RepoResult};

#[derive(Debug, Default)]
pub struct MemoryCounterCache {
    counts: DashMap<String, i64>,
}

impl MemoryCounterCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterCache for MemoryCounterCache {
    async fn get_assign_count(&self, user: &UserId) -> RepoResult<i64> {
        self.counts
            .get(user.as_str())
            .map(|c| *c)
            .ok_or(RepoError::NotFound)
    }

    async fn set_assign_count(&self, user: &UserId, count: i64) -> RepoResult<()> {
        self.counts.insert(user.as_str().to_string(), count);
        Ok(())
    }

    async fn increment_assign_count(&self, user: &UserId) -> RepoResult<()> {
        *self.counts.entry(user.as_str().to_string()).or_insert(0) += 1;
        Ok(())
    }

    async fn decrement_assign_count(&self, user: &UserId) -> RepoResult<()> {
        *self.counts.entry(user.as_str().to_string()).or_insert(0) -= 1;
        Ok(())
    }

    async fn list_counted_users(&self) -> RepoResult<Vec<UserId>> {
        Ok(self
            .counts
            .iter()
            .map(|entry| UserId::from(entry.key().as_str()))
            .collect())
    }
}
