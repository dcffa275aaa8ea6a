//! Assignment counter cache.
//!
//! Counters are best effort: they are bumped after the matching relational
//! write but are not part of its transaction.

mod memory;
mod redis_store;

use async_trait::async_trait;

use super::RepoResult;
use crate::models::UserId;

pub use memory::MemoryCounterCache;
pub use redis_store::RedisCounterCache;

#[async_trait]
pub trait CounterCache: Send + Sync {
    /// `NotFound` when no counter exists for the user.
    async fn get_assign_count(&self, user: &UserId) -> RepoResult<i64>;

    async fn set_assign_count(&self, user: &UserId, count: i64) -> RepoResult<()>;

    async fn increment_assign_count(&self, user: &UserId) -> RepoResult<()>;

    async fn decrement_assign_count(&self, user: &UserId) -> RepoResult<()>;

    /// Every user that currently holds a counter, in no particular order.
    async fn list_counted_users(&self) -> RepoResult<Vec<UserId>>;
}
