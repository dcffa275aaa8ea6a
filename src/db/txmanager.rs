//! Unit-of-work execution over the connection pool.
//!
//! Every service call runs its storage work through [`TxManager::with_tx`]. The
//! open transaction travels inside a [`TxContext`] that is passed explicitly to
//! the storage ports, which resolve it back into an [`Executor`] with
//! [`TxManager::executor`]. Nested `with_tx` calls on a context that already
//! carries a transaction reuse it, so a unit of work always maps onto exactly
//! one physical transaction.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::DbPool;

/// Transaction isolation level, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl From<IsolationLevel> for sea_orm::IsolationLevel {
    fn from(level: IsolationLevel) -> Self {
        match level {
            IsolationLevel::ReadUncommitted => sea_orm::IsolationLevel::ReadUncommitted,
            IsolationLevel::ReadCommitted => sea_orm::IsolationLevel::ReadCommitted,
            IsolationLevel::RepeatableRead => sea_orm::IsolationLevel::RepeatableRead,
            IsolationLevel::Serializable => sea_orm::IsolationLevel::Serializable,
        }
    }
}

/// Transaction access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl From<AccessMode> for sea_orm::AccessMode {
    fn from(mode: AccessMode) -> Self {
        match mode {
            AccessMode::ReadOnly => sea_orm::AccessMode::ReadOnly,
            AccessMode::ReadWrite => sea_orm::AccessMode::ReadWrite,
        }
    }
}

/// Failures of the transaction machinery itself (never of the work).
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] DbErr),

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] DbErr),

    #[error("transaction cancelled")]
    Cancelled,

    #[error("unit of work panicked: {0}")]
    Panicked(String),

    #[error("read-write work requested inside a read-only transaction")]
    ReadOnlyScope,

    #[error("transaction context outlived its unit of work")]
    ScopeLeaked,
}

/// Open transaction plus the settings it was started with.
struct ActiveTx {
    txn: DatabaseTransaction,
    isolation: IsolationLevel,
    mode: AccessMode,
}

/// Request-scoped handle threaded through services and storage ports.
///
/// Carries the cancellation token for the request and, inside a unit of
/// work, the transaction that storage calls must run on.
#[derive(Clone)]
pub struct TxContext {
    cancel: CancellationToken,
    active: Option<Arc<ActiveTx>>,
}

impl TxContext {
    /// Context with no transaction and its own cancellation token.
    pub fn background() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            active: None,
        }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn in_transaction(&self) -> bool {
        self.active.is_some()
    }

    /// Isolation and access mode of the carried transaction, if any.
    pub fn transaction_settings(&self) -> Option<(IsolationLevel, AccessMode)> {
        self.active.as_ref().map(|a| (a.isolation, a.mode))
    }

    fn child(&self, active: Arc<ActiveTx>) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            active: Some(active),
        }
    }
}

impl fmt::Debug for TxContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxContext")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("transaction", &self.transaction_settings())
            .finish()
    }
}

/// Connection a storage statement should run on.
#[derive(Clone, Copy)]
pub enum Executor<'a> {
    /// No unit of work is active; statements autocommit on the pool.
    Pool(&'a DatabaseConnection),
    /// Statements join the caller's transaction.
    Tx(&'a DatabaseTransaction),
}

impl Executor<'_> {
    pub fn is_transaction(&self) -> bool {
        matches!(self, Self::Tx(_))
    }
}

/// Runs `$body` with `$db` bound to the connection behind an [`Executor`].
macro_rules! on_executor {
    ($exec:expr, |$db:ident| $body:expr) => {
        match $exec {
            $crate::db::txmanager::Executor::Pool($db) => $body,
            $crate::db::txmanager::Executor::Tx($db) => $body,
        }
    };
}

pub(crate) use on_executor;

enum Outcome<T, E> {
    Finished(Result<T, E>),
    Cancelled,
    Panicked(String),
}

/// Executes units of work on the pool. Holds nothing but the pool.
#[derive(Clone)]
pub struct TxManager {
    pool: DbPool,
}

impl TxManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// The ambient transaction of `cx`, or the pool when there is none.
    pub fn executor<'a>(&'a self, cx: &'a TxContext) -> Executor<'a> {
        match &cx.active {
            Some(active) => Executor::Tx(&active.txn),
            None => Executor::Pool(self.pool.connection()),
        }
    }

    /// Run `work` inside one transaction.
    ///
    /// Commits when `work` returns `Ok`, rolls back on `Err`, panic or
    /// cancellation. When `cx` already carries a transaction, `work` joins it
    /// and the outermost call decides the outcome.
    pub async fn with_tx<T, E, F, Fut>(
        &self,
        cx: &TxContext,
        isolation: IsolationLevel,
        mode: AccessMode,
        work: F,
    ) -> Result<T, E>
    where
        F: FnOnce(TxContext) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<TxError>,
    {
        if let Some((outer_isolation, outer_mode)) = cx.transaction_settings() {
            if outer_mode == AccessMode::ReadOnly && mode == AccessMode::ReadWrite {
                error!("Nested read-write work requested inside a read-only transaction");
                return Err(TxError::ReadOnlyScope.into());
            }
            if isolation > outer_isolation {
                warn!(
                    requested = ?isolation,
                    active = ?outer_isolation,
                    "Nested transaction asked for stronger isolation, keeping the outer level"
                );
            }
            debug!("Joining active transaction");
            return work(cx.clone()).await;
        }

        if cx.is_cancelled() {
            return Err(TxError::Cancelled.into());
        }

        let txn = self
            .pool
            .connection()
            .begin_with_config(Some(isolation.into()), Some(mode.into()))
            .await
            .map_err(|e| {
                error!("Failed to begin transaction: {}", e);
                TxError::Begin(e)
            })?;
        debug!(isolation = ?isolation, mode = ?mode, "Transaction started");

        let active = Arc::new(ActiveTx {
            txn,
            isolation,
            mode,
        });
        let child = cx.child(Arc::clone(&active));
        let cancel = child.cancel.clone();

        let outcome = {
            let work = AssertUnwindSafe(work(child)).catch_unwind();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Outcome::Cancelled,
                result = work => match result {
                    Ok(result) => Outcome::Finished(result),
                    Err(payload) => Outcome::Panicked(panic_message(payload)),
                },
            }
        };

        let txn = match Arc::try_unwrap(active) {
            Ok(active) => active.txn,
            Err(_) => {
                // Dropping the last clone elsewhere rolls the transaction back.
                error!("Transaction context escaped its unit of work");
                return Err(TxError::ScopeLeaked.into());
            }
        };

        match outcome {
            Outcome::Finished(Ok(value)) => {
                txn.commit().await.map_err(|e| {
                    error!("Failed to commit transaction: {}", e);
                    TxError::Commit(e)
                })?;
                debug!("Transaction committed");
                Ok(value)
            }
            Outcome::Finished(Err(err)) => {
                rollback(txn).await;
                Err(err)
            }
            Outcome::Cancelled => {
                warn!("Transaction cancelled, rolling back");
                rollback(txn).await;
                Err(TxError::Cancelled.into())
            }
            Outcome::Panicked(message) => {
                error!(panic = %message, "Unit of work panicked, rolling back");
                rollback(txn).await;
                Err(TxError::Panicked(message).into())
            }
        }
    }
}

async fn rollback(txn: DatabaseTransaction) {
    match txn.rollback().await {
        Ok(()) => debug!("Transaction rolled back"),
        Err(e) => error!("Failed to roll back transaction: {}", e),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
