//! E2E tests: transaction manager against PostgreSQL.

use std::sync::Arc;

use pr_reviewer_lib::db::{
    AccessMode, IsolationLevel, PgUserStorage, TxContext, TxError, TxManager,
};
use pr_reviewer_lib::error::AppError;
use pr_reviewer_lib::models::{User, UserId};
use pr_reviewer_lib::repository::{RepoError, UserStorage};

use super::helpers::*;

async fn setup() -> (Arc<TxManager>, PgUserStorage) {
    let pool = create_test_pool().await;
    let tx = Arc::new(TxManager::new(pool));
    let users = PgUserStorage::new(tx.clone());
    (tx, users)
}

fn user(id: &str) -> User {
    User {
        id: UserId::from(id),
        name: format!("name-{id}"),
        is_active: true,
    }
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_commit_is_visible_outside() {
    let (tx, users) = setup().await;
    let id = unique("u");
    let cx = TxContext::background();

    tx.with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
        let users = &users;
        let id = id.clone();
        async move {
            users.create_user(&cx, &user(&id)).await?;
            Ok::<_, AppError>(())
        }
    })
    .await
    .unwrap();

    let stored = users.get_user_by_id(&cx, &UserId::from(id.as_str())).await.unwrap();
    assert!(stored.is_active);
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_failing_outer_work_discards_nested_writes() {
    let (tx, users) = setup().await;
    let id = unique("u");
    let cx = TxContext::background();

    let result = tx
        .with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
            let (tx, users, id) = (&tx, &users, id.clone());
            async move {
                tx.with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
                    let id = id.clone();
                    async move {
                        users.create_user(&cx, &user(&id)).await?;
                        Ok::<_, AppError>(())
                    }
                })
                .await?;
                Err::<(), _>(AppError::NoAvailableActiveUserToAssign)
            }
        })
        .await;
    assert!(matches!(result, Err(AppError::NoAvailableActiveUserToAssign)));

    let lookup = users.get_user_by_id(&cx, &UserId::from(id.as_str())).await;
    assert!(matches!(lookup, Err(RepoError::NotFound)));
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_failing_inner_work_discards_outer_writes() {
    let (tx, users) = setup().await;
    let id = unique("u");
    let cx = TxContext::background();

    let result = tx
        .with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
            let (tx, users, id) = (&tx, &users, id.clone());
            async move {
                users.create_user(&cx, &user(&id)).await?;
                // Visible inside the shared transaction.
                users.get_user_by_id(&cx, &UserId::from(id.as_str())).await?;

                tx.with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |_cx| async {
                    Err::<(), _>(AppError::UserHasNoTeam)
                })
                .await
            }
        })
        .await;
    assert!(matches!(result, Err(AppError::UserHasNoTeam)));

    let lookup = users.get_user_by_id(&cx, &UserId::from(id.as_str())).await;
    assert!(matches!(lookup, Err(RepoError::NotFound)));
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_write_inside_read_only_is_rejected() {
    let (tx, users) = setup().await;
    let id = unique("u");
    let cx = TxContext::background();

    let result = tx
        .with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadOnly, |cx| {
            let (tx, users, id) = (&tx, &users, id.clone());
            async move {
                tx.with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
                    let id = id.clone();
                    async move {
                        users.create_user(&cx, &user(&id)).await?;
                        Ok::<_, AppError>(())
                    }
                })
                .await
            }
        })
        .await;
    assert!(matches!(
        result,
        Err(AppError::Transaction(TxError::ReadOnlyScope))
    ));

    let lookup = users.get_user_by_id(&cx, &UserId::from(id.as_str())).await;
    assert!(matches!(lookup, Err(RepoError::NotFound)));
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_cancelled_context_never_begins() {
    let (tx, users) = setup().await;
    let id = unique("u");
    let cx = TxContext::background();
    cx.cancellation().cancel();

    let result = tx
        .with_tx(&cx, IsolationLevel::ReadCommitted, AccessMode::ReadWrite, |cx| {
            let (users, id) = (&users, id.clone());
            async move {
                users.create_user(&cx, &user(&id)).await?;
                Ok::<_, AppError>(())
            }
        })
        .await;
    assert!(matches!(result, Err(AppError::Transaction(TxError::Cancelled))));

    let lookup = users
        .get_user_by_id(&TxContext::background(), &UserId::from(id.as_str()))
        .await;
    assert!(matches!(lookup, Err(RepoError::NotFound)));
}
