//! E2E tests: pull request lifecycle and reviewer replacement.

use pr_reviewer_lib::db::TxContext;
use pr_reviewer_lib::error::AppError;
use pr_reviewer_lib::models::{PrId, UserId};
use pr_reviewer_lib::repository::{CounterCache, RepoError};
use serde_json::{Value, json};

use super::helpers::*;

fn reviewers(body: &Value) -> Vec<String> {
    body["pr"]["assigned_reviewers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap().to_string())
        .collect()
}

async fn review_ids<S>(app: &S, user: &str) -> Vec<String>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let (status, body) = get_json(app, &format!("/users/getReview?user_id={user}")).await;
    assert_eq!(status, 200, "Review list should succeed: {:?}", body);
    body["pull_requests"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["pull_request_id"].as_str().unwrap().to_string())
        .collect()
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_create_merge_flow() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (a, b, c) = (unique("a"), unique("b"), unique("c"));
    create_team(&app, &unique("team"), &[&a, &b, &c]).await;
    let pr = unique("pr");

    let (status, body) = post_json(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": pr, "pull_request_name": "Add search", "author_id": a}),
    )
    .await;
    assert_eq!(status, 201, "Creation should succeed: {:?}", body);
    assert_eq!(body["pr"]["status"], "OPEN");

    let assigned = reviewers(&body);
    assert!((1..=2).contains(&assigned.len()));
    assert!(!assigned.contains(&a));
    for reviewer in &assigned {
        assert_eq!(
            ctx.counters
                .get_assign_count(&UserId::from(reviewer.as_str()))
                .await
                .unwrap(),
            1
        );
        assert_eq!(review_ids(&app, reviewer).await, vec![pr.clone()]);
    }

    for _ in 0..2 {
        let (status, body) =
            post_json(&app, "/pullRequest/merge", json!({"pull_request_id": pr})).await;
        assert_eq!(status, 200, "Merge should succeed: {:?}", body);
        assert_eq!(body["pr_id"], pr.as_str());
    }

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr, "old_user_id": assigned[0]}),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "PR_MERGED");
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_reassign_replaces_reviewer() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (a, b, c, d) = (unique("a"), unique("b"), unique("c"), unique("d"));
    create_team(&app, &unique("team"), &[&a, &b, &c, &d]).await;
    let pr = unique("pr");

    let (_, body) = post_json(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": pr, "pull_request_name": "Refactor", "author_id": a}),
    )
    .await;
    let before = reviewers(&body);
    let outgoing = before[0].clone();

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr, "old_user_id": outgoing}),
    )
    .await;
    assert_eq!(status, 200, "Reassign should succeed: {:?}", body);

    let replacement = body["replaced_by"].as_str().unwrap().to_string();
    assert_ne!(replacement, a);
    assert!(!before.contains(&replacement));
    assert!(review_ids(&app, &outgoing).await.is_empty());
    assert_eq!(review_ids(&app, &replacement).await, vec![pr.clone()]);
    assert_eq!(
        ctx.counters
            .get_assign_count(&UserId::from(replacement.as_str()))
            .await
            .unwrap(),
        1
    );
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_reassign_without_candidate_leaves_no_trace() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (a, b) = (unique("a"), unique("b"));
    create_team(&app, &unique("team"), &[&a, &b]).await;
    let pr = unique("pr");

    let (_, body) = post_json(
        &app,
        "/pullRequest/create",
        json!({"pull_request_id": pr, "pull_request_name": "Fix", "author_id": a}),
    )
    .await;
    assert_eq!(reviewers(&body), vec![b.clone()]);

    let (status, body) = post_json(
        &app,
        "/pullRequest/reassign",
        json!({"pull_request_id": pr, "old_user_id": b}),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "NO_CANDIDATE");

    // The removal was rolled back together with the failed replacement.
    assert_eq!(review_ids(&app, &b).await, vec![pr.clone()]);
    assert_eq!(
        ctx.counters
            .get_assign_count(&UserId::from(b.as_str()))
            .await
            .unwrap(),
        1
    );
    assert!(matches!(
        ctx.counters.get_assign_count(&UserId::from(a.as_str())).await,
        Err(RepoError::NotFound)
    ));
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_pull_request() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (a, b) = (unique("a"), unique("b"));
    create_team(&app, &unique("team"), &[&a, &b]).await;
    let pr = unique("pr");
    let body = json!({"pull_request_id": pr, "pull_request_name": "Once", "author_id": a});

    let (status, _) = post_json(&app, "/pullRequest/create", body.clone()).await;
    assert_eq!(status, 201);

    let (status, body) = post_json(&app, "/pullRequest/create", body).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "PR_EXISTS");
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_concurrent_reassignments_never_fail_internally() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (a, b, c, d) = (unique("a"), unique("b"), unique("c"), unique("d"));
    create_team(&app, &unique("team"), &[&a, &b, &c, &d]).await;

    for _ in 0..10 {
        let pr = unique("pr");
        let (status, body) = post_json(
            &app,
            "/pullRequest/create",
            json!({"pull_request_id": pr, "pull_request_name": "Race", "author_id": a}),
        )
        .await;
        assert_eq!(status, 201, "PR creation should succeed: {:?}", body);
        let assigned = reviewers(&body);
        assert_eq!(assigned.len(), 2);

        // Both requests may pick the one free member at the same time.
        let pr_id = PrId::from(pr.as_str());
        let first = UserId::from(assigned[0].as_str());
        let second = UserId::from(assigned[1].as_str());
        let (cx1, cx2) = (TxContext::background(), TxContext::background());
        let (r1, r2) = tokio::join!(
            ctx.services.pull_requests.reassign_reviewer(&cx1, &pr_id, &first),
            ctx.services.pull_requests.reassign_reviewer(&cx2, &pr_id, &second),
        );

        for result in [r1, r2] {
            match result {
                Ok(_) | Err(AppError::ReviewerAlreadyAssigned) => {}
                Err(other) => panic!("unexpected reassignment failure: {:?}", other),
            }
        }

        let mut current = Vec::new();
        for user in [&b, &c, &d] {
            if review_ids(&app, user).await.contains(&pr) {
                current.push(user.clone());
            }
        }
        assert_eq!(current.len(), 2, "reviewers of {pr} after the race: {current:?}");
    }
}
