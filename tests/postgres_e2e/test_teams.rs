//! E2E tests: team creation and membership atomicity.

use serde_json::json;

use super::helpers::*;

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_create_and_get_team() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let team = unique("team");
    let (a, b) = (unique("a"), unique("b"));

    create_team(&app, &team, &[&a, &b]).await;

    let (status, body) = get_json(&app, &format!("/team/get?team_name={team}")).await;
    assert_eq!(status, 200, "Team lookup should succeed: {:?}", body);
    let members: Vec<&str> = body["team"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["user_id"].as_str().unwrap())
        .collect();
    assert_eq!(members, vec![a.as_str(), b.as_str()]);
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_member_conflict_leaves_no_trace() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let (first, second) = (unique("first"), unique("second"));
    let (taken, fresh) = (unique("taken"), unique("fresh"));

    create_team(&app, &first, &[&taken]).await;

    let (status, body) = post_json(
        &app,
        "/team/add",
        json!({
            "team_name": second,
            "members": [
                {"user_id": fresh, "username": "fresh"},
                {"user_id": taken, "username": "taken"}
            ]
        }),
    )
    .await;
    assert_eq!(status, 409, "Conflict expected: {:?}", body);
    assert_eq!(body["error"], "USER_HAS_TEAM");

    let (status, _) = get_json(&app, &format!("/team/get?team_name={second}")).await;
    assert_eq!(status, 404, "Team must not exist after rollback");

    let (status, _) = get_json(&app, &format!("/users/get?user_id={fresh}")).await;
    assert_eq!(status, 404, "Member must not exist after rollback");
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_duplicate_team_name() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let team = unique("team");

    create_team(&app, &team, &[&unique("a")]).await;

    let (status, body) = post_json(
        &app,
        "/team/add",
        json!({"team_name": team, "members": [{"user_id": unique("b"), "username": "b"}]}),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "TEAM_EXISTS");
}

#[actix_rt::test]
#[ignore = "requires a live PostgreSQL (DATABASE_URL)"]
async fn test_deactivate_team() {
    let ctx = create_test_services().await;
    let app = create_test_app(&ctx.services).await;
    let team = unique("team");
    let (a, b) = (unique("a"), unique("b"));

    create_team(&app, &team, &[&a, &b]).await;

    let (status, body) = post_json(&app, "/users/deactivateTeam", json!({"team_name": team})).await;
    assert_eq!(status, 200, "Deactivation should succeed: {:?}", body);

    for id in [&a, &b] {
        let (_, body) = get_json(&app, &format!("/users/get?user_id={id}")).await;
        assert_eq!(body["user"]["is_active"], false);
    }
}
