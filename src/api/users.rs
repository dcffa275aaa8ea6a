//! User endpoints.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::RequestContext;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{
    CreateUserRequest, DeactivateTeamRequest, PullRequestResponse, ReviewListResponse,
    SetIsActiveRequest, UserId, UserQuery, UserResponse,
};
use crate::services::AppServices;

/// Envelope around a single user.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

/// Members deactivated together with their team.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeactivateTeamResponse {
    pub team_name: String,
    pub users: Vec<UserResponse>,
}

/// Create an active user without a team.
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse)
    )
)]
#[post("/users")]
pub async fn create_user(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<CreateUserRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let user = services
        .users
        .create_user(&cx, &UserId::from(body.user_id), &body.username)
        .await?;

    Ok(HttpResponse::Created().json(UserEnvelope { user: user.into() }))
}

#[utoipa::path(
    get,
    path = "/users/get",
    tag = "Users",
    params(("user_id" = String, Query, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserEnvelope),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[get("/users/get")]
pub async fn get_user(
    cx: RequestContext,
    services: web::Data<AppServices>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    let user = services
        .users
        .get_user_by_id(&cx, &UserId::from(query.user_id.as_str()))
        .await?;
    Ok(HttpResponse::Ok().json(UserEnvelope { user: user.into() }))
}

/// Toggle whether a user may be picked as reviewer.
#[utoipa::path(
    post,
    path = "/users/setIsActive",
    tag = "Users",
    request_body = SetIsActiveRequest,
    responses(
        (status = 200, description = "Activity updated", body = UserEnvelope),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[post("/users/setIsActive")]
pub async fn set_is_active(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<SetIsActiveRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let user = services
        .users
        .update_user_activity(&cx, &UserId::from(body.user_id), body.is_active)
        .await?;
    Ok(HttpResponse::Ok().json(UserEnvelope { user: user.into() }))
}

/// Deactivate every member of a team.
#[utoipa::path(
    post,
    path = "/users/deactivateTeam",
    tag = "Users",
    request_body = DeactivateTeamRequest,
    responses(
        (status = 200, description = "Members deactivated", body = DeactivateTeamResponse),
        (status = 404, description = "Team not found or empty", body = ErrorResponse)
    )
)]
#[post("/users/deactivateTeam")]
pub async fn deactivate_team(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<DeactivateTeamRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let users = services
        .users
        .deactivate_users_by_team_name(&cx, &body.team_name)
        .await?;

    Ok(HttpResponse::Ok().json(DeactivateTeamResponse {
        team_name: body.team_name,
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Pull requests the user is assigned to review.
#[utoipa::path(
    get,
    path = "/users/getReview",
    tag = "Users",
    params(("user_id" = String, Query, description = "Reviewer ID")),
    responses(
        (status = 200, description = "Assigned pull requests", body = ReviewListResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[get("/users/getReview")]
pub async fn get_review(
    cx: RequestContext,
    services: web::Data<AppServices>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    let user_id = UserId::from(query.into_inner().user_id);
    let prs = services.pull_requests.get_prs_by_user(&cx, &user_id).await?;

    Ok(HttpResponse::Ok().json(ReviewListResponse {
        user_id: user_id.to_string(),
        pull_requests: prs.into_iter().map(PullRequestResponse::from).collect(),
    }))
}

/// Configure user routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_user)
        .service(get_user)
        .service(set_is_active)
        .service(deactivate_team)
        .service(get_review);
}
