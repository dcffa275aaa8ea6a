//! Team endpoints.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::RequestContext;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{CreateTeamRequest, TeamQuery, TeamResponse};
use crate::services::AppServices;

/// Envelope around a single team.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamEnvelope {
    pub team: TeamResponse,
}

/// Create a team and its members in one unit of work.
#[utoipa::path(
    post,
    path = "/team/add",
    tag = "Teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Team exists or a member already has a team", body = ErrorResponse)
    )
)]
#[post("/team/add")]
pub async fn add_team(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<CreateTeamRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let team = services
        .teams
        .create_team(&cx, &body.team_name, &body.members)
        .await?;

    Ok(HttpResponse::Created().json(TeamEnvelope { team: team.into() }))
}

/// Get a team with its members.
#[utoipa::path(
    get,
    path = "/team/get",
    tag = "Teams",
    params(("team_name" = String, Query, description = "Team name")),
    responses(
        (status = 200, description = "Team found", body = TeamEnvelope),
        (status = 404, description = "Team not found", body = ErrorResponse)
    )
)]
#[get("/team/get")]
pub async fn get_team(
    cx: RequestContext,
    services: web::Data<AppServices>,
    query: web::Query<TeamQuery>,
) -> AppResult<HttpResponse> {
    let team = services.teams.get_team_by_name(&cx, &query.team_name).await?;
    Ok(HttpResponse::Ok().json(TeamEnvelope { team: team.into() }))
}

/// Configure team routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(add_team).service(get_team);
}
