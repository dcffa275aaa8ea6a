//! OpenAPI documentation configuration.

use actix_web::{HttpResponse, get, web};
use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PR Reviewer Assignment Server",
        version = "0.1.0",
        description = "Assigns reviewers to pull requests from the author's team and tracks assignment counters"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Team endpoints
        api::teams::add_team,
        api::teams::get_team,
        // User endpoints
        api::users::create_user,
        api::users::get_user,
        api::users::set_is_active,
        api::users::deactivate_team,
        api::users::get_review,
        // Pull request endpoints
        api::pull_requests::create_pull_request,
        api::pull_requests::merge_pull_request,
        api::pull_requests::reassign_reviewer,
        // Stats endpoints
        api::stats::get_assignments,
        api::stats::reconcile,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Teams
            models::TeamMember,
            models::CreateTeamRequest,
            models::TeamResponse,
            api::teams::TeamEnvelope,
            // Users
            models::CreateUserRequest,
            models::SetIsActiveRequest,
            models::DeactivateTeamRequest,
            models::UserResponse,
            api::users::UserEnvelope,
            api::users::DeactivateTeamResponse,
            // Pull requests
            models::PrStatus,
            models::CreatePullRequestRequest,
            models::MergePullRequestRequest,
            models::ReassignReviewerRequest,
            models::PullRequestResponse,
            models::MergeResponse,
            models::ReassignResponse,
            models::ReviewListResponse,
            api::pull_requests::PullRequestEnvelope,
            // Stats
            models::UserStats,
            api::stats::ReconcileResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Teams", description = "Team creation and lookup"),
        (name = "Users", description = "User management and review lists"),
        (name = "Pull Requests", description = "Pull request lifecycle and reviewer assignment"),
        (name = "Stats", description = "Assignment counters")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document.
#[get("/openapi.json")]
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(openapi_json);
}
