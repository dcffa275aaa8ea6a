//! Pull request endpoints.

use actix_web::{HttpResponse, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use super::RequestContext;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{
    CreatePullRequestRequest, MergePullRequestRequest, MergeResponse, PrId, PullRequestResponse,
    ReassignResponse, ReassignReviewerRequest, UserId,
};
use crate::services::AppServices;

/// Envelope around a single pull request.
#[derive(Debug, Serialize, ToSchema)]
pub struct PullRequestEnvelope {
    pub pr: PullRequestResponse,
}

/// Open a pull request and assign up to two reviewers from the author's team.
#[utoipa::path(
    post,
    path = "/pullRequest/create",
    tag = "Pull Requests",
    request_body = CreatePullRequestRequest,
    responses(
        (status = 201, description = "Pull request created", body = PullRequestEnvelope),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Author or author's team not found", body = ErrorResponse),
        (status = 409, description = "Pull request already exists", body = ErrorResponse)
    )
)]
#[post("/pullRequest/create")]
pub async fn create_pull_request(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<CreatePullRequestRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let pr = services
        .pull_requests
        .create_pr(
            &cx,
            &UserId::from(body.author_id),
            &PrId::from(body.pull_request_id),
            &body.pull_request_name,
        )
        .await?;

    Ok(HttpResponse::Created().json(PullRequestEnvelope { pr: pr.into() }))
}

/// Merge a pull request. Merging twice succeeds.
#[utoipa::path(
    post,
    path = "/pullRequest/merge",
    tag = "Pull Requests",
    request_body = MergePullRequestRequest,
    responses(
        (status = 200, description = "Pull request merged", body = MergeResponse),
        (status = 404, description = "Pull request not found", body = ErrorResponse)
    )
)]
#[post("/pullRequest/merge")]
pub async fn merge_pull_request(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<MergePullRequestRequest>,
) -> AppResult<HttpResponse> {
    let pr_id = PrId::from(body.into_inner().pull_request_id);
    let merged = services.pull_requests.merge_pr(&cx, &pr_id).await?;

    Ok(HttpResponse::Ok().json(MergeResponse {
        pr_id: merged.id.to_string(),
    }))
}

/// Replace one reviewer with an active member of the outgoing reviewer's team.
#[utoipa::path(
    post,
    path = "/pullRequest/reassign",
    tag = "Pull Requests",
    request_body = ReassignReviewerRequest,
    responses(
        (status = 200, description = "Reviewer replaced", body = ReassignResponse),
        (status = 404, description = "Pull request, user or assignment not found", body = ErrorResponse),
        (status = 409, description = "Pull request merged or no candidate available", body = ErrorResponse)
    )
)]
#[post("/pullRequest/reassign")]
pub async fn reassign_reviewer(
    cx: RequestContext,
    services: web::Data<AppServices>,
    body: web::Json<ReassignReviewerRequest>,
) -> AppResult<HttpResponse> {
    let body = body.into_inner();
    let pr_id = PrId::from(body.pull_request_id);
    let replacement = services
        .pull_requests
        .reassign_reviewer(&cx, &pr_id, &UserId::from(body.old_user_id))
        .await?;

    Ok(HttpResponse::Ok().json(ReassignResponse {
        pr_id: pr_id.to_string(),
        replaced_by: replacement.id.to_string(),
    }))
}

/// Configure pull request routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_pull_request)
        .service(merge_pull_request)
        .service(reassign_reviewer);
}
