//! Assignment counter endpoints.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::RequestContext;
use crate::error::{AppResult, ErrorResponse};
use crate::models::{UserId, UserQuery, UserStats};
use crate::services::AppServices;

/// Optional reconciliation target.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReconcileQuery {
    /// Reconcile only this user; every open assignment when omitted.
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub reconciled: Vec<UserStats>,
}

/// Current assignment counter of a user.
#[utoipa::path(
    get,
    path = "/stats/assignments",
    tag = "Stats",
    params(("user_id" = String, Query, description = "User ID")),
    responses(
        (status = 200, description = "Assignment counter", body = UserStats),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[get("/stats/assignments")]
pub async fn get_assignments(
    cx: RequestContext,
    services: web::Data<AppServices>,
    query: web::Query<UserQuery>,
) -> AppResult<HttpResponse> {
    let user_id = UserId::from(query.into_inner().user_id);
    let stats = services.stats.get_assign_count(&cx, &user_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// Rebuild assignment counters from the open pull requests.
#[utoipa::path(
    post,
    path = "/stats/reconcile",
    tag = "Stats",
    params(ReconcileQuery),
    responses(
        (status = 200, description = "Counters rebuilt", body = ReconcileResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
#[post("/stats/reconcile")]
pub async fn reconcile(
    cx: RequestContext,
    services: web::Data<AppServices>,
    query: web::Query<ReconcileQuery>,
) -> AppResult<HttpResponse> {
    let reconciled = match query.into_inner().user_id {
        Some(user_id) => vec![
            services
                .stats
                .reconcile_user(&cx, &UserId::from(user_id))
                .await?,
        ],
        None => services.stats.reconcile_open_assignments(&cx).await?,
    };

    Ok(HttpResponse::Ok().json(ReconcileResponse { reconciled }))
}

/// Configure stats routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_assignments).service(reconcile);
}
