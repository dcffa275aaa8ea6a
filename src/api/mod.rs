//! API endpoint modules.

pub mod health;
pub mod openapi;
pub mod pull_requests;
pub mod stats;
pub mod teams;
pub mod users;

use std::future::{Ready, ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{FromRequest, HttpRequest, web};
use tokio_util::sync::DropGuard;

use crate::db::txmanager::TxContext;
use crate::error::AppError;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use pull_requests::configure_routes as configure_pull_request_routes;
pub use stats::configure_routes as configure_stats_routes;
pub use teams::configure_routes as configure_team_routes;
pub use users::configure_routes as configure_user_routes;

/// Request-scoped unit-of-work context.
///
/// Cancelled when the handler future is dropped, e.g. on client disconnect.
pub struct RequestContext {
    cx: TxContext,
    _cancel_on_drop: DropGuard,
}

impl RequestContext {
    pub fn new() -> Self {
        let cx = TxContext::background();
        let guard = cx.cancellation().clone().drop_guard();
        Self {
            cx,
            _cancel_on_drop: guard,
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for RequestContext {
    type Target = TxContext;

    fn deref(&self) -> &TxContext {
        &self.cx
    }
}

impl FromRequest for RequestContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(_req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::new()))
    }
}

/// JSON extractor config answering malformed bodies with the error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req| {
        AppError::InvalidInput(format!("JSON parsing error: {}", err)).into()
    })
}

/// Query extractor config answering malformed query strings with the error envelope.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req| {
        AppError::InvalidInput(format!("Invalid query: {}", err)).into()
    })
}

/// Register every route of the service.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(openapi::configure_routes)
        .configure(configure_team_routes)
        .configure(configure_user_routes)
        .configure(configure_pull_request_routes)
        .configure(configure_stats_routes);
}
