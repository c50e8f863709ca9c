use actix_web::{web, HttpResponse, Result};
use serde_json::json;

use crate::models::auth::ApiResponse;
use crate::state::AppState;

/// Reports whether the backend service is reachable
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running"),
        (status = 503, description = "Backend unreachable")
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse> {
    let backend = state.gateway.backend_name();
    match state.gateway.ping().await {
        Ok(_) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Taskboard API is running",
            json!({
                "status": "ok",
                "backend": backend,
                "version": env!("CARGO_PKG_VERSION"),
            }),
        ))),
        Err(e) => {
            log::error!("Backend health check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(json!({
                "status": "error",
                "message": "Backend connection failed",
                "backend": backend,
                "error": e.to_string()
            })))
        }
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check));
}
