use actix_web::{web, HttpResponse, Result};
use chrono::Utc;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::board::calendar::CalendarEvent;
use crate::board::dashboard::DashboardSummary;
use crate::models::auth::ApiResponse;
use crate::services::overview;
use crate::session::Session;
use crate::utils::errors::ServiceError;

#[derive(Debug, Deserialize, IntoParams)]
pub struct CalendarQuery {
    /// Limits events to this year; requires `month`.
    pub year: Option<i32>,
    /// 1-12; requires `year`.
    pub month: Option<u32>,
}

/// Dashboard summary for the current user
#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "views",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Dashboard retrieved successfully", body = ApiResponse<DashboardSummary>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_dashboard(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/dashboard");
    let summary = overview::dashboard(&session, Utc::now().date_naive()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Dashboard retrieved successfully", summary)))
}

/// Calendar events for open tasks with a due date
#[utoipa::path(
    get,
    path = "/api/calendar",
    tag = "views",
    security(
        ("bearer_auth" = [])
    ),
    params(CalendarQuery),
    responses(
        (status = 200, description = "Events retrieved successfully", body = ApiResponse<Vec<CalendarEvent>>),
        (status = 400, description = "Invalid month", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_calendar(
    session: Session,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/calendar");
    let month = match (query.year, query.month) {
        (Some(year), Some(month)) => Some((year, month)),
        (None, None) => None,
        _ => {
            return Err(ServiceError::ValidationError(
                "year and month must be given together".to_string(),
            ))
        }
    };
    let events = overview::calendar(&session, month).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Events retrieved successfully", events)))
}

pub fn overview_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/dashboard", web::get().to(get_dashboard))
        .route("/api/calendar", web::get().to(get_calendar));
}
