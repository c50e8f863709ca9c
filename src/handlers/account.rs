use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result};

use crate::handlers::file::read_upload;
use crate::models::auth::ApiResponse;
use crate::models::file::UploadFileRequest;
use crate::models::profile::UpdateProfileRequest;
use crate::models::Profile;
use crate::services::account;
use crate::session::Session;
use crate::state::AppState;
use crate::utils::errors::ServiceError;

/// Get the current user's profile
#[utoipa::path(
    get,
    path = "/api/account",
    tag = "account",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = ApiResponse<Profile>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_account(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/account");
    let profile = account::profile(&session).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile retrieved successfully", profile)))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/api/account",
    tag = "account",
    security(
        ("bearer_auth" = [])
    ),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated successfully", body = ApiResponse<Profile>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn update_account(
    session: Session,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("PUT /api/account");
    let profile = account::update_profile(&session, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Profile updated successfully", profile)))
}

/// Upload a new avatar image
#[utoipa::path(
    post,
    path = "/api/account/avatar",
    tag = "account",
    security(
        ("bearer_auth" = [])
    ),
    request_body(
        content = inline(UploadFileRequest),
        description = "Image to upload as multipart/form-data",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 200, description = "Avatar updated successfully", body = ApiResponse<Profile>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn upload_avatar(
    session: Session,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/account/avatar");
    let upload = read_upload(payload, state.uploads.max_bytes).await?;
    let profile = account::upload_avatar(&session, upload, &state.uploads).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Avatar updated successfully", profile)))
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/account")
            .route("", web::get().to(get_account))
            .route("", web::put().to(update_account))
            .route("/avatar", web::post().to(upload_avatar)),
    );
}
