use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::auth::{ApiResponse, Identity, LoginRequest, LoginResponseData, SignUpRequest};
use crate::models::Profile;
use crate::services::account;
use crate::session::Session;
use crate::state::AppState;
use crate::utils::errors::ServiceError;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: Identity,
    pub profile: Profile,
}

/// Create an account
#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<LoginResponseData>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::models::ErrorResponse)
    )
)]
pub async fn signup(
    state: web::Data<AppState>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/auth/signup - Sign up attempt for: {}", request.email);
    let data = account::sign_up(state.gateway.as_ref(), request.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("Account created", data)))
}

/// User login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponseData>),
        (status = 401, description = "Invalid credentials", body = crate::models::ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/auth/login - Login attempt for: {}", request.email);
    let data = account::sign_in(state.gateway.as_ref(), request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Login successful", data)))
}

/// User logout endpoint
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Logout successful", body = ApiResponse<bool>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn logout(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/auth/logout");
    account::sign_out(session).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Successfully logout from the system", true)))
}

/// Get current user information
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "User information retrieved", body = ApiResponse<MeResponse>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_me(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/auth/me");
    let profile = account::profile(&session).await?;
    let data = MeResponse {
        user: session.identity().clone(),
        profile,
    };
    Ok(HttpResponse::Ok().json(ApiResponse::success("Successfully retrieved user data", data)))
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(get_me)),
    );
}
