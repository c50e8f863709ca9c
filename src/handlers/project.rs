use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::handlers::file::read_upload;
use crate::models::auth::ApiResponse;
use crate::models::file::UploadFileRequest;
use crate::models::project::{ProjectDetail, ProjectForm, UpdateProjectRequest};
use crate::models::Project;
use crate::services::projects;
use crate::session::Session;
use crate::state::AppState;
use crate::utils::errors::ServiceError;

/// List the current user's projects, newest first
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Projects retrieved successfully", body = ApiResponse<Vec<Project>>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_projects(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/projects");
    let projects = projects::list(&session).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Projects retrieved successfully", projects)))
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    security(
        ("bearer_auth" = [])
    ),
    request_body = ProjectForm,
    responses(
        (status = 201, description = "Project created successfully", body = ApiResponse<Project>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_project(
    session: Session,
    form: web::Json<ProjectForm>,
) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/projects - Creating new project: {}", form.title);
    let project = projects::create(&session, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("Project created successfully", project)))
}

/// Get a project with its tasks and board
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    tag = "projects",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project retrieved successfully", body = ApiResponse<ProjectDetail>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_project(session: Session, path: web::Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("GET /api/projects/{}", id);
    let detail = projects::detail(&session, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Project retrieved successfully", detail)))
}

/// Update a project
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated successfully", body = ApiResponse<Project>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn update_project(
    session: Session,
    path: web::Path<Uuid>,
    request: web::Json<UpdateProjectRequest>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("PUT /api/projects/{}", id);
    let project = projects::update(&session, id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Project updated successfully", project)))
}

/// Delete a project and its tasks
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Project ID")
    ),
    responses(
        (status = 200, description = "Project deleted successfully", body = ApiResponse<bool>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn delete_project(session: Session, path: web::Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("DELETE /api/projects/{}", id);
    projects::delete(&session, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Project deleted successfully", true)))
}

/// Upload a file attachment to a project
#[utoipa::path(
    post,
    path = "/api/projects/{id}/attachments",
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Project ID to attach file to")
    ),
    request_body(
        content = inline(UploadFileRequest),
        description = "File to upload as multipart/form-data",
        content_type = "multipart/form-data"
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = ApiResponse<Project>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn upload_attachment(
    session: Session,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("POST /api/projects/{}/attachments - Uploading file", id);
    let upload = read_upload(payload, state.uploads.max_bytes).await?;
    let project = projects::add_attachment(&session, id, upload, &state.uploads).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("File uploaded successfully", project)))
}

/// Remove a file attachment from a project
#[utoipa::path(
    delete,
    path = "/api/projects/{id}/attachments/{index}",
    tag = "attachments",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("index" = usize, Path, description = "Position of the attachment in the project's list")
    ),
    responses(
        (status = 200, description = "Attachment deleted successfully", body = ApiResponse<Project>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Attachment not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn delete_attachment(
    session: Session,
    path: web::Path<(Uuid, usize)>,
) -> Result<HttpResponse, ServiceError> {
    let (id, index) = path.into_inner();
    log::info!("DELETE /api/projects/{}/attachments/{}", id, index);
    let project = projects::remove_attachment(&session, id, index).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Attachment deleted successfully", project)))
}

pub fn project_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/projects")
            .route("", web::get().to(get_projects))
            .route("", web::post().to(create_project))
            .route("/{id}", web::get().to(get_project))
            .route("/{id}", web::put().to(update_project))
            .route("/{id}", web::delete().to(delete_project))
            .route("/{id}/attachments", web::post().to(upload_attachment))
            .route("/{id}/attachments/{index}", web::delete().to(delete_attachment)),
    );
}
