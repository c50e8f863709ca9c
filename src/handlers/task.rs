use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::board::drag::DragEnd;
use crate::board::transition::TransitionOutcome;
use crate::models::auth::ApiResponse;
use crate::models::task::{StatusChangeRequest, TaskForm, UpdateTaskRequest};
use crate::models::Task;
use crate::services::tasks::{self, TaskOverview};
use crate::session::Session;
use crate::utils::errors::ServiceError;

fn outcome_message(outcome: &TransitionOutcome) -> String {
    match &outcome.notification {
        Some(n) => n.title.clone(),
        None => "Task status unchanged".to_string(),
    }
}

/// Get all tasks of the current user with the Kanban board
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Tasks retrieved successfully", body = ApiResponse<TaskOverview>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_tasks(session: Session) -> Result<HttpResponse, ServiceError> {
    log::info!("GET /api/tasks");
    let overview = tasks::overview(&session).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Tasks retrieved successfully", overview)))
}

/// Create a new task
#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    request_body = TaskForm,
    responses(
        (status = 201, description = "Task created successfully", body = ApiResponse<Task>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_task(session: Session, form: web::Json<TaskForm>) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/tasks - Creating new task: {}", form.title);
    let task = tasks::create(&session, form.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::success("Task created successfully", task)))
}

/// Get a task by ID
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task retrieved successfully", body = ApiResponse<Task>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_task(session: Session, path: web::Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("GET /api/tasks/{}", id);
    let task = tasks::get(&session, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Task retrieved successfully", task)))
}

/// Update a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated successfully", body = ApiResponse<Task>),
        (status = 400, description = "Validation error", body = crate::models::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn update_task(
    session: Session,
    path: web::Path<Uuid>,
    request: web::Json<UpdateTaskRequest>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("PUT /api/tasks/{}", id);
    let task = tasks::update(&session, id, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Task updated successfully", task)))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task deleted successfully", body = ApiResponse<bool>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn delete_task(session: Session, path: web::Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("DELETE /api/tasks/{}", id);
    tasks::delete(&session, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Task deleted successfully", true)))
}

/// Move a task to another status
#[utoipa::path(
    patch,
    path = "/api/tasks/{id}/status",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    request_body = StatusChangeRequest,
    responses(
        (status = 200, description = "Status applied or already current", body = ApiResponse<TransitionOutcome>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::models::ErrorResponse),
        (status = 502, description = "Update failed and was rolled back", body = crate::models::ErrorResponse)
    )
)]
pub async fn change_status(
    session: Session,
    path: web::Path<Uuid>,
    request: web::Json<StatusChangeRequest>,
) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("PATCH /api/tasks/{}/status -> {}", id, request.status);
    let outcome = tasks::change_status(&session, id, request.status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(&outcome_message(&outcome), outcome)))
}

/// Mark a task done, or reopen a done task
#[utoipa::path(
    post,
    path = "/api/tasks/{id}/toggle",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = Uuid, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task toggled", body = ApiResponse<TransitionOutcome>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 404, description = "Task not found", body = crate::models::ErrorResponse),
        (status = 502, description = "Update failed and was rolled back", body = crate::models::ErrorResponse)
    )
)]
pub async fn toggle_task(session: Session, path: web::Path<Uuid>) -> Result<HttpResponse, ServiceError> {
    let id = path.into_inner();
    log::info!("POST /api/tasks/{}/toggle", id);
    let outcome = tasks::toggle(&session, id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(&outcome_message(&outcome), outcome)))
}

/// Apply a card drop from the Kanban board
#[utoipa::path(
    post,
    path = "/api/board/drop",
    tag = "tasks",
    security(
        ("bearer_auth" = [])
    ),
    request_body = DragEnd,
    responses(
        (status = 200, description = "Drop applied, or abandoned when it had no target", body = ApiResponse<TransitionOutcome>),
        (status = 401, description = "Unauthorized", body = crate::models::ErrorResponse),
        (status = 502, description = "Update failed and was rolled back", body = crate::models::ErrorResponse)
    )
)]
pub async fn drop_card(session: Session, event: web::Json<DragEnd>) -> Result<HttpResponse, ServiceError> {
    log::info!("POST /api/board/drop - {}", event.active_id);
    match tasks::drop_card(&session, event.into_inner()).await? {
        Some(outcome) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(&outcome_message(&outcome), outcome)))
        }
        None => Ok(HttpResponse::Ok().json(ApiResponse::<TransitionOutcome> {
            status: "success".to_string(),
            message: "Drop abandoned".to_string(),
            data: None,
        })),
    }
}

pub fn task_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/tasks")
            .route("", web::get().to(get_tasks))
            .route("", web::post().to(create_task))
            .route("/{id}", web::get().to(get_task))
            .route("/{id}", web::put().to(update_task))
            .route("/{id}", web::delete().to(delete_task))
            .route("/{id}/status", web::patch().to(change_status))
            .route("/{id}/toggle", web::post().to(toggle_task)),
    )
    .route("/api/board/drop", web::post().to(drop_card));
}
