use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::board::drag::{self, DragEnd};
use crate::board::store::EntityStore;
use crate::board::transition::{StatusChange, StatusTransitionController, TransitionOutcome};
use crate::board::views::{kanban, sorted_for_display, KanbanBoard};
use crate::gateway::{get_as, insert_as, update_as, Entity};
use crate::models::task::{TaskForm, UpdateTaskRequest};
use crate::models::{Task, TaskStatus};
use crate::services::projects;
use crate::session::Session;
use crate::utils::errors::ServiceError;
use crate::utils::validation::check;

/// `/tasks` page payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskOverview {
    /// Display order: open before done, earliest due first.
    pub tasks: Vec<Task>,
    pub board: KanbanBoard,
}

pub async fn overview(session: &Session) -> Result<TaskOverview, ServiceError> {
    let store = EntityStore::load(session.gateway(), session.user_id()).await?;
    log::info!("Retrieved {} tasks for {}", store.tasks().len(), session.user_id());
    Ok(TaskOverview {
        tasks: sorted_for_display(store.tasks()),
        board: kanban(store.tasks()),
    })
}

pub async fn get(session: &Session, id: Uuid) -> Result<Task, ServiceError> {
    get_as::<Task>(session.gateway(), Entity::Tasks, id)
        .await?
        .filter(|t| t.created_by == session.user_id())
        .ok_or_else(|| ServiceError::NotFound("Task not found".to_string()))
}

pub async fn create(session: &Session, form: TaskForm) -> Result<Task, ServiceError> {
    let form = form.normalized();
    check(&form)?;
    projects::get(session, form.project_id).await?;

    let task = insert_as::<Task>(
        session.gateway(),
        Entity::Tasks,
        form.into_record(session.user_id()),
    )
    .await
    .map_err(|e| {
        log::error!("Failed to create task: {}", e);
        ServiceError::from(e)
    })?;
    log::info!("Task created: {} ({})", task.title, task.id);
    Ok(task)
}

pub async fn update(
    session: &Session,
    id: Uuid,
    request: UpdateTaskRequest,
) -> Result<Task, ServiceError> {
    let request = request.normalized();
    check(&request)?;
    if request.is_empty() {
        return Err(ServiceError::ValidationError("No changes provided".to_string()));
    }
    get(session, id).await?;

    let task = update_as::<Task>(session.gateway(), Entity::Tasks, id, request.into_record()).await?;
    log::info!("Task updated: {}", task.id);
    Ok(task)
}

pub async fn delete(session: &Session, id: Uuid) -> Result<(), ServiceError> {
    get(session, id).await?;
    session.gateway().delete(Entity::Tasks, id).await?;
    log::info!("Task deleted: {}", id);
    Ok(())
}

/// Rolled-back transitions become an error carrying their notification.
fn into_result(outcome: TransitionOutcome) -> Result<TransitionOutcome, ServiceError> {
    if outcome.is_rolled_back() {
        let (title, message) = match &outcome.notification {
            Some(n) => (n.title.clone(), n.description.clone()),
            None => ("Failed to update task".to_string(), String::new()),
        };
        return Err(ServiceError::gateway(title, message));
    }
    Ok(outcome)
}

pub async fn change_status(
    session: &Session,
    id: Uuid,
    target: TaskStatus,
) -> Result<TransitionOutcome, ServiceError> {
    let task = get(session, id).await?;
    let mut store = EntityStore::new(Vec::new(), vec![task]);
    let mut controller = StatusTransitionController::new();
    let outcome = controller
        .transition(&mut store, session.gateway(), StatusChange { task_id: id, target })
        .await?;
    into_result(outcome)
}

/// Mark done, or reopen a done task.
pub async fn toggle(session: &Session, id: Uuid) -> Result<TransitionOutcome, ServiceError> {
    let task = get(session, id).await?;
    let mut store = EntityStore::new(Vec::new(), vec![task]);
    let mut controller = StatusTransitionController::new();
    let outcome = controller.toggle_done(&mut store, session.gateway(), id).await?;
    into_result(outcome)
}

/// Applies a board drop. `Ok(None)` when the drop had no target.
pub async fn drop_card(
    session: &Session,
    event: DragEnd,
) -> Result<Option<TransitionOutcome>, ServiceError> {
    let mut store = EntityStore::load(session.gateway(), session.user_id()).await?;
    let Some(change) = drag::resolve(&event, &store) else {
        log::info!("Drop of {} abandoned: no drop target", event.active_id);
        return Ok(None);
    };

    let mut controller = StatusTransitionController::new();
    let outcome = controller
        .transition(&mut store, session.gateway(), change)
        .await?;
    into_result(outcome).map(Some)
}
