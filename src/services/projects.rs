use serde_json::json;
use uuid::Uuid;

use crate::board::store::EntityStore;
use crate::board::views::{kanban, sorted_for_display};
use crate::gateway::{get_as, insert_as, list_as, update_as, Column, Entity, Filter};
use crate::models::file::{Attachment, FileUpload};
use crate::models::project::{is_valid_color, ProjectDetail, ProjectForm, UpdateProjectRequest};
use crate::models::Project;
use crate::services::files::{storage_path, UploadPolicy, ATTACHMENTS_BUCKET};
use crate::session::Session;
use crate::utils::errors::ServiceError;
use crate::utils::validation::{check, reject};

const COLOR_MESSAGE: &str = "Color must be a hex value like #3b82f6";

pub async fn list(session: &Session) -> Result<Vec<Project>, ServiceError> {
    let projects = list_as::<Project>(
        session.gateway(),
        Entity::Projects,
        &[Filter::eq(Column::CreatedBy, session.user_id())],
    )
    .await?;
    log::info!("Retrieved {} projects for {}", projects.len(), session.user_id());
    Ok(projects)
}

/// A project owned by the session user. Other users' projects read as missing.
pub async fn get(session: &Session, id: Uuid) -> Result<Project, ServiceError> {
    get_as::<Project>(session.gateway(), Entity::Projects, id)
        .await?
        .filter(|p| p.created_by == session.user_id())
        .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))
}

pub async fn detail(session: &Session, id: Uuid) -> Result<ProjectDetail, ServiceError> {
    let project = get(session, id).await?;
    let store = EntityStore::load_project(session.gateway(), project.clone()).await?;
    let board = kanban(store.tasks());
    Ok(ProjectDetail {
        tasks: sorted_for_display(store.tasks()),
        board,
        project,
    })
}

pub async fn create(session: &Session, form: ProjectForm) -> Result<Project, ServiceError> {
    let form = form.normalized();
    check(&form)?;
    if form.color.as_deref().is_some_and(|c| !is_valid_color(c)) {
        return Err(reject("color", COLOR_MESSAGE));
    }

    let project = insert_as::<Project>(
        session.gateway(),
        Entity::Projects,
        form.into_record(session.user_id()),
    )
    .await
    .map_err(|e| {
        log::error!("Failed to create project: {}", e);
        ServiceError::from(e)
    })?;
    log::info!("Project created: {} ({})", project.title, project.id);
    Ok(project)
}

pub async fn update(
    session: &Session,
    id: Uuid,
    request: UpdateProjectRequest,
) -> Result<Project, ServiceError> {
    let request = request.normalized();
    check(&request)?;
    if request.color.as_deref().is_some_and(|c| !c.is_empty() && !is_valid_color(c)) {
        return Err(reject("color", COLOR_MESSAGE));
    }
    get(session, id).await?;

    let mut fields = request.into_record();
    if let Some(color) = fields.get_mut("color") {
        if color.as_str() == Some("") {
            *color = serde_json::Value::Null;
        }
    }
    if fields.as_object().is_some_and(|f| f.is_empty()) {
        return Err(ServiceError::ValidationError("No changes provided".to_string()));
    }

    let project = update_as::<Project>(session.gateway(), Entity::Projects, id, fields).await?;
    log::info!("Project updated: {}", project.id);
    Ok(project)
}

/// Deletes the project, its tasks (backend cascade) and its stored files.
pub async fn delete(session: &Session, id: Uuid) -> Result<(), ServiceError> {
    let project = get(session, id).await?;
    session.gateway().delete(Entity::Projects, id).await?;

    for attachment in &project.attachments {
        if let Err(e) = session
            .gateway()
            .delete_file(ATTACHMENTS_BUCKET, &attachment.path)
            .await
        {
            log::warn!("Failed to delete file {}: {}", attachment.path, e);
        }
    }
    log::info!("Project deleted: {}", id);
    Ok(())
}

pub async fn add_attachment(
    session: &Session,
    id: Uuid,
    upload: FileUpload,
    policy: &UploadPolicy,
) -> Result<Project, ServiceError> {
    let project = get(session, id).await?;
    let content_type = policy.validate_file(&upload.file_name, upload.bytes.len())?;

    let path = storage_path(session.user_id(), &upload.file_name);
    let size = upload.bytes.len() as i64;
    let url = session
        .gateway()
        .upload_file(ATTACHMENTS_BUCKET, &path, upload.bytes, &content_type)
        .await
        .map_err(|e| {
            log::error!("Upload failed for {}: {}", upload.file_name, e);
            ServiceError::gateway("Upload failed", e.to_string())
        })?;

    let mut attachments = project.attachments;
    attachments.push(Attachment {
        url,
        name: upload.file_name.clone(),
        content_type,
        size,
        path: path.clone(),
    });

    match update_as::<Project>(
        session.gateway(),
        Entity::Projects,
        id,
        json!({ "attachments": attachments }),
    )
    .await
    {
        Ok(project) => {
            log::info!("File attached to project {}: {} ({})", id, upload.file_name, path);
            Ok(project)
        }
        Err(e) => {
            log::error!("Failed to record attachment on project {}: {}", id, e);
            // Clean up file if the record update fails
            if let Err(cleanup) = session.gateway().delete_file(ATTACHMENTS_BUCKET, &path).await {
                log::warn!("Failed to delete orphaned file {}: {}", path, cleanup);
            }
            Err(e.into())
        }
    }
}

pub async fn remove_attachment(
    session: &Session,
    id: Uuid,
    index: usize,
) -> Result<Project, ServiceError> {
    let project = get(session, id).await?;
    if index >= project.attachments.len() {
        return Err(ServiceError::NotFound("Attachment not found".to_string()));
    }

    let mut attachments = project.attachments;
    let removed = attachments.remove(index);
    let project = update_as::<Project>(
        session.gateway(),
        Entity::Projects,
        id,
        json!({ "attachments": attachments }),
    )
    .await?;

    if let Err(e) = session
        .gateway()
        .delete_file(ATTACHMENTS_BUCKET, &removed.path)
        .await
    {
        log::warn!("Failed to delete file {}: {}", removed.path, e);
    }
    log::info!("Attachment removed from project {}: {}", id, removed.name);
    Ok(project)
}
