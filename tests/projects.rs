use std::sync::Arc;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use taskboard::gateway::memory::Operation;
use taskboard::gateway::{Entity, MemoryGateway, RemoteGateway};
use taskboard::models::auth::SignUpRequest;
use taskboard::models::file::FileUpload;
use taskboard::models::project::{ProjectForm, UpdateProjectRequest};
use taskboard::models::task::TaskForm;
use taskboard::models::{Priority, TaskStatus};
use taskboard::services::files::{UploadPolicy, ATTACHMENTS_BUCKET};
use taskboard::services::{account, projects, tasks};
use taskboard::session::Session;
use taskboard::utils::errors::ServiceError;

async fn signed_in(gateway: &Arc<MemoryGateway>, email: &str) -> Session {
    let shared: Arc<dyn RemoteGateway> = gateway.clone();
    let login = account::sign_up(
        shared.as_ref(),
        SignUpRequest {
            email: email.to_string(),
            password: "correct horse battery".to_string(),
            full_name: Some("Ada Lovelace".to_string()),
        },
    )
    .await
    .unwrap();
    Session::resolve(shared, &login.token).await.unwrap()
}

fn form(title: &str, description: &str) -> ProjectForm {
    ProjectForm {
        title: title.to_string(),
        description: description.to_string(),
        status: TaskStatus::Todo,
        priority: Priority::High,
        due_date: None,
        tags: vec!["web".to_string(), " web ".to_string()],
        color: None,
    }
}

fn task_form(project_id: Uuid, title: &str, due_in_days: Option<i64>) -> TaskForm {
    TaskForm {
        title: title.to_string(),
        description: None,
        due_date: due_in_days.map(|d| Utc::now().date_naive() + Duration::days(d)),
        status: TaskStatus::Todo,
        project_id,
    }
}

#[tokio::test]
async fn short_description_is_rejected_before_any_insert() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;

    let result = projects::create(&session, form("Website", "too short")).await;
    match result {
        Err(ServiceError::InvalidForm(fields)) => assert!(fields.contains_key("description")),
        other => panic!("unexpected result: {:?}", other.map(|p| p.id)),
    }
    assert_eq!(gateway.call_count(Operation::Insert, Some(Entity::Projects)).await, 0);
}

#[tokio::test]
async fn invalid_color_is_rejected_inline() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;

    let mut bad = form("Website", "a long enough description");
    bad.color = Some("blue".to_string());
    assert!(matches!(
        projects::create(&session, bad).await,
        Err(ServiceError::InvalidForm(ref f)) if f.contains_key("color")
    ));
    assert_eq!(gateway.call_count(Operation::Insert, Some(Entity::Projects)).await, 0);
}

#[tokio::test]
async fn created_project_is_scoped_to_its_owner() {
    let gateway = Arc::new(MemoryGateway::default());
    let ada = signed_in(&gateway, "ada@example.com").await;
    let grace = signed_in(&gateway, "grace@example.com").await;

    let project = projects::create(&ada, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();
    assert_eq!(project.created_by, ada.user_id());
    assert_eq!(project.tags, vec!["web".to_string()]);

    assert_eq!(projects::list(&ada).await.unwrap().len(), 1);
    assert!(projects::list(&grace).await.unwrap().is_empty());
    assert!(matches!(
        projects::get(&grace, project.id).await,
        Err(ServiceError::NotFound(_))
    ));
    assert!(matches!(
        tasks::create(&grace, task_form(project.id, "sneaky", None)).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn detail_lists_tasks_in_display_order_with_board() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();

    let done = tasks::create(&session, task_form(project.id, "A", None)).await.unwrap();
    tasks::toggle(&session, done.id).await.unwrap();
    tasks::create(&session, task_form(project.id, "B", Some(1))).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    tasks::create(&session, task_form(project.id, "C", None)).await.unwrap();

    let detail = projects::detail(&session, project.id).await.unwrap();
    let titles: Vec<_> = detail.tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["B", "C", "A"]);
    assert_eq!(detail.board.todo.len(), 2);
    assert_eq!(detail.board.done.len(), 1);
}

#[tokio::test]
async fn update_applies_only_given_fields() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();

    let updated = projects::update(
        &session,
        project.id,
        UpdateProjectRequest {
            priority: Some(Priority::Low),
            color: Some("#10b981".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.priority, Priority::Low);
    assert_eq!(updated.color.as_deref(), Some("#10b981"));
    assert_eq!(updated.title, "Website");

    assert!(matches!(
        projects::update(&session, project.id, UpdateProjectRequest::default()).await,
        Err(ServiceError::ValidationError(_))
    ));
}

#[tokio::test]
async fn attachments_are_stored_listed_and_removed() {
    let gateway = Arc::new(MemoryGateway::new("http://localhost:8080"));
    let session = signed_in(&gateway, "ada@example.com").await;
    let policy = UploadPolicy::default();
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();

    let upload = FileUpload {
        file_name: "brief.pdf".to_string(),
        bytes: b"%PDF-1.7".to_vec(),
    };
    let project = projects::add_attachment(&session, project.id, upload, &policy)
        .await
        .unwrap();
    let attachment = project.attachments[0].clone();
    assert_eq!(attachment.name, "brief.pdf");
    assert_eq!(attachment.content_type, "application/pdf");
    assert_eq!(attachment.size, 8);
    assert!(attachment.path.starts_with(&session.user_id().to_string()));
    assert!(attachment.url.starts_with("http://localhost:8080/storage/attachments/"));
    assert!(gateway.has_blob(ATTACHMENTS_BUCKET, &attachment.path).await);

    let project = projects::remove_attachment(&session, project.id, 0).await.unwrap();
    assert!(project.attachments.is_empty());
    assert!(!gateway.has_blob(ATTACHMENTS_BUCKET, &attachment.path).await);

    assert!(matches!(
        projects::remove_attachment(&session, project.id, 0).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn disallowed_files_never_reach_storage() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();

    let upload = FileUpload {
        file_name: "setup.exe".to_string(),
        bytes: vec![0; 16],
    };
    assert!(projects::add_attachment(&session, project.id, upload, &UploadPolicy::default())
        .await
        .is_err());
    assert_eq!(gateway.call_count(Operation::Upload, None).await, 0);
}

#[tokio::test]
async fn failed_attachment_record_cleans_up_the_blob() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();

    gateway.fail_next(Operation::Update, 1).await;
    let upload = FileUpload {
        file_name: "notes.txt".to_string(),
        bytes: b"hello".to_vec(),
    };
    assert!(projects::add_attachment(&session, project.id, upload, &UploadPolicy::default())
        .await
        .is_err());
    assert_eq!(gateway.call_count(Operation::DeleteFile, None).await, 1);
    assert!(projects::get(&session, project.id).await.unwrap().attachments.is_empty());
}

#[tokio::test]
async fn deleting_a_project_removes_its_tasks_and_files() {
    let gateway = Arc::new(MemoryGateway::default());
    let session = signed_in(&gateway, "ada@example.com").await;
    let project = projects::create(&session, form("Website", "relaunch the marketing site"))
        .await
        .unwrap();
    tasks::create(&session, task_form(project.id, "Draft copy", Some(3)))
        .await
        .unwrap();
    let upload = FileUpload {
        file_name: "logo.png".to_string(),
        bytes: vec![1, 2, 3],
    };
    let project = projects::add_attachment(&session, project.id, upload, &UploadPolicy::default())
        .await
        .unwrap();
    let path = project.attachments[0].path.clone();

    projects::delete(&session, project.id).await.unwrap();
    assert!(gateway.records(Entity::Tasks).await.is_empty());
    assert!(!gateway.has_blob(ATTACHMENTS_BUCKET, &path).await);
    assert!(projects::list(&session).await.unwrap().is_empty());
}
