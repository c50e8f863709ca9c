use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use taskboard::board::drag::{self, DragEnd};
use taskboard::board::{
    EntityStore, NotificationKind, Settlement, StatusChange, StatusTransitionController,
};
use taskboard::gateway::memory::Operation;
use taskboard::gateway::{get_as, insert_as, Entity, GatewayError, MemoryGateway};
use taskboard::models::{Project, Task, TaskStatus};

struct Fixture {
    gateway: MemoryGateway,
    store: EntityStore,
}

async fn fixture(statuses: &[TaskStatus]) -> Fixture {
    let gateway = MemoryGateway::default();
    let owner = Uuid::new_v4();
    let project: Project = insert_as(
        &gateway,
        Entity::Projects,
        json!({
            "title": "Release",
            "description": "ship the next release",
            "created_by": owner,
        }),
    )
    .await
    .unwrap();

    for (i, status) in statuses.iter().enumerate() {
        let _: Task = insert_as(
            &gateway,
            Entity::Tasks,
            json!({
                "title": format!("task {}", i),
                "status": status,
                "project_id": project.id,
                "created_by": owner,
            }),
        )
        .await
        .unwrap();
    }

    let store = EntityStore::load(&gateway, owner).await.unwrap();
    Fixture { gateway, store }
}

fn statuses(store: &EntityStore) -> Vec<(Uuid, TaskStatus)> {
    store.tasks().iter().map(|t| (t.id, t.status)).collect()
}

async fn remote_status(gateway: &MemoryGateway, id: Uuid) -> TaskStatus {
    get_as::<Task>(gateway, Entity::Tasks, id)
        .await
        .unwrap()
        .unwrap()
        .status
}

#[tokio::test]
async fn successful_drop_moves_only_the_dropped_task() {
    let mut fx = fixture(&[TaskStatus::Todo, TaskStatus::Todo, TaskStatus::InProgress]).await;
    let dragged = fx.store.tasks()[1].id;
    let before = statuses(&fx.store);

    let event = DragEnd {
        active_id: dragged.to_string(),
        over_id: Some("done".to_string()),
    };
    let change = drag::resolve(&event, &fx.store).expect("drop on a column");

    let mut controller = StatusTransitionController::new();
    let outcome = controller
        .transition(&mut fx.store, &fx.gateway, change)
        .await
        .unwrap();

    assert_eq!(outcome.settlement, Settlement::Confirmed);
    assert_eq!(outcome.status, TaskStatus::Done);
    let notification = outcome.notification.expect("confirmation");
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.title, "Task updated");

    for ((id, old), (_, new)) in before.iter().zip(statuses(&fx.store)) {
        if *id == dragged {
            assert_eq!(new, TaskStatus::Done);
        } else {
            assert_eq!(new, *old);
        }
    }
    assert_eq!(remote_status(&fx.gateway, dragged).await, TaskStatus::Done);
    assert_eq!(controller.in_flight(), 0);
}

#[tokio::test]
async fn failed_drop_rolls_back_with_one_error_notification() {
    let mut fx = fixture(&[TaskStatus::Todo, TaskStatus::InProgress]).await;
    let dragged = fx.store.tasks()[0].id;
    let original = fx.store.task(dragged).unwrap().status;
    let before = statuses(&fx.store);
    fx.gateway.fail_next(Operation::Update, 1).await;

    let mut controller = StatusTransitionController::new();
    let target = original.toggled();
    let outcome = controller
        .transition(&mut fx.store, &fx.gateway, StatusChange { task_id: dragged, target })
        .await
        .unwrap();

    assert_eq!(outcome.settlement, Settlement::RolledBack);
    assert_eq!(outcome.status, original);
    assert_eq!(statuses(&fx.store), before);

    let notifications: Vec<_> = outcome.notification.into_iter().collect();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].is_error());
    assert_eq!(remote_status(&fx.gateway, dragged).await, original);
}

#[tokio::test]
async fn dropping_on_the_current_column_issues_no_update() {
    let mut fx = fixture(&[TaskStatus::InProgress]).await;
    let task_id = fx.store.tasks()[0].id;

    let mut controller = StatusTransitionController::new();
    let outcome = controller
        .transition(
            &mut fx.store,
            &fx.gateway,
            StatusChange { task_id, target: TaskStatus::InProgress },
        )
        .await
        .unwrap();

    assert_eq!(outcome.settlement, Settlement::Unchanged);
    assert!(outcome.notification.is_none());
    assert_eq!(fx.gateway.call_count(Operation::Update, None).await, 0);
}

#[tokio::test]
async fn drop_outside_the_board_changes_nothing() {
    let fx = fixture(&[TaskStatus::Todo]).await;
    let event = DragEnd {
        active_id: fx.store.tasks()[0].id.to_string(),
        over_id: None,
    };
    assert!(drag::resolve(&event, &fx.store).is_none());
    assert_eq!(fx.gateway.call_count(Operation::Update, None).await, 0);
}

#[tokio::test]
async fn late_failure_of_an_earlier_move_does_not_undo_the_later_one() {
    let mut fx = fixture(&[TaskStatus::Todo]).await;
    let task_id = fx.store.tasks()[0].id;
    let mut controller = StatusTransitionController::new();

    let first = controller
        .begin(&mut fx.store, StatusChange { task_id, target: TaskStatus::InProgress })
        .unwrap()
        .unwrap();
    let second = controller
        .begin(&mut fx.store, StatusChange { task_id, target: TaskStatus::Done })
        .unwrap()
        .unwrap();
    assert_eq!(fx.store.task(task_id).unwrap().status, TaskStatus::Done);

    // The second request resolves first, then the first one fails.
    let remote: Task = taskboard::gateway::update_as(
        &fx.gateway,
        Entity::Tasks,
        task_id,
        json!({ "status": "done" }),
    )
    .await
    .unwrap();
    let confirmed = controller.settle(&mut fx.store, second, Ok(remote));
    assert_eq!(confirmed.settlement, Settlement::Confirmed);

    let late = controller.settle(
        &mut fx.store,
        first,
        Err(GatewayError::Network("connection reset".into())),
    );
    assert_eq!(late.settlement, Settlement::Superseded);
    assert!(late.notification.is_none());
    assert_eq!(fx.store.task(task_id).unwrap().status, TaskStatus::Done);
}

#[tokio::test]
async fn failure_of_the_latest_move_restores_the_last_persisted_status() {
    let mut fx = fixture(&[TaskStatus::Todo]).await;
    let task_id = fx.store.tasks()[0].id;
    let mut controller = StatusTransitionController::new();

    let first = controller
        .begin(&mut fx.store, StatusChange { task_id, target: TaskStatus::InProgress })
        .unwrap()
        .unwrap();
    let second = controller
        .begin(&mut fx.store, StatusChange { task_id, target: TaskStatus::Done })
        .unwrap()
        .unwrap();

    let persisted: Task = taskboard::gateway::update_as(
        &fx.gateway,
        Entity::Tasks,
        task_id,
        json!({ "status": "in-progress" }),
    )
    .await
    .unwrap();
    let early = controller.settle(&mut fx.store, first, Ok(persisted));
    assert_eq!(early.settlement, Settlement::Superseded);
    assert_eq!(fx.store.task(task_id).unwrap().status, TaskStatus::Done);

    let failed = controller.settle(
        &mut fx.store,
        second,
        Err(GatewayError::Rejected { status: 500, message: "boom".into() }),
    );
    assert_eq!(failed.settlement, Settlement::RolledBack);
    assert_eq!(failed.status, TaskStatus::InProgress);
    assert!(failed.notification.unwrap().is_error());
}

#[tokio::test]
async fn toggle_marks_done_then_reopens() {
    let mut fx = fixture(&[TaskStatus::InProgress]).await;
    let task_id = fx.store.tasks()[0].id;
    let mut controller = StatusTransitionController::new();

    let done = controller
        .toggle_done(&mut fx.store, &fx.gateway, task_id)
        .await
        .unwrap();
    assert_eq!(done.status, TaskStatus::Done);

    let reopened = controller
        .toggle_done(&mut fx.store, &fx.gateway, task_id)
        .await
        .unwrap();
    assert_eq!(reopened.status, TaskStatus::Todo);
    assert_eq!(remote_status(&fx.gateway, task_id).await, TaskStatus::Todo);
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    let mut fx = fixture(&[]).await;
    let mut controller = StatusTransitionController::new();
    let result = controller
        .transition(
            &mut fx.store,
            &fx.gateway,
            StatusChange { task_id: Uuid::new_v4(), target: TaskStatus::Done },
        )
        .await;
    assert!(result.is_err());
}
