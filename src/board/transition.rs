use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::board::notification::Notification;
use crate::board::optimistic::{OptimisticLedger, Pending, Settlement};
use crate::board::store::EntityStore;
use crate::gateway::{update_as, Entity, GatewayError, RemoteGateway};
use crate::models::{Task, TaskStatus};

/// Domain event produced by a drop or an explicit status action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusChange {
    pub task_id: Uuid,
    pub target: TaskStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("task {0} is not loaded")]
    UnknownTask(Uuid),
}

/// A status change applied locally and awaiting the remote result.
#[derive(Debug)]
pub struct PendingTransition {
    inner: Pending<Task>,
    from: TaskStatus,
    to: TaskStatus,
}

impl PendingTransition {
    pub fn task_id(&self) -> Uuid {
        self.inner.key()
    }
}

/// Result of one status change, as reported back to the user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionOutcome {
    pub task_id: Uuid,
    pub settlement: Settlement,
    /// Status shown locally after settlement.
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
}

impl TransitionOutcome {
    pub fn is_rolled_back(&self) -> bool {
        self.settlement == Settlement::RolledBack
    }
}

/// Turns status changes into optimistic local updates persisted remotely.
#[derive(Debug, Default)]
pub struct StatusTransitionController {
    ledger: OptimisticLedger<Task>,
}

impl StatusTransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.ledger.in_flight()
    }

    /// Applies the change locally. `Ok(None)` when the task already has the target status.
    pub fn begin(
        &mut self,
        store: &mut EntityStore,
        change: StatusChange,
    ) -> Result<Option<PendingTransition>, TransitionError> {
        let current = store
            .task(change.task_id)
            .map(|t| t.status)
            .ok_or(TransitionError::UnknownTask(change.task_id))?;
        if current == change.target {
            log::debug!("Task {} already {}, nothing to do", change.task_id, current);
            return Ok(None);
        }

        let inner = self
            .ledger
            .apply(store.tasks_mut(), change.task_id, |task| task.status = change.target)
            .ok_or(TransitionError::UnknownTask(change.task_id))?;

        log::info!(
            "Task {} moved {} -> {} (pending)",
            change.task_id,
            current,
            change.target
        );
        Ok(Some(PendingTransition {
            inner,
            from: current,
            to: change.target,
        }))
    }

    /// Reconciles a pending change with the remote result.
    pub fn settle(
        &mut self,
        store: &mut EntityStore,
        pending: PendingTransition,
        result: Result<Task, GatewayError>,
    ) -> TransitionOutcome {
        let task_id = pending.task_id();
        let title = pending.inner.applied().title.clone();
        let (from, to) = (pending.from, pending.to);

        let (settlement, notification) = match result {
            Ok(remote) => {
                let settlement = self.ledger.confirm(store.tasks_mut(), pending.inner, remote);
                let notification = (settlement == Settlement::Confirmed).then(|| {
                    Notification::success(
                        "Task updated",
                        format!("\"{}\" moved to {}", title, to.label()),
                    )
                });
                (settlement, notification)
            }
            Err(err) => {
                log::error!("Failed to persist status of task {}: {}", task_id, err);
                let settlement = self.ledger.rollback(store.tasks_mut(), pending.inner);
                let notification = (settlement == Settlement::RolledBack).then(|| {
                    Notification::error(
                        "Failed to update task",
                        format!("\"{}\" was returned to {}. {}", title, from.label(), err),
                    )
                });
                (settlement, notification)
            }
        };

        let status = store.task(task_id).map(|t| t.status).unwrap_or(to);
        TransitionOutcome {
            task_id,
            settlement,
            status,
            notification,
        }
    }

    /// Applies, persists and settles one change.
    pub async fn transition(
        &mut self,
        store: &mut EntityStore,
        gateway: &dyn RemoteGateway,
        change: StatusChange,
    ) -> Result<TransitionOutcome, TransitionError> {
        let Some(pending) = self.begin(store, change)? else {
            return Ok(TransitionOutcome {
                task_id: change.task_id,
                settlement: Settlement::Unchanged,
                status: change.target,
                notification: None,
            });
        };

        let result = update_as::<Task>(
            gateway,
            Entity::Tasks,
            change.task_id,
            json!({ "status": change.target }),
        )
        .await;

        Ok(self.settle(store, pending, result))
    }

    /// "Mark done" for open tasks, "reopen" for done ones.
    pub async fn toggle_done(
        &mut self,
        store: &mut EntityStore,
        gateway: &dyn RemoteGateway,
        task_id: Uuid,
    ) -> Result<TransitionOutcome, TransitionError> {
        let current = store
            .task(task_id)
            .map(|t| t.status)
            .ok_or(TransitionError::UnknownTask(task_id))?;
        let change = StatusChange {
            task_id,
            target: current.toggled(),
        };
        self.transition(store, gateway, change).await
    }
}
