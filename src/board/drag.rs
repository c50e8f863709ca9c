//! Maps drag-end payloads from the board UI to status changes.
//!
//! The board reports the dragged card id and whatever it was released over:
//! either a column (its id is the status wire name) or another card.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::board::store::EntityStore;
use crate::board::transition::StatusChange;
use crate::models::TaskStatus;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DragEnd {
    pub active_id: String,
    /// Column or card under the pointer when released, absent outside any drop target.
    #[serde(default)]
    pub over_id: Option<String>,
}

/// `None` when the drop does not land on a column or card, or the dragged card is unknown.
pub fn resolve(event: &DragEnd, store: &EntityStore) -> Option<StatusChange> {
    let task_id = Uuid::parse_str(&event.active_id).ok()?;
    store.task(task_id)?;

    let over = event.over_id.as_deref()?;
    let target = match over.parse::<TaskStatus>() {
        Ok(status) => status,
        Err(_) => {
            let card = Uuid::parse_str(over).ok()?;
            store.task(card)?.status
        }
    };
    Some(StatusChange { task_id, target })
}
