use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Workflow status shared by tasks and projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];

    /// Identifier used on the wire and as the Kanban column id.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
        }
    }

    /// Human readable column title.
    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Done => "Done",
        }
    }

    pub fn is_done(self) -> bool {
        self == TaskStatus::Done
    }

    /// Target of the "mark done / reopen" toggle.
    pub fn toggled(self) -> TaskStatus {
        if self.is_done() {
            TaskStatus::Todo
        } else {
            TaskStatus::Done
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    pub project_id: Uuid,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task creation form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TaskForm {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    pub project_id: Uuid,
}

impl TaskForm {
    /// Trims free text so whitespace-only input fails validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = normalize_optional(self.description);
        self
    }

    pub fn into_record(self, created_by: Uuid) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
            "due_date": self.due_date,
            "status": self.status,
            "project_id": self.project_id,
            "created_by": created_by,
        })
    }
}

/// Partial task edit. The owning project cannot be changed.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub clear_due_date: bool,
    pub status: Option<TaskStatus>,
}

impl UpdateTaskRequest {
    /// A description left blank still counts as an edit and clears the field.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && !self.clear_due_date
            && self.status.is_none()
    }

    pub fn into_record(self) -> Value {
        let mut fields = Map::new();
        if let Some(title) = self.title {
            fields.insert("title".into(), json!(title));
        }
        if let Some(description) = self.description {
            fields.insert("description".into(), json!(normalize_optional(Some(description))));
        }
        if self.clear_due_date {
            fields.insert("due_date".into(), Value::Null);
        } else if let Some(due_date) = self.due_date {
            fields.insert("due_date".into(), json!(due_date));
        }
        if let Some(status) = self.status {
            fields.insert("status".into(), json!(status));
        }
        Value::Object(fields)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct StatusChangeRequest {
    pub status: TaskStatus,
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_its_wire_name() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
            assert_eq!(json!(status), json!(status.as_str()));
        }
    }

    #[test]
    fn status_rejects_values_outside_the_lifecycle() {
        assert!("blocked".parse::<TaskStatus>().is_err());
        assert!("IN_PROGRESS".parse::<TaskStatus>().is_err());
        assert!(serde_json::from_value::<TaskStatus>(json!("doing")).is_err());
    }

    #[test]
    fn toggle_marks_done_and_reopens() {
        assert_eq!(TaskStatus::Todo.toggled(), TaskStatus::Done);
        assert_eq!(TaskStatus::InProgress.toggled(), TaskStatus::Done);
        assert_eq!(TaskStatus::Done.toggled(), TaskStatus::Todo);
    }

    #[test]
    fn blank_title_fails_after_normalization() {
        let form = TaskForm {
            title: "   ".into(),
            description: None,
            due_date: None,
            status: TaskStatus::Todo,
            project_id: Uuid::new_v4(),
        }
        .normalized();
        assert!(form.validate().is_err());
    }

    #[test]
    fn update_record_only_carries_provided_fields() {
        let update = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            clear_due_date: true,
            ..Default::default()
        };
        assert_eq!(
            update.into_record(),
            json!({ "status": "done", "due_date": null })
        );
    }

    #[test]
    fn blank_description_edit_clears_the_field() {
        let update = UpdateTaskRequest {
            description: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert!(!update.is_empty());
        assert_eq!(update.into_record(), json!({ "description": null }));

        let update = UpdateTaskRequest {
            description: Some("  ship it ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(update.into_record(), json!({ "description": "ship it" }));
    }
}
