use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::file::Attachment;
use crate::models::task::{normalize_optional, Task, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub color: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Project form used by `/projects/new` and the edit dialog.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProjectForm {
    #[validate(length(min = 2, max = 100, message = "Title must be between 2 and 100 characters"))]
    pub title: String,
    #[validate(length(min = 10, max = 5000, message = "Description must be at least 10 characters"))]
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Vec<String>,
    pub color: Option<String>,
}

impl ProjectForm {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.tags = normalize_tags(self.tags);
        self.color = normalize_optional(self.color);
        self
    }

    pub fn into_record(self, created_by: Uuid) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
            "status": self.status,
            "priority": self.priority,
            "due_date": self.due_date,
            "tags": self.tags,
            "attachments": [],
            "color": self.color,
            "created_by": created_by,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 2, max = 100, message = "Title must be between 2 and 100 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000, message = "Description must be at least 10 characters"))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub clear_due_date: bool,
    #[validate(length(max = 20, message = "At most 20 tags are allowed"))]
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
}

impl UpdateProjectRequest {
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self.tags = self.tags.map(normalize_tags);
        self.color = self.color.map(|c| c.trim().to_string());
        self
    }

    pub fn into_record(self) -> Value {
        let mut fields = Map::new();
        if let Some(title) = self.title {
            fields.insert("title".into(), json!(title));
        }
        if let Some(description) = self.description {
            fields.insert("description".into(), json!(description));
        }
        if let Some(status) = self.status {
            fields.insert("status".into(), json!(status));
        }
        if let Some(priority) = self.priority {
            fields.insert("priority".into(), json!(priority));
        }
        if self.clear_due_date {
            fields.insert("due_date".into(), Value::Null);
        } else if let Some(due_date) = self.due_date {
            fields.insert("due_date".into(), json!(due_date));
        }
        if let Some(tags) = self.tags {
            fields.insert("tags".into(), json!(tags));
        }
        if let Some(color) = self.color {
            fields.insert("color".into(), json!(color));
        }
        Value::Object(fields)
    }
}

/// Project page payload: the project, its tasks in display order and the board.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectDetail {
    pub project: Project,
    pub tasks: Vec<Task>,
    pub board: crate::board::views::KanbanBoard,
}

/// Tags behave as a set: trimmed, blanks dropped, first occurrence kept.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !seen.iter().any(|s: &String| s == tag) {
            seen.push(tag.to_string());
        }
    }
    seen
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn is_valid_color(color: &str) -> bool {
    let Some(hex) = color.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}
