use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

fn default_subscription() -> String {
    "free".to_string()
}

/// Account profile. `id` equals the auth identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    /// Tier label, shown in the account page only.
    #[serde(default = "default_subscription")]
    pub subscription: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub full_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn normalized(mut self) -> Self {
        self.full_name = self.full_name.map(|n| n.trim().to_string());
        self
    }

    pub fn into_record(self) -> Value {
        let mut fields = Map::new();
        if let Some(full_name) = self.full_name {
            fields.insert("full_name".into(), json!(full_name));
        }
        Value::Object(fields)
    }
}
