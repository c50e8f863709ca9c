//! Boundary to the external data, auth and storage service.
//!
//! Everything the application persists goes through [`RemoteGateway`]. The
//! trait only shapes requests: records are plain JSON objects, filters are
//! equality checks on a handful of id columns, and authorization is the
//! caller's job (every query is scoped by `created_by` or `id`).

pub mod memory;
pub mod postgres;
pub mod rest;
pub mod storage;
pub mod token;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::{AuthSession, Identity};

pub use memory::MemoryGateway;
pub use postgres::PgGateway;
pub use rest::RestGateway;

/// A persisted entity as exchanged with the remote service.
pub type Record = Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Projects,
    Tasks,
    Profiles,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Entity::Projects => "projects",
            Entity::Tasks => "tasks",
            Entity::Profiles => "profiles",
        }
    }

    /// Columns a caller may set on insert or update.
    pub fn writable_columns(self) -> &'static [&'static str] {
        match self {
            Entity::Projects => &[
                "title",
                "description",
                "status",
                "priority",
                "due_date",
                "tags",
                "attachments",
                "color",
                "created_by",
            ],
            Entity::Tasks => &[
                "title",
                "description",
                "due_date",
                "status",
                "project_id",
                "created_by",
            ],
            Entity::Profiles => &["id", "email", "full_name", "avatar_url", "subscription"],
        }
    }

    pub fn has_updated_at(self) -> bool {
        !matches!(self, Entity::Projects)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    ProjectId,
    CreatedBy,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::ProjectId => "project_id",
            Column::CreatedBy => "created_by",
        }
    }
}

/// Equality filter on an id column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter {
    pub column: Column,
    pub value: Uuid,
}

impl Filter {
    pub fn eq(column: Column, value: Uuid) -> Self {
        Self { column, value }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .get(self.column.as_str())
            .and_then(Value::as_str)
            .and_then(|v| Uuid::parse_str(v).ok())
            == Some(self.value)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("field '{0}' cannot be written")]
    InvalidField(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::InvalidRecord(err.to_string())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => GatewayError::NotFound("record".to_string()),
            sqlx::Error::Database(db) => GatewayError::Rejected {
                status: 400,
                message: db.message().to_string(),
            },
            other => GatewayError::Network(other.to_string()),
        }
    }
}

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => GatewayError::NotFound("file".to_string()),
            _ => GatewayError::Storage(err.to_string()),
        }
    }
}

/// Operations the application needs from its backend service.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Records matching all filters, newest first.
    async fn list(&self, entity: Entity, filters: &[Filter]) -> Result<Vec<Record>, GatewayError>;

    async fn get(&self, entity: Entity, id: Uuid) -> Result<Option<Record>, GatewayError>;

    async fn insert(&self, entity: Entity, fields: Record) -> Result<Record, GatewayError>;

    async fn update(&self, entity: Entity, id: Uuid, fields: Record) -> Result<Record, GatewayError>;

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError>;

    /// Stores a blob and returns its public URL.
    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        blob: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    async fn download_file(&self, bucket: &str, path: &str) -> Result<Vec<u8>, GatewayError>;

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), GatewayError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError>;

    /// Identity behind an access token, `None` for unknown, expired or revoked tokens.
    async fn current_session(&self, access_token: &str) -> Result<Option<Identity>, GatewayError>;

    async fn ping(&self) -> Result<(), GatewayError>;

    fn backend_name(&self) -> &'static str;
}

/// Returns the keys of `fields`, rejecting anything the entity does not allow.
pub(crate) fn writable_keys(entity: Entity, fields: &Record) -> Result<Vec<String>, GatewayError> {
    let object = as_object(fields)?;
    let allowed = entity.writable_columns();
    object
        .keys()
        .map(|key| {
            if allowed.contains(&key.as_str()) {
                Ok(key.clone())
            } else {
                Err(GatewayError::InvalidField(key.clone()))
            }
        })
        .collect()
}

pub(crate) fn as_object(fields: &Record) -> Result<&Map<String, Value>, GatewayError> {
    fields
        .as_object()
        .ok_or_else(|| GatewayError::InvalidRecord("expected a JSON object".to_string()))
}

pub fn decode<T: DeserializeOwned>(record: Record) -> Result<T, GatewayError> {
    Ok(serde_json::from_value(record)?)
}

pub async fn list_as<T: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    entity: Entity,
    filters: &[Filter],
) -> Result<Vec<T>, GatewayError> {
    gateway
        .list(entity, filters)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn get_as<T: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    entity: Entity,
    id: Uuid,
) -> Result<Option<T>, GatewayError> {
    gateway.get(entity, id).await?.map(decode).transpose()
}

pub async fn insert_as<T: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    entity: Entity,
    fields: Record,
) -> Result<T, GatewayError> {
    decode(gateway.insert(entity, fields).await?)
}

pub async fn update_as<T: DeserializeOwned>(
    gateway: &dyn RemoteGateway,
    entity: Entity,
    id: Uuid,
    fields: Record,
) -> Result<T, GatewayError> {
    decode(gateway.update(entity, id, fields).await?)
}
