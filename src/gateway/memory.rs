use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::gateway::{writable_keys, Entity, Filter, GatewayError, Record, RemoteGateway};
use crate::models::{AuthSession, Identity};

/// Gateway operation, used for failure injection and the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    Insert,
    Update,
    Delete,
    Upload,
    Download,
    DeleteFile,
    SignUp,
    SignIn,
    SignOut,
    Session,
}

/// Oldest calls are dropped past this many entries.
const CALL_LOG_LIMIT: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    operation: Operation,
    entity: Option<Entity>,
}

struct Account {
    id: Uuid,
    password_hash: String,
}

#[derive(Default)]
struct State {
    tables: HashMap<Entity, Vec<Record>>,
    blobs: HashMap<String, Vec<u8>>,
    accounts: HashMap<String, Account>,
    sessions: HashMap<String, (Identity, DateTime<Utc>)>,
    failures: HashMap<Operation, usize>,
    calls: Vec<Call>,
}

impl State {
    fn record(&mut self, operation: Operation, entity: Option<Entity>) -> Result<(), GatewayError> {
        if self.calls.len() >= CALL_LOG_LIMIT {
            let excess = self.calls.len() + 1 - CALL_LOG_LIMIT;
            self.calls.drain(..excess);
        }
        self.calls.push(Call { operation, entity });
        match self.failures.get_mut(&operation) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(GatewayError::Network(format!("injected {:?} failure", operation)))
            }
            _ => Ok(()),
        }
    }

    fn table(&mut self, entity: Entity) -> &mut Vec<Record> {
        self.tables.entry(entity).or_default()
    }
}

/// In-process gateway. Backs the `memory` backend and the test suite.
pub struct MemoryGateway {
    state: Mutex<State>,
    public_base_url: String,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new("")
    }
}

fn defaults(entity: Entity) -> Value {
    match entity {
        Entity::Projects => json!({
            "status": "todo",
            "priority": "medium",
            "due_date": null,
            "tags": [],
            "attachments": [],
            "color": null,
        }),
        Entity::Tasks => json!({ "status": "todo", "description": null, "due_date": null }),
        Entity::Profiles => json!({ "full_name": null, "avatar_url": null, "subscription": "free" }),
    }
}

fn created_at(record: &Record) -> Option<DateTime<Utc>> {
    record
        .get("created_at")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn id_of(record: &Record) -> Option<Uuid> {
    record
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

impl MemoryGateway {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Stores a record verbatim, bypassing column checks.
    pub async fn seed(&self, entity: Entity, record: Record) {
        self.state.lock().await.table(entity).push(record);
    }

    /// Makes the next `times` calls of `operation` fail with a network error.
    pub async fn fail_next(&self, operation: Operation, times: usize) {
        *self.state.lock().await.failures.entry(operation).or_default() += times;
    }

    /// Counts logged calls; only the most recent ones are kept.
    pub async fn call_count(&self, operation: Operation, entity: Option<Entity>) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.operation == operation && (entity.is_none() || c.entity == entity))
            .count()
    }

    pub async fn records(&self, entity: Entity) -> Vec<Record> {
        self.state.lock().await.table(entity).clone()
    }

    pub async fn has_blob(&self, bucket: &str, path: &str) -> bool {
        self.state
            .lock()
            .await
            .blobs
            .contains_key(&format!("{}/{}", bucket, path))
    }

    fn open_session(state: &mut State, user: Identity) -> AuthSession {
        let access_token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::hours(24);
        state
            .sessions
            .insert(access_token.clone(), (user.clone(), expires_at));
        AuthSession {
            access_token,
            expires_at,
            user,
        }
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn list(&self, entity: Entity, filters: &[Filter]) -> Result<Vec<Record>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::List, Some(entity))?;
        let mut rows: Vec<Record> = state
            .table(entity)
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .cloned()
            .collect();
        rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
        Ok(rows)
    }

    async fn get(&self, entity: Entity, id: Uuid) -> Result<Option<Record>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Get, Some(entity))?;
        Ok(state
            .table(entity)
            .iter()
            .find(|r| id_of(r) == Some(id))
            .cloned())
    }

    async fn insert(&self, entity: Entity, fields: Record) -> Result<Record, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Insert, Some(entity))?;
        writable_keys(entity, &fields)?;

        let mut record = defaults(entity);
        let now = Utc::now();
        if let (Some(target), Some(source)) = (record.as_object_mut(), fields.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
            target
                .entry("id")
                .or_insert_with(|| json!(Uuid::new_v4()));
            target.insert("created_at".into(), json!(now));
            if entity.has_updated_at() {
                target.insert("updated_at".into(), json!(now));
            }
        }
        state.table(entity).push(record.clone());
        Ok(record)
    }

    async fn update(&self, entity: Entity, id: Uuid, fields: Record) -> Result<Record, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Update, Some(entity))?;
        writable_keys(entity, &fields)?;

        let row = state
            .table(entity)
            .iter_mut()
            .find(|r| id_of(r) == Some(id))
            .ok_or_else(|| GatewayError::NotFound(format!("{} {}", entity.table(), id)))?;
        if let (Some(target), Some(source)) = (row.as_object_mut(), fields.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
            if entity.has_updated_at() {
                target.insert("updated_at".into(), json!(Utc::now()));
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Delete, Some(entity))?;
        let table = state.table(entity);
        let before = table.len();
        table.retain(|r| id_of(r) != Some(id));
        if table.len() == before {
            return Err(GatewayError::NotFound(format!("{} {}", entity.table(), id)));
        }
        // Mirrors the ON DELETE CASCADE constraint on tasks.project_id.
        if entity == Entity::Projects {
            state
                .table(Entity::Tasks)
                .retain(|t| !Filter::eq(crate::gateway::Column::ProjectId, id).matches(t));
        }
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        blob: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Upload, None)?;
        state.blobs.insert(format!("{}/{}", bucket, path), blob);
        Ok(format!("{}/storage/{}/{}", self.public_base_url, bucket, path))
    }

    async fn download_file(&self, bucket: &str, path: &str) -> Result<Vec<u8>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Download, None)?;
        state
            .blobs
            .get(&format!("{}/{}", bucket, path))
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", bucket, path)))
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::DeleteFile, None)?;
        state
            .blobs
            .remove(&format!("{}/{}", bucket, path))
            .map(|_| ())
            .ok_or_else(|| GatewayError::NotFound(format!("{}/{}", bucket, path)))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::SignUp, None)?;
        if state.accounts.contains_key(email) {
            return Err(GatewayError::Rejected {
                status: 409,
                message: "User already registered".to_string(),
            });
        }
        // Minimum bcrypt cost: this backend never holds real credentials.
        let password_hash = bcrypt::hash(password, 4).map_err(|e| GatewayError::Rejected {
            status: 500,
            message: e.to_string(),
        })?;
        let user = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
        };
        state.accounts.insert(
            email.to_string(),
            Account {
                id: user.id,
                password_hash,
            },
        );
        Ok(Self::open_session(&mut state, user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::SignIn, None)?;
        let id = match state.accounts.get(email) {
            Some(account) if bcrypt::verify(password, &account.password_hash).unwrap_or(false) => {
                account.id
            }
            _ => return Err(GatewayError::Unauthorized("Invalid credentials".to_string())),
        };
        let user = Identity {
            id,
            email: email.to_string(),
        };
        Ok(Self::open_session(&mut state, user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::SignOut, None)?;
        state
            .sessions
            .remove(access_token)
            .map(|_| ())
            .ok_or_else(|| GatewayError::Unauthorized("Invalid token".to_string()))
    }

    async fn current_session(&self, access_token: &str) -> Result<Option<Identity>, GatewayError> {
        let mut state = self.state.lock().await;
        state.record(Operation::Session, None)?;
        let now = Utc::now();
        state.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok(state.sessions.get(access_token).map(|(user, _)| user.clone()))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::Column;

    #[tokio::test]
    async fn insert_fills_defaults_and_timestamps() {
        let gateway = MemoryGateway::default();
        let record = gateway
            .insert(Entity::Tasks, json!({ "title": "Write docs", "project_id": Uuid::nil() }))
            .await
            .unwrap();

        assert_eq!(record["status"], json!("todo"));
        assert!(id_of(&record).is_some());
        assert!(created_at(&record).is_some());
        assert!(record.get("updated_at").is_some());
    }

    #[tokio::test]
    async fn list_is_filtered_and_newest_first() {
        let gateway = MemoryGateway::default();
        let owner = Uuid::new_v4();
        gateway
            .seed(Entity::Tasks, json!({ "id": Uuid::new_v4(), "title": "old", "created_by": owner, "created_at": "2024-01-01T00:00:00Z" }))
            .await;
        gateway
            .seed(Entity::Tasks, json!({ "id": Uuid::new_v4(), "title": "new", "created_by": owner, "created_at": "2024-02-01T00:00:00Z" }))
            .await;
        gateway
            .seed(Entity::Tasks, json!({ "id": Uuid::new_v4(), "title": "other", "created_by": Uuid::new_v4(), "created_at": "2024-03-01T00:00:00Z" }))
            .await;

        let rows = gateway
            .list(Entity::Tasks, &[Filter::eq(Column::CreatedBy, owner)])
            .await
            .unwrap();
        let titles: Vec<_> = rows.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let gateway = MemoryGateway::default();
        gateway.fail_next(Operation::List, 1).await;
        assert!(gateway.list(Entity::Projects, &[]).await.is_err());
        assert!(gateway.list(Entity::Projects, &[]).await.is_ok());
        assert_eq!(gateway.call_count(Operation::List, Some(Entity::Projects)).await, 2);
    }

    #[tokio::test]
    async fn sign_out_ends_the_session() {
        let gateway = MemoryGateway::default();
        let session = gateway.sign_up("ada@example.com", "correct horse").await.unwrap();
        assert!(gateway.current_session(&session.access_token).await.unwrap().is_some());
        assert!(gateway.sign_in("ada@example.com", "wrong").await.is_err());

        gateway.sign_out(&session.access_token).await.unwrap();
        assert!(gateway.current_session(&session.access_token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped() {
        let gateway = MemoryGateway::default();
        let live = gateway.sign_up("ada@example.com", "correct horse").await.unwrap();
        let stale = gateway.sign_in("ada@example.com", "correct horse").await.unwrap();
        gateway
            .state
            .lock()
            .await
            .sessions
            .insert(stale.access_token.clone(), (stale.user.clone(), Utc::now() - Duration::minutes(1)));

        assert!(gateway.current_session(&stale.access_token).await.unwrap().is_none());
        assert!(gateway.current_session(&live.access_token).await.unwrap().is_some());
        let state = gateway.state.lock().await;
        assert_eq!(state.sessions.len(), 1);
        assert!(!state.sessions.contains_key(&stale.access_token));
    }

    #[tokio::test]
    async fn call_log_keeps_only_recent_calls() {
        let gateway = MemoryGateway::default();
        for _ in 0..CALL_LOG_LIMIT {
            gateway.list(Entity::Projects, &[]).await.unwrap();
        }
        for _ in 0..10 {
            gateway.get(Entity::Tasks, Uuid::nil()).await.unwrap();
        }

        assert_eq!(gateway.state.lock().await.calls.len(), CALL_LOG_LIMIT);
        assert_eq!(gateway.call_count(Operation::Get, Some(Entity::Tasks)).await, 10);
        assert_eq!(
            gateway.call_count(Operation::List, Some(Entity::Projects)).await,
            CALL_LOG_LIMIT - 10
        );
    }
}
