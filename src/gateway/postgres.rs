use async_trait::async_trait;
use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::database::Database;
use crate::gateway::storage::DiskStorage;
use crate::gateway::token::TokenIssuer;
use crate::gateway::{writable_keys, Entity, Filter, GatewayError, Record, RemoteGateway};
use crate::models::{AuthSession, Identity};

/// Gateway backed by PostgreSQL, local disk storage and self-issued tokens.
///
/// Rows travel as `jsonb`: reads use `to_jsonb(t)`, writes go through
/// `jsonb_populate_record` so column types are coerced by the database.
pub struct PgGateway {
    db: Database,
    storage: DiskStorage,
    tokens: TokenIssuer,
}

impl PgGateway {
    pub fn new(db: Database, storage: DiskStorage, tokens: TokenIssuer) -> Self {
        Self { db, storage, tokens }
    }
}

#[async_trait]
impl RemoteGateway for PgGateway {
    async fn list(&self, entity: Entity, filters: &[Filter]) -> Result<Vec<Record>, GatewayError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT to_jsonb(t) AS record FROM {} AS t",
            entity.table()
        ));
        for (i, filter) in filters.iter().enumerate() {
            query.push(if i == 0 { " WHERE " } else { " AND " });
            query.push(format!("t.{} = ", filter.column.as_str()));
            query.push_bind(filter.value);
        }
        query.push(" ORDER BY t.created_at DESC");

        let rows = query.build().fetch_all(&self.db.pool).await.map_err(|e| {
            log::error!("Database error listing {}: {}", entity.table(), e);
            GatewayError::from(e)
        })?;

        rows.iter()
            .map(|row| row.try_get::<Record, _>("record").map_err(GatewayError::from))
            .collect()
    }

    async fn get(&self, entity: Entity, id: Uuid) -> Result<Option<Record>, GatewayError> {
        let sql = format!(
            "SELECT to_jsonb(t) AS record FROM {} AS t WHERE t.id = $1",
            entity.table()
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await
            .map_err(|e| {
                log::error!("Database error fetching {} {}: {}", entity.table(), id, e);
                GatewayError::from(e)
            })?;

        row.map(|r| r.try_get::<Record, _>("record").map_err(GatewayError::from))
            .transpose()
    }

    async fn insert(&self, entity: Entity, fields: Record) -> Result<Record, GatewayError> {
        let keys = writable_keys(entity, &fields)?;
        if keys.is_empty() {
            return Err(GatewayError::InvalidRecord("no fields to insert".to_string()));
        }
        let table = entity.table();
        let columns = keys.join(", ");
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t) AS record"
        );

        let row = sqlx::query(&sql)
            .bind(&fields)
            .fetch_one(&self.db.pool)
            .await
            .map_err(|e| {
                log::error!("Database error inserting into {}: {}", table, e);
                GatewayError::from(e)
            })?;

        Ok(row.try_get::<Record, _>("record")?)
    }

    async fn update(&self, entity: Entity, id: Uuid, fields: Record) -> Result<Record, GatewayError> {
        let keys = writable_keys(entity, &fields)?;
        if keys.is_empty() {
            return self
                .get(entity, id)
                .await?
                .ok_or_else(|| GatewayError::NotFound(format!("{} {}", entity.table(), id)));
        }
        let table = entity.table();
        let mut assignments: Vec<String> = keys.iter().map(|k| format!("{k} = r.{k}")).collect();
        if entity.has_updated_at() {
            assignments.push("updated_at = NOW()".to_string());
        }
        let sql = format!(
            "UPDATE {table} AS t SET {} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE t.id = $2 RETURNING to_jsonb(t) AS record",
            assignments.join(", ")
        );

        let row = sqlx::query(&sql)
            .bind(&fields)
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await
            .map_err(|e| {
                log::error!("Database error updating {} {}: {}", table, id, e);
                GatewayError::from(e)
            })?;

        match row {
            Some(row) => Ok(row.try_get::<Record, _>("record")?),
            None => Err(GatewayError::NotFound(format!("{} {}", table, id))),
        }
    }

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", entity.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.db.pool)
            .await
            .map_err(|e| {
                log::error!("Database error deleting {} {}: {}", entity.table(), id, e);
                GatewayError::from(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::NotFound(format!("{} {}", entity.table(), id)));
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
        self.storage.put(bucket, path, &blob).await
    }

    async fn download_file(&self, bucket: &str, path: &str) -> Result<Vec<u8>, GatewayError> {
        self.storage.get(bucket, path).await
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), GatewayError> {
        self.storage.remove(bucket, path).await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let existing = sqlx::query("SELECT id FROM credentials WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db.pool)
            .await?;
        if existing.is_some() {
            log::warn!("Sign up rejected: email already registered - {}", email);
            return Err(GatewayError::Rejected {
                status: 409,
                message: "User already registered".to_string(),
            });
        }

        let password_hash = hash(password, DEFAULT_COST).map_err(|e| {
            log::error!("Password hashing error: {}", e);
            GatewayError::Rejected {
                status: 500,
                message: "Password hashing failed".to_string(),
            }
        })?;

        let row = sqlx::query(
            "INSERT INTO credentials (email, password_hash) VALUES ($1, $2) RETURNING id"
        )
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.db.pool)
        .await?;

        let user = Identity {
            id: row.get("id"),
            email: email.to_string(),
        };
        log::info!("Account created: {}", user.id);
        self.tokens.issue(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let row = sqlx::query("SELECT id, password_hash FROM credentials WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db.pool)
            .await?;

        let row = match row {
            Some(row) => row,
            None => {
                log::warn!("Login failed: unknown email - {}", email);
                return Err(GatewayError::Unauthorized("Invalid credentials".to_string()));
            }
        };

        let stored_hash: String = row.get("password_hash");
        let password_valid = verify(password, &stored_hash).map_err(|e| {
            log::error!("Password verification error: {}", e);
            GatewayError::Unauthorized("Password verification failed".to_string())
        })?;

        if !password_valid {
            log::warn!("Login failed: invalid password for {}", email);
            return Err(GatewayError::Unauthorized("Invalid credentials".to_string()));
        }

        self.tokens.issue(Identity {
            id: row.get("id"),
            email: email.to_string(),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let claims = self
            .tokens
            .verify(access_token)
            .ok_or_else(|| GatewayError::Unauthorized("Invalid token".to_string()))?;
        let jti = claims
            .token_id()
            .ok_or_else(|| GatewayError::Unauthorized("Invalid token id".to_string()))?;

        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING"
        )
        .bind(jti)
        .bind(claims.expires_at())
        .execute(&self.db.pool)
        .await?;

        // Expired entries can never match a valid token again.
        if let Err(e) = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.db.pool)
            .await
        {
            log::warn!("Failed to purge expired revocations: {}", e);
        }

        Ok(())
    }

    async fn current_session(&self, access_token: &str) -> Result<Option<Identity>, GatewayError> {
        let Some(claims) = self.tokens.verify(access_token) else {
            return Ok(None);
        };
        let Some(jti) = claims.token_id() else {
            return Ok(None);
        };

        let revoked = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.db.pool)
            .await?;
        if revoked.is_some() {
            return Ok(None);
        }

        Ok(claims.identity())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        self.db
            .health_check()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
