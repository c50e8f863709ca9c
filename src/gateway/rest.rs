use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::gateway::{writable_keys, Entity, Filter, GatewayError, Record, RemoteGateway};
use crate::models::{AuthSession, Identity};

/// Gateway for a hosted backend exposing PostgREST (`/rest/v1`), object
/// storage (`/storage/v1`) and a GoTrue-style auth API (`/auth/v1`).
///
/// Data calls use the service key; scoping to the requesting user is done by
/// the caller's `created_by` / `id` filters.
pub struct RestGateway {
    client: Client,
    base_url: String,
    service_key: String,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

impl From<RemoteUser> for Identity {
    fn from(user: RemoteUser) -> Self {
        Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: RemoteUser,
}

impl From<TokenResponse> for AuthSession {
    fn from(token: TokenResponse) -> Self {
        AuthSession {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
            user: token.user.into(),
        }
    }
}

impl RestGateway {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        }
    }

    fn table_url(&self, entity: Entity) -> String {
        format!("{}/rest/v1/{}", self.base_url, entity.table())
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, path)
    }

    fn auth_url(&self, endpoint: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, endpoint)
    }

    fn with_service_key(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn with_user_token(&self, request: RequestBuilder, access_token: &str) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(access_token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            log::error!("Remote request failed: {}", e);
            GatewayError::from(e)
        })?;
        check_status(response).await
    }

    async fn rows(&self, request: RequestBuilder) -> Result<Vec<Record>, GatewayError> {
        json_body(self.send(request).await?).await
    }
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    log::warn!("Remote service answered {}: {}", status, message);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized(message),
        StatusCode::NOT_FOUND => GatewayError::NotFound(message),
        _ => GatewayError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    response
        .json::<T>()
        .await
        .map_err(|e| GatewayError::InvalidRecord(e.to_string()))
}

fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.as_str().to_string(), format!("eq.{}", f.value)))
        .collect()
}

fn id_param(id: Uuid) -> [(&'static str, String); 1] {
    [("id", format!("eq.{}", id))]
}

#[async_trait]
impl RemoteGateway for RestGateway {
    async fn list(&self, entity: Entity, filters: &[Filter]) -> Result<Vec<Record>, GatewayError> {
        let request = self
            .client
            .get(self.table_url(entity))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(&filter_params(filters));
        self.rows(self.with_service_key(request)).await
    }

    async fn get(&self, entity: Entity, id: Uuid) -> Result<Option<Record>, GatewayError> {
        let request = self
            .client
            .get(self.table_url(entity))
            .query(&[("select", "*"), ("limit", "1")])
            .query(&id_param(id));
        Ok(self.rows(self.with_service_key(request)).await?.into_iter().next())
    }

    async fn insert(&self, entity: Entity, fields: Record) -> Result<Record, GatewayError> {
        writable_keys(entity, &fields)?;
        let request = self
            .client
            .post(self.table_url(entity))
            .header("Prefer", "return=representation")
            .json(&fields);
        self.rows(self.with_service_key(request))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidRecord("insert returned no rows".to_string()))
    }

    async fn update(&self, entity: Entity, id: Uuid, fields: Record) -> Result<Record, GatewayError> {
        writable_keys(entity, &fields)?;
        let request = self
            .client
            .patch(self.table_url(entity))
            .query(&id_param(id))
            .header("Prefer", "return=representation")
            .json(&fields);
        self.rows(self.with_service_key(request))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound(format!("{} {}", entity.table(), id)))
    }

    async fn delete(&self, entity: Entity, id: Uuid) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.table_url(entity))
            .query(&id_param(id))
            .header("Prefer", "return=representation");
        let deleted = self.rows(self.with_service_key(request)).await?;
        if deleted.is_empty() {
            return Err(GatewayError::NotFound(format!("{} {}", entity.table(), id)));
        }
        Ok(())
    }

    async fn upload_file(
        &self,
        bucket: &str,
        path: &str,
        blob: Vec<u8>,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let request = self
            .client
            .post(self.object_url(bucket, path))
            .header(header::CONTENT_TYPE, content_type)
            .body(blob);
        self.send(self.with_service_key(request)).await?;
        Ok(self.public_url(bucket, path))
    }

    async fn download_file(&self, bucket: &str, path: &str) -> Result<Vec<u8>, GatewayError> {
        let request = self.client.get(self.public_url(bucket, path));
        let response = self.send(request).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn delete_file(&self, bucket: &str, path: &str) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .json(&json!({ "prefixes": [path] }));
        self.send(self.with_service_key(request)).await?;
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let request = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.service_key)
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = json_body(self.send(request).await?).await?;
        Ok(token.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let request = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.service_key)
            .json(&json!({ "email": email, "password": password }));
        let token: TokenResponse = json_body(self.send(request).await?).await?;
        Ok(token.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let request = self.client.post(self.auth_url("logout"));
        self.send(self.with_user_token(request, access_token)).await?;
        Ok(())
    }

    async fn current_session(&self, access_token: &str) -> Result<Option<Identity>, GatewayError> {
        let request = self.client.get(self.auth_url("user"));
        match self.send(self.with_user_token(request, access_token)).await {
            Ok(response) => {
                let user: RemoteUser = json_body(response).await?;
                Ok(Some(user.into()))
            }
            Err(GatewayError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        let request = self.client.get(format!("{}/rest/v1/", self.base_url));
        self.send(self.with_service_key(request)).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}
