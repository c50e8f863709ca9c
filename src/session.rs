//! Per-request session resolved from the bearer token.
//!
//! Nothing about the caller is cached between requests: each extraction asks
//! the gateway who owns the token, and [`Session::invalidate`] revokes it.

use std::sync::Arc;

use actix_web::http::header::Header;
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::gateway::RemoteGateway;
use crate::models::Identity;
use crate::state::AppState;
use crate::utils::errors::ServiceError;

pub struct Session {
    identity: Identity,
    access_token: String,
    gateway: Arc<dyn RemoteGateway>,
}

impl Session {
    /// Looks up the identity behind `access_token`.
    pub async fn resolve(
        gateway: Arc<dyn RemoteGateway>,
        access_token: &str,
    ) -> Result<Self, ServiceError> {
        let identity = gateway
            .current_session(access_token)
            .await
            .map_err(|e| {
                log::error!("Session lookup failed: {}", e);
                ServiceError::from(e)
            })?
            .ok_or_else(|| {
                log::warn!("Rejected unknown, expired or revoked token");
                ServiceError::Unauthorized("Your session has expired, please sign in again".to_string())
            })?;

        Ok(Self {
            identity,
            access_token: access_token.to_string(),
            gateway,
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.identity.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn gateway(&self) -> &dyn RemoteGateway {
        self.gateway.as_ref()
    }

    /// Signs out. The token is rejected by every later request.
    pub async fn invalidate(self) -> Result<(), ServiceError> {
        self.gateway.sign_out(&self.access_token).await?;
        log::info!("Session closed for {}", self.identity.email);
        Ok(())
    }
}

impl FromRequest for Session {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let gateway = req
            .app_data::<web::Data<AppState>>()
            .map(|state| state.gateway.clone());
        let token = Authorization::<Bearer>::parse(req)
            .ok()
            .map(|auth| auth.into_scheme().token().to_string());

        Box::pin(async move {
            let gateway = gateway
                .ok_or_else(|| ServiceError::InternalError("Application state is not configured".to_string()))?;
            let token = token.ok_or_else(|| {
                log::warn!("Request without bearer token");
                ServiceError::Unauthorized("Authentication required".to_string())
            })?;
            Session::resolve(gateway, &token).await
        })
    }
}
