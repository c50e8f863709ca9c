use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gateway::GatewayError;
use crate::models::{AuthSession, Identity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (profile id)
    pub email: String,
    pub jti: String, // Token id, used for revocation
    pub exp: usize,  // Expiration time (Unix timestamp)
    pub iat: usize,  // Issued at (Unix timestamp)
}

impl Claims {
    pub fn identity(&self) -> Option<Identity> {
        Some(Identity {
            id: Uuid::parse_str(&self.sub).ok()?,
            email: self.email.clone(),
        })
    }

    pub fn token_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.jti).ok()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }
}

/// Issues and verifies HS256 access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user: Identity) -> Result<AuthSession, GatewayError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| GatewayError::InvalidRecord("token lifetime overflow".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| {
            log::error!("JWT encoding error: {}", e);
            GatewayError::Unauthorized("failed to generate token".to_string())
        })?;

        Ok(AuthSession {
            access_token,
            expires_at,
            user,
        })
    }

    /// Decodes a token, `None` when the signature or expiry check fails.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| log::warn!("JWT validation error: {}", e))
        .ok()
        .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn issued_tokens_verify_back_to_the_identity() {
        let issuer = TokenIssuer::new("secret", 24);
        let user = identity();
        let session = issuer.issue(user.clone()).unwrap();

        let claims = issuer.verify(&session.access_token).unwrap();
        assert_eq!(claims.identity(), Some(user));
        assert!(claims.token_id().is_some());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let session = TokenIssuer::new("one", 24).issue(identity()).unwrap();
        assert!(TokenIssuer::new("two", 24).verify(&session.access_token).is_none());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = TokenIssuer::new("secret", -2);
        let session = issuer.issue(identity()).unwrap();
        assert!(issuer.verify(&session.access_token).is_none());
    }
}
