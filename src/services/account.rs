use serde_json::json;

use crate::gateway::{get_as, insert_as, update_as, Entity, GatewayError, RemoteGateway};
use crate::models::auth::{LoginRequest, LoginResponseData, SignUpRequest};
use crate::models::file::FileUpload;
use crate::models::profile::UpdateProfileRequest;
use crate::models::task::normalize_optional;
use crate::models::{AuthSession, Identity, Profile};
use crate::services::files::{storage_path, UploadPolicy, AVATARS_BUCKET};
use crate::session::Session;
use crate::utils::errors::ServiceError;
use crate::utils::validation::check;

async fn create_profile(
    gateway: &dyn RemoteGateway,
    user: &Identity,
    full_name: Option<String>,
) -> Result<Profile, ServiceError> {
    let profile = insert_as::<Profile>(
        gateway,
        Entity::Profiles,
        json!({ "id": user.id, "email": user.email, "full_name": full_name }),
    )
    .await
    .map_err(|e| {
        log::error!("Failed to create profile for {}: {}", user.email, e);
        ServiceError::from(e)
    })?;
    Ok(profile)
}

fn login_data(session: AuthSession, profile: Profile) -> LoginResponseData {
    LoginResponseData {
        token: session.access_token,
        expires_at: session.expires_at,
        profile,
    }
}

/// Creates the account and its profile, returning a signed-in session.
pub async fn sign_up(
    gateway: &dyn RemoteGateway,
    request: SignUpRequest,
) -> Result<LoginResponseData, ServiceError> {
    let request = SignUpRequest {
        email: request.email.trim().to_lowercase(),
        full_name: normalize_optional(request.full_name),
        ..request
    };
    check(&request)?;

    let session = gateway.sign_up(&request.email, &request.password).await?;
    let profile = create_profile(gateway, &session.user, request.full_name).await?;
    log::info!("Account created: {}", profile.email);
    Ok(login_data(session, profile))
}

pub async fn sign_in(
    gateway: &dyn RemoteGateway,
    request: LoginRequest,
) -> Result<LoginResponseData, ServiceError> {
    let request = LoginRequest {
        email: request.email.trim().to_lowercase(),
        ..request
    };
    check(&request)?;

    let session = gateway
        .sign_in(&request.email, &request.password)
        .await
        .map_err(|e| {
            log::warn!("Login failed for {}: {}", request.email, e);
            match e {
                GatewayError::Unauthorized(msg) => ServiceError::AuthenticationError(msg),
                other => ServiceError::from(other),
            }
        })?;

    let profile = match get_as::<Profile>(gateway, Entity::Profiles, session.user.id).await? {
        Some(profile) => profile,
        None => create_profile(gateway, &session.user, None).await?,
    };
    log::info!("Login successful for user: {}", profile.email);
    Ok(login_data(session, profile))
}

pub async fn sign_out(session: Session) -> Result<(), ServiceError> {
    session.invalidate().await
}

pub async fn profile(session: &Session) -> Result<Profile, ServiceError> {
    match get_as::<Profile>(session.gateway(), Entity::Profiles, session.user_id()).await? {
        Some(profile) => Ok(profile),
        None => create_profile(session.gateway(), session.identity(), None).await,
    }
}

pub async fn update_profile(
    session: &Session,
    request: UpdateProfileRequest,
) -> Result<Profile, ServiceError> {
    let request = request.normalized();
    check(&request)?;
    let fields = request.into_record();
    if fields.as_object().is_some_and(|f| f.is_empty()) {
        return Err(ServiceError::ValidationError("No changes provided".to_string()));
    }
    profile(session).await?;

    let profile =
        update_as::<Profile>(session.gateway(), Entity::Profiles, session.user_id(), fields).await?;
    log::info!("Profile updated: {}", profile.email);
    Ok(profile)
}

pub async fn upload_avatar(
    session: &Session,
    upload: FileUpload,
    policy: &UploadPolicy,
) -> Result<Profile, ServiceError> {
    let content_type = policy.validate_image(&upload.file_name, upload.bytes.len())?;
    profile(session).await?;

    let path = storage_path(session.user_id(), &upload.file_name);
    let url = session
        .gateway()
        .upload_file(AVATARS_BUCKET, &path, upload.bytes, &content_type)
        .await
        .map_err(|e| {
            log::error!("Avatar upload failed: {}", e);
            ServiceError::gateway("Upload failed", e.to_string())
        })?;

    let profile = update_as::<Profile>(
        session.gateway(),
        Entity::Profiles,
        session.user_id(),
        json!({ "avatar_url": url }),
    )
    .await?;
    log::info!("Avatar updated for {}", profile.email);
    Ok(profile)
}
