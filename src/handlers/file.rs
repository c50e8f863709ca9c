use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Result};
use futures_util::TryStreamExt;

use crate::models::file::FileUpload;
use crate::services::files::content_type_for;
use crate::state::AppState;
use crate::utils::errors::ServiceError;

/// Reads the first file field of a multipart form, enforcing `max_bytes` while streaming.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<FileUpload, ServiceError> {
    while let Some(mut field) = payload.try_next().await.map_err(|e| {
        log::error!("Multipart error: {}", e);
        ServiceError::ValidationError("Invalid multipart data".to_string())
    })? {
        let file_name = match field.content_disposition().and_then(|cd| cd.get_filename()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        log::info!("Processing file: {}", file_name);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(|e| {
            log::error!("File chunk error: {}", e);
            ServiceError::ValidationError("Error reading file data".to_string())
        })? {
            bytes.extend_from_slice(&chunk);
            // Check size during upload to prevent memory issues
            if bytes.len() > max_bytes {
                return Err(ServiceError::ValidationError(format!(
                    "File size exceeds {}MB limit",
                    max_bytes / (1024 * 1024)
                )));
            }
        }
        return Ok(FileUpload { file_name, bytes });
    }

    Err(ServiceError::ValidationError("No file found in request".to_string()))
}

/// Serve a stored file
#[utoipa::path(
    get,
    path = "/storage/{bucket}/{path}",
    tag = "storage",
    params(
        ("bucket" = String, Path, description = "Storage bucket"),
        ("path" = String, Path, description = "Object path inside the bucket")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = crate::models::ErrorResponse)
    )
)]
pub async fn download_file(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, ServiceError> {
    let (bucket, object) = path.into_inner();
    log::info!("GET /storage/{}/{}", bucket, object);

    let bytes = state.gateway.download_file(&bucket, &object).await.map_err(|e| {
        log::warn!("File not served {}/{}: {}", bucket, object, e);
        ServiceError::from(e)
    })?;

    let content_type = content_type_for(&object);
    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}

pub fn file_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/storage/{bucket}/{path:.*}", web::get().to(download_file));
}
