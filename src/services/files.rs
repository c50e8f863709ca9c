use std::path::Path;

use uuid::Uuid;

use crate::utils::errors::ServiceError;

pub const ATTACHMENTS_BUCKET: &str = "attachments";
pub const AVATARS_BUCKET: &str = "avatars";

const ALLOWED_EXTENSIONS: [&str; 16] = [
    "jpg", "jpeg", "png", "gif", "webp", "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt",
    "csv", "json", "zip",
];
const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Size and type limits for uploaded files.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

pub fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .unwrap_or_default()
}

fn mime_for(extension: &str) -> String {
    match extension {
        "jpg" | "jpeg" => mime::IMAGE_JPEG.to_string(),
        "png" => mime::IMAGE_PNG.to_string(),
        "gif" => mime::IMAGE_GIF.to_string(),
        "webp" => "image/webp".to_string(),
        "pdf" => mime::APPLICATION_PDF.to_string(),
        "doc" => "application/msword".to_string(),
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document".to_string(),
        "xls" => "application/vnd.ms-excel".to_string(),
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        "ppt" => "application/vnd.ms-powerpoint".to_string(),
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation".to_string(),
        "txt" => mime::TEXT_PLAIN.to_string(),
        "csv" => mime::TEXT_CSV.to_string(),
        "json" => mime::APPLICATION_JSON.to_string(),
        "zip" => "application/zip".to_string(),
        _ => mime::APPLICATION_OCTET_STREAM.to_string(),
    }
}

/// Content type served for a stored object, by extension.
pub fn content_type_for(file_name: &str) -> String {
    mime_for(&extension_of(file_name))
}

impl UploadPolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn check_size(&self, size: usize) -> Result<(), ServiceError> {
        if size == 0 {
            return Err(ServiceError::ValidationError("File is empty".to_string()));
        }
        if size > self.max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "File size exceeds {}MB limit",
                self.max_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    /// Checks an attachment and returns its content type.
    pub fn validate_file(&self, file_name: &str, size: usize) -> Result<String, ServiceError> {
        self.check_size(size)?;
        let extension = extension_of(file_name);
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "File type '{}' not allowed",
                extension
            )));
        }
        Ok(mime_for(&extension))
    }

    pub fn validate_image(&self, file_name: &str, size: usize) -> Result<String, ServiceError> {
        self.check_size(size)?;
        let extension = extension_of(file_name);
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ServiceError::ValidationError(
                "Avatar must be a JPG, PNG, GIF or WebP image".to_string(),
            ));
        }
        Ok(mime_for(&extension))
    }
}

/// `{user_id}/{uuid}.{ext}`: scoped by owner, unique per upload.
pub fn storage_path(user_id: Uuid, file_name: &str) -> String {
    let extension = extension_of(file_name);
    let extension = if extension.is_empty() { "bin".to_string() } else { extension };
    format!("{}/{}.{}", user_id, Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachments_are_checked_by_extension_and_size() {
        let policy = UploadPolicy::new(1024);
        assert_eq!(policy.validate_file("Brief.PDF", 10).unwrap(), "application/pdf");
        assert_eq!(policy.validate_file("data.csv", 10).unwrap(), "text/csv");
        assert!(policy.validate_file("run.exe", 10).is_err());
        assert!(policy.validate_file("notes.txt", 2048).is_err());
        assert!(policy.validate_file("notes.txt", 0).is_err());
    }

    #[test]
    fn avatars_must_be_images() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.validate_image("me.png", 10).unwrap(), "image/png");
        assert!(policy.validate_image("me.pdf", 10).is_err());
    }

    #[test]
    fn storage_paths_are_scoped_and_unique() {
        let user = Uuid::new_v4();
        let a = storage_path(user, "plan.docx");
        let b = storage_path(user, "plan.docx");
        assert!(a.starts_with(&format!("{}/", user)));
        assert!(a.ends_with(".docx"));
        assert_ne!(a, b);
        assert!(storage_path(user, "README").ends_with(".bin"));
    }
}
