use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// File attached to a project. `path` is the storage key used for deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: i64,
    pub path: String,
}

/// A file received from a multipart form, not yet stored.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadFileRequest {
    #[schema(format = "binary")]
    pub file: String,
}
