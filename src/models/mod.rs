pub mod auth;
pub mod file;
pub mod profile;
pub mod project;
pub mod task;

pub use auth::{ApiResponse, AuthSession, ErrorResponse, Identity};
pub use file::{Attachment, FileUpload};
pub use profile::Profile;
pub use project::{Priority, Project};
pub use task::{Task, TaskStatus};
