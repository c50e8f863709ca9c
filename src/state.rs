use std::sync::Arc;

use crate::gateway::RemoteGateway;
use crate::services::files::UploadPolicy;

/// Shared application data. Holds no entity state: every request loads its own.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn RemoteGateway>,
    pub uploads: UploadPolicy,
}

impl AppState {
    pub fn new(gateway: Arc<dyn RemoteGateway>, uploads: UploadPolicy) -> Self {
        Self { gateway, uploads }
    }
}
