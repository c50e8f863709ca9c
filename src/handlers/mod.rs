pub mod account;
pub mod auth;
pub mod file;
pub mod health;
pub mod overview;
pub mod project;
pub mod task;

pub use account::account_config;
pub use auth::auth_config;
pub use file::file_config;
pub use health::health_config;
pub use overview::overview_config;
pub use project::project_config;
pub use task::task_config;

use actix_web::web;

/// Registers every API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(health_config)
        .configure(auth_config)
        .configure(overview_config)
        .configure(project_config)
        .configure(task_config)
        .configure(account_config)
        .configure(file_config);
}
