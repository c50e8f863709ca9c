use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Taskboard API",
        description = "Projects, Kanban tasks, calendar and attachments"
    ),
    paths(
        handlers::health::health_check,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::get_me,
        handlers::overview::get_dashboard,
        handlers::overview::get_calendar,
        handlers::project::get_projects,
        handlers::project::create_project,
        handlers::project::get_project,
        handlers::project::update_project,
        handlers::project::delete_project,
        handlers::project::upload_attachment,
        handlers::project::delete_attachment,
        handlers::task::get_tasks,
        handlers::task::create_task,
        handlers::task::get_task,
        handlers::task::update_task,
        handlers::task::delete_task,
        handlers::task::change_status,
        handlers::task::toggle_task,
        handlers::task::drop_card,
        handlers::account::get_account,
        handlers::account::update_account,
        handlers::account::upload_avatar,
        handlers::file::download_file,
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service status"),
        (name = "auth", description = "Sign up, sign in and sessions"),
        (name = "views", description = "Dashboard and calendar"),
        (name = "projects", description = "Project management"),
        (name = "attachments", description = "Project files"),
        (name = "tasks", description = "Tasks and the Kanban board"),
        (name = "account", description = "Profile and settings"),
        (name = "storage", description = "Stored files")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
