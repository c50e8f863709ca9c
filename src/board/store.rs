use uuid::Uuid;

use crate::gateway::{list_as, Column, Entity, Filter, GatewayError, RemoteGateway};
use crate::models::{Project, Task};

/// In-memory projects and tasks owned by one interaction scope.
///
/// Arrays keep the order returned by the gateway (newest first); views are
/// derived from them on demand.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

impl EntityStore {
    pub fn new(projects: Vec<Project>, tasks: Vec<Task>) -> Self {
        Self { projects, tasks }
    }

    /// Loads everything owned by `user_id`.
    pub async fn load(gateway: &dyn RemoteGateway, user_id: Uuid) -> Result<Self, GatewayError> {
        let owner = [Filter::eq(Column::CreatedBy, user_id)];
        let projects = list_as::<Project>(gateway, Entity::Projects, &owner).await?;
        let tasks = list_as::<Task>(gateway, Entity::Tasks, &owner).await?;
        log::debug!(
            "Loaded {} projects and {} tasks for {}",
            projects.len(),
            tasks.len(),
            user_id
        );
        Ok(Self { projects, tasks })
    }

    /// Loads one project's tasks. Only the given project is kept.
    pub async fn load_project(
        gateway: &dyn RemoteGateway,
        project: Project,
    ) -> Result<Self, GatewayError> {
        let tasks = list_as::<Task>(
            gateway,
            Entity::Tasks,
            &[Filter::eq(Column::ProjectId, project.id)],
        )
        .await?;
        Ok(Self {
            projects: vec![project],
            tasks,
        })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut [Task] {
        &mut self.tasks
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }
}
