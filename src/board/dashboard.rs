use chrono::{Duration, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::board::views::sorted_for_display;
use crate::models::{Project, Task, TaskStatus};

/// Days ahead counted as "upcoming" on the dashboard.
pub const UPCOMING_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.todo + self.in_progress + self.done
    }

    fn add(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::Todo => self.todo += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Done => self.done += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProjectProgress {
    pub project_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub done: usize,
    pub total: usize,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub tasks: StatusCounts,
    pub completion_percent: u8,
    pub overdue: Vec<Task>,
    pub upcoming: Vec<Task>,
    pub projects: Vec<ProjectProgress>,
}

fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((done * 100) / total) as u8
}

pub fn dashboard(projects: &[Project], tasks: &[Task], today: NaiveDate) -> DashboardSummary {
    let mut counts = StatusCounts::default();
    for task in tasks {
        counts.add(task.status);
    }

    let horizon = today + Duration::days(UPCOMING_DAYS);
    let open = || tasks.iter().filter(|t| !t.status.is_done());
    let overdue = sorted_for_display(open().filter(|t| t.due_date.is_some_and(|d| d < today)));
    let upcoming = sorted_for_display(
        open().filter(|t| t.due_date.is_some_and(|d| d >= today && d <= horizon)),
    );

    let projects = projects
        .iter()
        .map(|project| {
            let (done, total) = tasks
                .iter()
                .filter(|t| t.project_id == project.id)
                .fold((0, 0), |(done, total), t| {
                    (done + usize::from(t.status.is_done()), total + 1)
                });
            ProjectProgress {
                project_id: project.id,
                title: project.title.clone(),
                status: project.status,
                done,
                total,
                percent: percent(done, total),
            }
        })
        .collect::<Vec<_>>();

    DashboardSummary {
        total_projects: projects.len(),
        completion_percent: percent(counts.done, counts.total()),
        tasks: counts,
        overdue,
        upcoming,
        projects,
    }
}
