use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::board::views::{project_colors, FALLBACK_COLOR};
use crate::models::{Project, Task, TaskStatus};

/// All-day calendar entry for an open task with a due date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    pub all_day: bool,
    pub color: String,
    pub status: TaskStatus,
    pub project_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_title: Option<String>,
}

/// One event per open, dated task, colored by its project's list position.
pub fn calendar_events(tasks: &[Task], projects: &[Project]) -> Vec<CalendarEvent> {
    let colors = project_colors(projects);
    tasks
        .iter()
        .filter(|task| !task.status.is_done())
        .filter_map(|task| {
            let date = task.due_date?;
            let project = projects.iter().find(|p| p.id == task.project_id);
            Some(CalendarEvent {
                id: task.id,
                title: task.title.clone(),
                date,
                all_day: true,
                color: colors
                    .get(&task.project_id)
                    .copied()
                    .unwrap_or(FALLBACK_COLOR)
                    .to_string(),
                status: task.status,
                project_id: task.project_id,
                project_title: project.map(|p| p.title.clone()),
            })
        })
        .collect()
}

pub fn events_by_day(events: Vec<CalendarEvent>) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();
    for event in events {
        days.entry(event.date).or_default().push(event);
    }
    days
}

pub fn events_in_month(events: Vec<CalendarEvent>, year: i32, month: u32) -> Vec<CalendarEvent> {
    events
        .into_iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    use crate::board::views::PALETTE;
    use crate::models::Priority;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn project() -> Project {
        Project {
            id: Uuid::new_v4(),
            title: "Launch".into(),
            description: "launch the product".into(),
            status: TaskStatus::InProgress,
            priority: Priority::High,
            due_date: None,
            tags: vec![],
            attachments: vec![],
            color: None,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    fn task(project_id: Uuid, status: TaskStatus, due: Option<NaiveDate>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "task".into(),
            description: None,
            due_date: due,
            status,
            project_id,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn done_and_undated_tasks_are_left_out() {
        let p = project();
        let day = date(2024, 6, 3);
        let tasks = vec![
            task(p.id, TaskStatus::Done, Some(day)),
            task(p.id, TaskStatus::Todo, None),
            task(p.id, TaskStatus::InProgress, Some(day)),
        ];
        let events = calendar_events(&tasks, &[p]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, tasks[2].id);
        assert!(events[0].all_day);
    }

    #[test]
    fn tasks_sharing_a_date_are_separate_events() {
        let p = project();
        let day = date(2024, 6, 3);
        let tasks = vec![
            task(p.id, TaskStatus::Todo, Some(day)),
            task(p.id, TaskStatus::Todo, Some(day)),
        ];
        let days = events_by_day(calendar_events(&tasks, &[p]));
        assert_eq!(days[&day].len(), 2);
        assert_ne!(days[&day][0].id, days[&day][1].id);
    }

    #[test]
    fn events_take_their_project_color() {
        let first = project();
        let second = project();
        let orphan = task(Uuid::new_v4(), TaskStatus::Todo, Some(date(2024, 6, 1)));
        let tasks = vec![
            task(second.id, TaskStatus::Todo, Some(date(2024, 6, 1))),
            orphan,
        ];
        let events = calendar_events(&tasks, &[first, second]);
        assert_eq!(events[0].color, PALETTE[1]);
        assert_eq!(events[0].project_title.as_deref(), Some("Launch"));
        assert_eq!(events[1].color, FALLBACK_COLOR);
        assert_eq!(events[1].project_title, None);
    }

    #[test]
    fn month_window_filters_by_year_and_month() {
        let p = project();
        let tasks = vec![
            task(p.id, TaskStatus::Todo, Some(date(2024, 5, 31))),
            task(p.id, TaskStatus::Todo, Some(date(2024, 6, 1))),
            task(p.id, TaskStatus::Todo, Some(date(2025, 6, 1))),
        ];
        let june = events_in_month(calendar_events(&tasks, &[p]), 2024, 6);
        assert_eq!(june.len(), 1);
        assert_eq!(june[0].date, date(2024, 6, 1));
    }
}
