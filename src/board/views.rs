use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Project, Task, TaskStatus};

/// Calendar colors, assigned by project position and reused cyclically.
pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

/// Color for tasks whose project is not in the list.
pub const FALLBACK_COLOR: &str = "#6b7280";

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct KanbanBoard {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    /// Shown as a separate collapsible list.
    pub done: Vec<Task>,
}

impl KanbanBoard {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Done => &self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.todo.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partitions tasks by status, keeping their relative order.
pub fn kanban<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> KanbanBoard {
    let mut board = KanbanBoard::default();
    for task in tasks {
        match task.status {
            TaskStatus::Todo => board.todo.push(task.clone()),
            TaskStatus::InProgress => board.in_progress.push(task.clone()),
            TaskStatus::Done => board.done.push(task.clone()),
        }
    }
    board
}

/// Open before done; dated before undated, earliest due first; newest created first.
pub fn display_order(a: &Task, b: &Task) -> Ordering {
    a.status
        .is_done()
        .cmp(&b.status.is_done())
        .then_with(|| match (a.due_date, b.due_date) {
            _ if a.status.is_done() => Ordering::Equal,
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

pub fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(display_order);
}

pub fn sorted_for_display<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks.into_iter().cloned().collect();
    sort_for_display(&mut tasks);
    tasks
}

pub fn palette_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Color per project id, by position in `projects`.
pub fn project_colors(projects: &[Project]) -> HashMap<Uuid, &'static str> {
    projects
        .iter()
        .enumerate()
        .map(|(index, project)| (project.id, palette_color(index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::models::Priority;

    fn task(title: &str, status: TaskStatus, due: Option<NaiveDate>, age_minutes: i64) -> Task {
        let created_at = Utc::now() - Duration::minutes(age_minutes);
        Task {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            due_date: due,
            status,
            project_id: Uuid::nil(),
            created_by: Uuid::nil(),
            created_at,
            updated_at: created_at,
        }
    }

    fn project(title: &str) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "a project description".into(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            due_date: None,
            tags: vec![],
            attachments: vec![],
            color: None,
            created_by: Uuid::nil(),
            created_at: Utc::now(),
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn kanban_partitions_by_status_in_array_order() {
        let tasks = vec![
            task("a", TaskStatus::Todo, None, 1),
            task("b", TaskStatus::Done, None, 2),
            task("c", TaskStatus::InProgress, None, 3),
            task("d", TaskStatus::Todo, None, 4),
        ];
        let board = kanban(&tasks);
        assert_eq!(titles(&board.todo), vec!["a", "d"]);
        assert_eq!(titles(&board.in_progress), vec!["c"]);
        assert_eq!(titles(board.column(TaskStatus::Done)), vec!["b"]);
        assert_eq!(board.len(), 4);
    }

    #[test]
    fn display_order_puts_dated_open_work_first() {
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        let a = task("A", TaskStatus::Done, None, 30);
        let b = task("B", TaskStatus::Todo, Some(tomorrow), 20);
        let c = task("C", TaskStatus::Todo, None, 10);
        let sorted = sorted_for_display(&[a, c, b]);
        assert_eq!(titles(&sorted), vec!["B", "C", "A"]);
    }

    #[test]
    fn done_tasks_ignore_due_dates_and_fall_back_to_recency() {
        let today = Utc::now().date_naive();
        let older = task("older", TaskStatus::Done, Some(today), 60);
        let newer = task("newer", TaskStatus::Done, Some(today + Duration::days(9)), 5);
        let sorted = sorted_for_display(&[older, newer]);
        assert_eq!(titles(&sorted), vec!["newer", "older"]);
    }

    #[test]
    fn palette_cycles_by_position() {
        let projects: Vec<Project> = (0..=PALETTE.len()).map(|i| project(&i.to_string())).collect();
        let colors = project_colors(&projects);
        assert_eq!(colors[&projects[0].id], colors[&projects[PALETTE.len()].id]);
        assert_ne!(colors[&projects[0].id], colors[&projects[1].id]);
    }

    #[test]
    fn palette_follows_list_order_not_identity() {
        let p1 = project("p1");
        let p2 = project("p2");
        let forward = project_colors(&[p1.clone(), p2.clone()]);
        let reversed = project_colors(&[p2.clone(), p1.clone()]);
        assert_eq!(forward[&p1.id], reversed[&p2.id]);
        assert_ne!(forward[&p1.id], reversed[&p1.id]);
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (0usize..3, proptest::option::of(0i64..30), 0i64..10_000).prop_map(
            |(status, due, age)| {
                let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
                task(
                    "t",
                    TaskStatus::ALL[status],
                    due.map(|d| today + Duration::days(d)),
                    age,
                )
            },
        )
    }

    proptest! {
        #[test]
        fn sort_for_display_is_idempotent(tasks in proptest::collection::vec(arb_task(), 0..40)) {
            let once = sorted_for_display(&tasks);
            let twice = sorted_for_display(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
