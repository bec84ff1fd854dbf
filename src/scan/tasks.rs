//! Task scanner: due-date reminders and stale in-progress notices.
//!
//! The due-date buckets (overdue, due-today, due-tomorrow) are mutually
//! exclusive; the stale in-progress check is independent and additive, so a
//! task can contribute at most one due-date notification plus at most one
//! stale notice per pass.

use chrono::{Duration, NaiveTime};
use tracing::debug;

use super::ScanContext;
use crate::models::{Category, Notification, Priority};
use crate::sources::{read_source, TaskRecord, TaskStatus, TASKS_KEY};
use crate::store::StateStore;

/// An in-progress task with no due date older than this is flagged stale.
const STALE_AFTER_HOURS: i64 = 24;

/// Scan the task source.
pub fn scan(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let tasks: Vec<TaskRecord> = read_source(store, TASKS_KEY);
    debug!("task scan: {} tasks", tasks.len());

    let mut out = Vec::new();
    for task in &tasks {
        if task.status == TaskStatus::Completed {
            continue;
        }
        if let Some(n) = due_date_bucket(task, ctx) {
            out.push(n);
        }
        if let Some(n) = stale_notice(task, ctx) {
            out.push(n);
        }
    }
    out
}

/// The exclusive due-date bucket for a task, if any.
fn due_date_bucket(task: &TaskRecord, ctx: &ScanContext<'_>) -> Option<Notification> {
    let due = task.due()?;
    let today = ctx.now.date();

    let (bucket, title, priority) = if due < today {
        ("overdue", "Task overdue", Priority::High)
    } else if due == today {
        ("due-today", "Task due today", Priority::Medium)
    } else if due == today + Duration::days(1) {
        ("due-tomorrow", "Task due tomorrow", Priority::Low)
    } else {
        return None;
    };

    let id = format!("task-{}-{}", task.id, bucket);
    if ctx.dismissed.contains(&id) {
        return None;
    }

    let timestamp = due.and_time(NaiveTime::MIN);
    Some(
        Notification::new(
            id,
            Category::Task,
            title,
            format!("{} (due {})", task.title, due.format("%Y-%m-%d")),
            timestamp,
            priority,
        )
        .with_link(format!("/tasks/{}", task.id))
        .with_source_id(&task.id),
    )
}

/// Additive notice for in-progress tasks with no due date that have sat
/// untouched for over a day.
fn stale_notice(task: &TaskRecord, ctx: &ScanContext<'_>) -> Option<Notification> {
    if task.status != TaskStatus::InProgress || task.due_date.is_some() {
        return None;
    }
    let created = task.created()?;
    if ctx.now.signed_duration_since(created) <= Duration::hours(STALE_AFTER_HOURS) {
        return None;
    }

    let id = format!("task-{}-stale", task.id);
    if ctx.dismissed.contains(&id) {
        return None;
    }

    Some(
        Notification::new(
            id,
            Category::FollowUp,
            "Task still in progress",
            format!("{} has been in progress for over a day", task.title),
            created,
            Priority::Low,
        )
        .with_link(format!("/tasks/{}", task.id))
        .with_source_id(&task.id),
    )
}
