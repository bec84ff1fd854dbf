//! Data models for the notification feed.
//!
//! This module contains the core data structures used throughout
//! the application for representing notifications and feed summaries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority of a notification. Primary sort key of the feed (high first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority - background awareness items
    Low,
    /// Medium priority - should be looked at today
    Medium,
    /// High priority - needs attention now
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl Priority {
    /// Returns an emoji representation of the priority.
    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::Low => "🟢",
            Priority::Medium => "🟡",
            Priority::High => "🟠",
        }
    }

    /// Sort rank: high=0, medium=1, low=2 (ascending rank sorts high first).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

/// Category of a notification, matching the originating source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Schedule,
    Task,
    Message,
    Email,
    FollowUp,
    System,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Schedule => write!(f, "Schedule"),
            Category::Task => write!(f, "Task"),
            Category::Message => write!(f, "Message"),
            Category::Email => write!(f, "Email"),
            Category::FollowUp => write!(f, "Follow-up"),
            Category::System => write!(f, "System"),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "schedule" => Category::Schedule,
            "task" => Category::Task,
            "message" => Category::Message,
            "email" => Category::Email,
            "follow_up" | "followup" | "follow-up" => Category::FollowUp,
            _ => Category::System,
        }
    }
}

/// A single entry in the notification feed.
///
/// Notifications are derived, not stored: every scan recomputes them from
/// the raw sources. The `id` is a pure function of the source item and the
/// condition bucket that produced it, so the persisted read/dismissed id-sets
/// can be re-applied across rescans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Deterministic id: source item id + condition bucket tag.
    pub id: String,
    /// Which source the notification came from.
    pub category: Category,
    /// Short display title.
    pub title: String,
    /// One-line display message.
    pub message: String,
    /// Instant of the underlying event (not scan time). Sort tie-break.
    pub timestamp: NaiveDateTime,
    /// Priority, the primary sort key.
    pub priority: Priority,
    /// Whether the user has read this notification.
    pub read: bool,
    /// Whether the user has dismissed this notification.
    pub dismissed: bool,
    /// Optional navigation target inside the CRM.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Optional back-reference to the originating item (appointment id,
    /// task id). Correlation only, never lifecycle control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Notification {
    /// Creates an unread, undismissed notification.
    pub fn new(
        id: impl Into<String>,
        category: Category,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: NaiveDateTime,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            title: title.into(),
            message: message.into(),
            timestamp,
            priority,
            read: false,
            dismissed: false,
            link: None,
            source_id: None,
        }
    }

    /// Attach a navigation link.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Attach the originating item id.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }
}

/// Fields a caller supplies when manually injecting a notification.
///
/// Everything else (id, timestamp, read/dismissed flags) is synthesized
/// by the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub category: Category,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Summary counts over the visible feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSummary {
    /// Total visible notifications.
    pub total: usize,
    /// Entries with `read == false`.
    pub unread: usize,
    /// Number of high priority entries.
    pub high: usize,
    /// Number of medium priority entries.
    pub medium: usize,
    /// Number of low priority entries.
    pub low: usize,
}

impl FeedSummary {
    /// Creates a summary from a feed slice.
    pub fn from_feed(feed: &[Notification]) -> Self {
        let mut summary = Self {
            total: feed.len(),
            ..Self::default()
        };

        for n in feed {
            if !n.read {
                summary.unread += 1;
            }
            match n.priority {
                Priority::High => summary.high += 1,
                Priority::Medium => summary.medium += 1,
                Priority::Low => summary.low += 1,
            }
        }

        summary
    }
}
