//! Typed source records and the parse-or-default boundary.
//!
//! Each CRM source is a loosely-shaped JSON document owned by another
//! process. All defaulting happens here, at deserialization: every field
//! carries a serde default, and a missing, malformed, or wrongly-shaped
//! document decodes to the source's empty value. Scanners downstream work
//! with fully-typed records only.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::StateStore;

/// Store key for the appointment list.
pub const APPOINTMENTS_KEY: &str = "appointments";
/// Store key for the task list.
pub const TASKS_KEY: &str = "tasks";
/// Key prefix for per-scope direct-message stores.
pub const MESSAGES_PREFIX: &str = "messages_";
/// Key prefix for per-scope team-chat stores.
pub const TEAMCHAT_PREFIX: &str = "teamchat_";
/// Key prefix for per-scope email stores.
pub const EMAILS_PREFIX: &str = "emails_";

/// Read a source document and decode it, defaulting on any failure.
///
/// This is the single failure boundary for source reads: an absent key, an
/// I/O error, or non-conforming JSON all come back as `T::default()` so a
/// broken source can never suppress the other scanners.
pub fn read_source<T>(store: &dyn StateStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!("source '{}' unreadable, skipping: {}", key, e);
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("source '{}' is not valid JSON, skipping: {}", key, e);
            T::default()
        }
    }
}

/// A scheduled visit from the appointment source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Appointment {
    #[serde(default)]
    pub id: String,
    /// Calendar date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date: String,
    /// Wall-clock start, `HH:MM`.
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub title: String,
    /// Client the visit is for.
    #[serde(default)]
    pub client: String,
}

impl Appointment {
    /// Combined start instant, if both date and time parse.
    pub fn start(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").ok()?;
        Some(date.and_time(time))
    }
}

/// Task status as stored by the CRM. Unknown strings map to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    InProgress,
    #[serde(other)]
    #[default]
    Other,
}

/// A care-coordination task from the task source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// Optional due date, `YYYY-MM-DD`.
    #[serde(default, rename = "dueDate")]
    pub due_date: Option<String>,
    /// Creation instant; RFC 3339 or `YYYY-MM-DDTHH:MM:SS`.
    #[serde(default, rename = "createdAt")]
    pub created_at: String,
}

impl TaskRecord {
    /// Parsed due date, if present and well-formed.
    pub fn due(&self) -> Option<NaiveDate> {
        let raw = self.due_date.as_deref()?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }

    /// Parsed creation instant, tolerating the formats the CRM has used.
    pub fn created(&self) -> Option<NaiveDateTime> {
        parse_instant(&self.created_at)
    }
}

/// Lenient instant parser for CRM timestamps.
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    // Date-only values count as midnight.
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .ok()
}

/// One direct-message thread within a scoped message store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub id: String,
    /// Display name of the other party.
    #[serde(default)]
    pub sender: String,
    /// Unread message count for this thread.
    #[serde(default)]
    pub unread: u32,
}

/// A scoped direct-message store (`messages_<scope>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageStore {
    #[serde(default)]
    pub conversations: Vec<Conversation>,
}

/// One team-chat channel within a scoped chat store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unread: u32,
}

/// A scoped team-chat store (`teamchat_<scope>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStore {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// One email within a scoped email store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub unread: bool,
}

/// A scoped email store (`emails_<scope>`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailStore {
    #[serde(default)]
    pub emails: Vec<EmailRecord>,
}
