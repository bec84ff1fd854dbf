//! Schedule scanner: appointment reminders.
//!
//! Buckets each appointment into at most one notification based on minutes
//! until its start. The bucket ranges are mutually exclusive and checked in
//! order, so an appointment can never contribute twice in one pass.

use chrono::Duration;
use tracing::debug;

use super::ScanContext;
use crate::models::{Category, Notification, Priority};
use crate::sources::{read_source, Appointment, APPOINTMENTS_KEY};
use crate::store::StateStore;

/// An appointment that started up to this many minutes ago is in progress.
const IN_PROGRESS_WINDOW_MINS: i64 = 15;
/// Upper bound of the starting-soon bucket.
const STARTING_SOON_MAX_MINS: i64 = 30;
/// Upper bound of the later-today bucket.
const LATER_TODAY_MAX_MINS: i64 = 120;

/// Scan the appointment source.
pub fn scan(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let appointments: Vec<Appointment> = read_source(store, APPOINTMENTS_KEY);
    debug!("schedule scan: {} appointments", appointments.len());

    appointments
        .iter()
        .filter_map(|appt| classify(appt, ctx))
        .collect()
}

/// Classify one appointment into its bucket, if any.
fn classify(appt: &Appointment, ctx: &ScanContext<'_>) -> Option<Notification> {
    let start = appt.start()?;
    let until = start.signed_duration_since(ctx.now);
    let mins = until.num_minutes();

    let (bucket, title, priority) = if (-IN_PROGRESS_WINDOW_MINS..=0).contains(&mins) {
        ("in-progress", "Visit in progress", Priority::High)
    } else if mins > 0 && mins <= STARTING_SOON_MAX_MINS {
        ("starting-soon", "Visit starting soon", Priority::High)
    } else if mins > STARTING_SOON_MAX_MINS && mins <= LATER_TODAY_MAX_MINS {
        ("later-today", "Visit later today", Priority::Medium)
    } else if mins > LATER_TODAY_MAX_MINS && start.date() == ctx.now.date() {
        ("today", "Visit scheduled today", Priority::Low)
    } else if until > Duration::zero()
        && until < Duration::hours(24)
        && start.date() != ctx.now.date()
    {
        ("tomorrow", "Visit tomorrow", Priority::Low)
    } else {
        return None;
    };

    let id = format!("appt-{}-{}", appt.id, bucket);
    if ctx.dismissed.contains(&id) {
        return None;
    }

    let message = format!("{} with {} at {}", appt.title, appt.client, appt.time);
    Some(
        Notification::new(id, Category::Schedule, title, message, start, priority)
            .with_link(format!("/schedule/{}", appt.id))
            .with_source_id(&appt.id),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::idset::CappedIdSet;
    use crate::scan::testutil::monday_morning;
    use crate::store::MemoryStore;

    fn seed_appointment(store: &MemoryStore, date: &str, time: &str) {
        store.seed(
            APPOINTMENTS_KEY,
            &format!(
                r#"[{{"id":"a1","date":"{}","time":"{}","title":"Home visit","client":"M. Okafor"}}]"#,
                date, time
            ),
        );
    }

    fn run(store: &MemoryStore) -> Vec<Notification> {
        let dismissed = CappedIdSet::new();
        let ctx = ScanContext {
            now: monday_morning(),
            dismissed: &dismissed,
        };
        scan(store, &ctx)
    }

    #[test]
    fn test_starting_soon_boundary() {
        // now = 09:00, appointment at 09:20 -> exactly one starting-soon
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "09:20");

        let out = run(&store);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "appt-a1-starting-soon");
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn test_exactly_now_is_in_progress() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "09:00");

        let out = run(&store);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "appt-a1-in-progress");
        assert_eq!(out[0].priority, Priority::High);
    }

    #[test]
    fn test_later_today_bucket() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "10:30"); // 90 min out

        let out = run(&store);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "appt-a1-later-today");
        assert_eq!(out[0].priority, Priority::Medium);
    }

    #[test]
    fn test_scheduled_today_bucket() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "16:00"); // same day, > 2h out

        let out = run(&store);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "appt-a1-today");
        assert_eq!(out[0].priority, Priority::Low);
    }

    #[test]
    fn test_tomorrow_bucket() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-11", "08:00"); // within 24h, next day

        let out = run(&store);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "appt-a1-tomorrow");
        assert_eq!(out[0].priority, Priority::Low);
    }

    #[test]
    fn test_too_far_out_emits_nothing() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-12", "08:00");
        assert!(run(&store).is_empty());
    }

    #[test]
    fn test_long_past_emits_nothing() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "08:00"); // started an hour ago
        assert!(run(&store).is_empty());
    }

    #[test]
    fn test_dismissed_id_is_skipped() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "09:20");

        let mut dismissed = CappedIdSet::new();
        dismissed.insert("appt-a1-starting-soon");
        let ctx = ScanContext {
            now: monday_morning(),
            dismissed: &dismissed,
        };
        assert!(scan(&store, &ctx).is_empty());
    }

    #[test]
    fn test_malformed_source_is_empty() {
        let store = MemoryStore::new();
        store.seed(APPOINTMENTS_KEY, "not json");
        assert!(run(&store).is_empty());
    }

    #[test]
    fn test_unparsable_time_is_skipped() {
        let store = MemoryStore::new();
        seed_appointment(&store, "2024-06-10", "soonish");
        assert!(run(&store).is_empty());
    }
}
