//! Source scanners.
//!
//! Each scanner derives candidate notifications from one CRM source. All
//! scanners are pure functions of (scan context, source data): given the
//! same stores and the same clock they produce the same ids, which is what
//! lets the persisted read/dismissed sets survive rescans. Scanners run in
//! a fixed order so the merged feed is deterministic.

pub mod inbox;
pub mod schedule;
pub mod tasks;

use chrono::NaiveDateTime;

use crate::feed::idset::CappedIdSet;
use crate::models::Notification;
use crate::store::StateStore;

/// Inputs shared by every scanner pass.
pub struct ScanContext<'a> {
    /// Wall-clock instant of the pass.
    pub now: NaiveDateTime,
    /// Ids suppressed by the user. Scanners skip these at derivation time.
    pub dismissed: &'a CappedIdSet,
}

/// Run every scanner in the fixed order and concatenate their output.
///
/// A scanner that finds its source missing or malformed contributes an
/// empty list; it can never fail the pass or affect its neighbors.
pub fn scan_all(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let mut out = Vec::new();
    out.extend(schedule::scan(store, ctx));
    out.extend(tasks::scan(store, ctx));
    out.extend(inbox::scan_messages(store, ctx));
    out.extend(inbox::scan_team_chat(store, ctx));
    out.extend(inbox::scan_emails(store, ctx));
    out
}

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{NaiveDate, NaiveDateTime};

    /// 2024-06-10 09:00, the reference clock used across scanner tests.
    pub fn monday_morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }
}
