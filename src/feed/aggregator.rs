//! The notification feed aggregator.
//!
//! Produces the prioritized, deduplicated, policy-filtered feed from the
//! scanner outputs, and owns the mutation surface (mark-read, dismiss,
//! clear-all, manual injection). The feed itself is a view: every
//! recompute rebuilds it from scratch, and only the read and dismissed
//! id-sets are ever persisted.

use chrono::{Local, NaiveDateTime};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::feed::idset::CappedIdSet;
use crate::models::{FeedSummary, Notification, NotificationDraft, Priority};
use crate::scan::{scan_all, ScanContext};
use crate::store::{StateStore, StoreError};

/// Store key holding the read-id set.
pub const READ_IDS_KEY: &str = "carefeed_read";
/// Store key holding the dismissed-id set.
pub const DISMISSED_IDS_KEY: &str = "carefeed_dismissed";

/// Aggregates scanner output into the visible notification feed.
pub struct FeedAggregator<S: StateStore> {
    store: S,
    read_ids: CappedIdSet,
    dismissed_ids: CappedIdSet,
    /// Manually injected notifications. Session-only: they live here, not
    /// in the store, and are re-included on every recompute until dismissed.
    injected: Vec<Notification>,
    feed: Vec<Notification>,
}

impl<S: StateStore> FeedAggregator<S> {
    /// Build an aggregator over a store, loading the persisted id-sets.
    ///
    /// The feed starts empty; call [`recompute`](Self::recompute) to
    /// populate it.
    pub fn new(store: S) -> Self {
        let read_ids = CappedIdSet::load(&store, READ_IDS_KEY);
        let dismissed_ids = CappedIdSet::load(&store, DISMISSED_IDS_KEY);
        Self {
            store,
            read_ids,
            dismissed_ids,
            injected: Vec::new(),
            feed: Vec::new(),
        }
    }

    /// The visible feed, sorted by (priority, recency).
    pub fn notifications(&self) -> &[Notification] {
        &self.feed
    }

    /// Count of visible entries with `read == false`.
    pub fn unread_count(&self) -> usize {
        self.feed.iter().filter(|n| !n.read).count()
    }

    /// Summary counts over the visible feed.
    pub fn summary(&self) -> FeedSummary {
        FeedSummary::from_feed(&self.feed)
    }

    /// Recompute the feed against the current wall clock.
    pub fn recompute(&mut self) {
        self.recompute_at(Local::now().naive_local());
    }

    /// Recompute the feed as of a given instant.
    ///
    /// Runs every scanner in the fixed order, appends undismissed injected
    /// notifications, re-applies the persisted read flags, drops dismissed
    /// and duplicate ids, and sorts by priority rank ascending then
    /// timestamp descending. The sort is stable, so ties beyond that keep
    /// scanner order.
    pub fn recompute_at(&mut self, now: NaiveDateTime) {
        let ctx = ScanContext {
            now,
            dismissed: &self.dismissed_ids,
        };
        let mut merged = scan_all(&self.store, &ctx);
        merged.extend(
            self.injected
                .iter()
                .filter(|n| !self.dismissed_ids.contains(&n.id))
                .cloned(),
        );

        let mut seen = HashSet::new();
        let mut feed: Vec<Notification> = merged
            .into_iter()
            .filter(|n| !self.dismissed_ids.contains(&n.id))
            .filter(|n| seen.insert(n.id.clone()))
            .map(|mut n| {
                n.read = self.read_ids.contains(&n.id);
                n
            })
            .collect();

        feed.sort_by(|a, b| {
            a.priority
                .rank()
                .cmp(&b.priority.rank())
                .then(b.timestamp.cmp(&a.timestamp))
        });

        let unread = feed.iter().filter(|n| !n.read).count();
        debug!("recompute: {} visible, {} unread", feed.len(), unread);
        self.feed = feed;
    }

    /// Mark one notification read. The entry stays in the feed; only its
    /// flag flips.
    pub fn mark_read(&mut self, id: &str) -> Result<(), StoreError> {
        self.read_ids.insert(id);
        self.read_ids.save(&mut self.store, READ_IDS_KEY)?;
        if let Some(n) = self.feed.iter_mut().find(|n| n.id == id) {
            n.read = true;
        }
        Ok(())
    }

    /// Mark every currently visible notification read.
    pub fn mark_all_read(&mut self) -> Result<(), StoreError> {
        let ids: Vec<String> = self.feed.iter().map(|n| n.id.clone()).collect();
        for id in ids {
            self.read_ids.insert(id);
        }
        self.read_ids.save(&mut self.store, READ_IDS_KEY)?;
        for n in &mut self.feed {
            n.read = true;
        }
        Ok(())
    }

    /// Dismiss one notification: its id joins the capped dismissed set, a
    /// matching injected notification is dropped immediately, and the entry
    /// leaves the visible feed.
    pub fn dismiss(&mut self, id: &str) -> Result<(), StoreError> {
        self.dismissed_ids.insert(id);
        self.dismissed_ids.save(&mut self.store, DISMISSED_IDS_KEY)?;
        self.injected.retain(|n| n.id != id);
        self.feed.retain(|n| n.id != id);
        Ok(())
    }

    /// Dismiss every currently visible notification in one batch.
    pub fn clear_all(&mut self) -> Result<(), StoreError> {
        let ids: Vec<String> = self.feed.iter().map(|n| n.id.clone()).collect();
        for id in &ids {
            self.dismissed_ids.insert(id.clone());
        }
        self.dismissed_ids.save(&mut self.store, DISMISSED_IDS_KEY)?;
        self.injected.retain(|n| !self.dismissed_ids.contains(&n.id));
        self.feed.clear();
        Ok(())
    }

    /// Inject a manual notification with a fresh random-suffixed id,
    /// stamped with the current wall clock.
    pub fn add_notification(&mut self, draft: NotificationDraft) -> Notification {
        self.add_notification_at(draft, Local::now().naive_local())
    }

    /// Inject a manual notification as of a given instant.
    pub fn add_notification_at(
        &mut self,
        draft: NotificationDraft,
        now: NaiveDateTime,
    ) -> Notification {
        let mut n = Notification::new(
            format!("manual-{}", Uuid::new_v4()),
            draft.category,
            draft.title,
            draft.message,
            now,
            draft.priority.unwrap_or(Priority::Medium),
        );
        n.link = draft.link;

        self.injected.push(n.clone());
        self.recompute_at(now);
        n
    }
}
