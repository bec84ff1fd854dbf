//! Notification service lifecycle.
//!
//! Wraps the aggregator in an explicitly constructed service object: a
//! periodic timer drives recomputes, `invalidate` forces an immediate pass
//! when something else touched the store, and every pass publishes a feed
//! snapshot that callers can await. Recompute itself stays synchronous and
//! cheap; only the triggering is asynchronous.

use chrono::{Local, NaiveDateTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::feed::FeedAggregator;
use crate::models::{FeedSummary, Notification, NotificationDraft};
use crate::store::{StateStore, StoreError};

/// One published view of the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub notifications: Vec<Notification>,
    pub summary: FeedSummary,
    pub generated_at: Option<NaiveDateTime>,
}

/// Timer-driven notification service over a [`FeedAggregator`].
pub struct NotificationService<S: StateStore + 'static> {
    inner: Arc<Mutex<FeedAggregator<S>>>,
    invalidated: Arc<Notify>,
    snapshot_tx: watch::Sender<FeedSnapshot>,
    poll_interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl<S: StateStore + 'static> NotificationService<S> {
    /// Build a stopped service around an aggregator.
    pub fn new(aggregator: FeedAggregator<S>, poll_interval: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(FeedSnapshot::default());
        Self {
            inner: Arc::new(Mutex::new(aggregator)),
            invalidated: Arc::new(Notify::new()),
            snapshot_tx,
            poll_interval,
            handle: None,
        }
    }

    /// Launch the recompute loop. Runs one pass immediately, then again on
    /// every timer tick or invalidation, whichever comes first.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            return;
        }
        info!(
            "notification service started (poll every {:?})",
            self.poll_interval
        );

        let inner = Arc::clone(&self.inner);
        let invalidated = Arc::clone(&self.invalidated);
        let snapshot_tx = self.snapshot_tx.clone();
        let poll_interval = self.poll_interval;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => debug!("recompute trigger: timer"),
                    _ = invalidated.notified() => debug!("recompute trigger: invalidation"),
                }
                let snapshot = {
                    let mut agg = inner.lock().unwrap();
                    let now = Local::now().naive_local();
                    agg.recompute_at(now);
                    FeedSnapshot {
                        notifications: agg.notifications().to_vec(),
                        summary: agg.summary(),
                        generated_at: Some(now),
                    }
                };
                snapshot_tx.send_replace(snapshot);
            }
        }));
    }

    /// Stop the recompute loop. Safe to call on a stopped service.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("notification service stopped");
        }
    }

    /// External-change hook: force an immediate recompute.
    pub fn invalidate(&self) {
        self.invalidated.notify_one();
    }

    /// Subscribe to feed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Run a closure against the aggregator and publish the result.
    ///
    /// All mutations go through here so every subscriber sees the change
    /// without waiting for the next timer tick.
    pub fn mutate<T>(
        &self,
        f: impl FnOnce(&mut FeedAggregator<S>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let snapshot;
        let out;
        {
            let mut agg = self.inner.lock().unwrap();
            out = f(&mut agg)?;
            snapshot = FeedSnapshot {
                notifications: agg.notifications().to_vec(),
                summary: agg.summary(),
                generated_at: Some(Local::now().naive_local()),
            };
        }
        // send_replace stores the snapshot even with no receivers, so a
        // late subscriber still starts from the latest feed.
        self.snapshot_tx.send_replace(snapshot);
        Ok(out)
    }

    /// Mark one notification read.
    pub fn mark_read(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(|agg| agg.mark_read(id))
    }

    /// Mark everything visible read.
    pub fn mark_all_read(&self) -> Result<(), StoreError> {
        self.mutate(|agg| agg.mark_all_read())
    }

    /// Dismiss one notification.
    pub fn dismiss(&self, id: &str) -> Result<(), StoreError> {
        self.mutate(|agg| agg.dismiss(id))
    }

    /// Dismiss everything visible.
    pub fn clear_all(&self) -> Result<(), StoreError> {
        self.mutate(|agg| agg.clear_all())
    }

    /// Inject a manual notification.
    pub fn add_notification(&self, draft: NotificationDraft) -> Result<Notification, StoreError> {
        self.mutate(|agg| Ok(agg.add_notification(draft)))
    }
}

impl<S: StateStore + 'static> Drop for NotificationService<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};
    use crate::store::MemoryStore;

    fn service_over_seeded_store(poll: Duration) -> NotificationService<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(
            "tasks",
            r#"[{"id":"t1","title":"Care plan review","status":"open","dueDate":"2020-01-01"}]"#,
        );
        NotificationService::new(FeedAggregator::new(store), poll)
    }

    #[tokio::test]
    async fn test_start_publishes_initial_snapshot() {
        let mut service = service_over_seeded_store(Duration::from_secs(60));
        let mut rx = service.subscribe();
        service.start();

        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.notifications[0].id, "task-t1-overdue");
        assert_eq!(snapshot.summary.unread, 1);

        service.stop();
    }

    #[tokio::test]
    async fn test_invalidate_triggers_recompute() {
        let mut service = service_over_seeded_store(Duration::from_secs(3600));
        let mut rx = service.subscribe();
        service.start();
        rx.changed().await.unwrap();

        // A long poll interval means only invalidation can wake the loop.
        service.invalidate();
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("invalidation did not trigger a pass")
            .unwrap();

        service.stop();
    }

    #[tokio::test]
    async fn test_mutations_publish_immediately() {
        let mut service = service_over_seeded_store(Duration::from_secs(3600));
        let mut rx = service.subscribe();
        service.start();
        rx.changed().await.unwrap();

        service.mark_read("task-t1-overdue").unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.summary.unread, 0);
        assert_eq!(snapshot.notifications.len(), 1);

        service.clear_all().unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().notifications.is_empty());

        service.stop();
    }

    #[test]
    fn test_add_notification_without_timer() {
        // Mutations work on a stopped service; block_on drives the runtime
        // bits the watch channel needs.
        tokio_test::block_on(async {
            let service = service_over_seeded_store(Duration::from_secs(60));
            let n = service
                .add_notification(NotificationDraft {
                    category: Category::System,
                    title: "Sync complete".into(),
                    message: "Store refreshed".into(),
                    priority: Some(Priority::Low),
                    link: None,
                })
                .unwrap();
            assert!(n.id.starts_with("manual-"));

            let rx = service.subscribe();
            assert!(rx.borrow().notifications.iter().any(|m| m.id == n.id));
        });
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_latest_snapshot() {
        let mut service = service_over_seeded_store(Duration::from_secs(3600));
        let mut rx = service.subscribe();
        service.start();
        rx.changed().await.unwrap();
        drop(rx);

        // A mutation with no live receiver must still land in the channel.
        service.mark_read("task-t1-overdue").unwrap();

        let late = service.subscribe();
        let snapshot = late.borrow().clone();
        assert_eq!(snapshot.notifications.len(), 1);
        assert_eq!(snapshot.summary.unread, 0);

        service.stop();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut service = service_over_seeded_store(Duration::from_millis(10));
        service.start();
        service.stop();
        service.stop();
        assert!(service.handle.is_none());
    }
}
