//! Inbox scanners: direct messages, team chat, and email.
//!
//! All three follow the same aggregation pattern: for every user-scoped
//! store discovered by key prefix, sum the unread signals and emit one
//! aggregate notification per store naming a few of the unread parties.
//! The notification id is synthetic per store, not per item.

use tracing::debug;

use super::ScanContext;
use crate::models::{Category, Notification, Priority};
use crate::sources::{
    read_source, ChatStore, EmailStore, MessageStore, EMAILS_PREFIX, MESSAGES_PREFIX,
    TEAMCHAT_PREFIX,
};
use crate::store::StateStore;

/// How many sender/channel names an aggregate message lists.
const MAX_NAMES: usize = 3;
/// How many email subjects an aggregate message lists.
const MAX_SUBJECTS: usize = 2;

/// Scan every scoped direct-message store.
pub fn scan_messages(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let keys = store.keys_with_prefix(MESSAGES_PREFIX);
    debug!("message scan: {} scoped stores", keys.len());

    let mut out = Vec::new();
    for key in keys {
        let scope = scope_of(&key, MESSAGES_PREFIX);
        let data: MessageStore = read_source(store, &key);

        let unread: u32 = data.conversations.iter().map(|c| c.unread).sum();
        let senders: Vec<&str> = data
            .conversations
            .iter()
            .filter(|c| c.unread > 0)
            .map(|c| c.sender.as_str())
            .take(MAX_NAMES)
            .collect();

        if let Some(n) = aggregate(
            format!("dm-{}", scope),
            Category::Message,
            "New direct messages",
            unread,
            &senders,
            "/messages",
            ctx,
        ) {
            out.push(n);
        }
    }
    out
}

/// Scan every scoped team-chat store.
pub fn scan_team_chat(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let keys = store.keys_with_prefix(TEAMCHAT_PREFIX);
    debug!("team-chat scan: {} scoped stores", keys.len());

    let mut out = Vec::new();
    for key in keys {
        let scope = scope_of(&key, TEAMCHAT_PREFIX);
        let data: ChatStore = read_source(store, &key);

        let unread: u32 = data.channels.iter().map(|c| c.unread).sum();
        let names: Vec<&str> = data
            .channels
            .iter()
            .filter(|c| c.unread > 0)
            .map(|c| c.name.as_str())
            .take(MAX_NAMES)
            .collect();

        if let Some(n) = aggregate(
            format!("chat-{}", scope),
            Category::Message,
            "New team chat activity",
            unread,
            &names,
            "/team-chat",
            ctx,
        ) {
            out.push(n);
        }
    }
    out
}

/// Scan every scoped email store.
pub fn scan_emails(store: &dyn StateStore, ctx: &ScanContext<'_>) -> Vec<Notification> {
    let keys = store.keys_with_prefix(EMAILS_PREFIX);
    debug!("email scan: {} scoped stores", keys.len());

    let mut out = Vec::new();
    for key in keys {
        let scope = scope_of(&key, EMAILS_PREFIX);
        let data: EmailStore = read_source(store, &key);

        let unread = data.emails.iter().filter(|e| e.unread).count() as u32;
        let subjects: Vec<&str> = data
            .emails
            .iter()
            .filter(|e| e.unread)
            .map(|e| e.subject.as_str())
            .take(MAX_SUBJECTS)
            .collect();

        if let Some(n) = aggregate(
            format!("email-{}", scope),
            Category::Email,
            "Unread email",
            unread,
            &subjects,
            "/email",
            ctx,
        ) {
            out.push(n);
        }
    }
    out
}

fn scope_of<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// Build the aggregate notification for one scoped store, if it has unread
/// items and its synthetic id is not dismissed.
fn aggregate(
    id: String,
    category: Category,
    title: &str,
    unread: u32,
    names: &[&str],
    link: &str,
    ctx: &ScanContext<'_>,
) -> Option<Notification> {
    if unread == 0 || ctx.dismissed.contains(&id) {
        return None;
    }

    // The store contract carries no per-item instants, so the aggregate is
    // stamped with the scan clock.
    let message = if names.is_empty() {
        format!("{} unread", unread)
    } else {
        format!("{} unread — {}", unread, names.join(", "))
    };

    Some(
        Notification::new(id, category, title, message, ctx.now, Priority::Medium)
            .with_link(link),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::idset::CappedIdSet;
    use crate::scan::testutil::monday_morning;
    use crate::store::MemoryStore;

    fn ctx(dismissed: &CappedIdSet) -> ScanContext<'_> {
        ScanContext {
            now: monday_morning(),
            dismissed,
        }
    }

    #[test]
    fn test_message_aggregate_names_first_three_senders() {
        let store = MemoryStore::new();
        store.seed(
            "messages_coordinator",
            r#"{"conversations":[
                {"id":"c1","sender":"Alice","unread":2},
                {"id":"c2","sender":"Bob","unread":0},
                {"id":"c3","sender":"Carol","unread":1},
                {"id":"c4","sender":"Dan","unread":1},
                {"id":"c5","sender":"Erin","unread":3}]}"#,
        );

        let dismissed = CappedIdSet::new();
        let out = scan_messages(&store, &ctx(&dismissed));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "dm-coordinator");
        assert_eq!(out[0].priority, Priority::Medium);
        assert_eq!(out[0].message, "7 unread — Alice, Carol, Dan");
    }

    #[test]
    fn test_one_aggregate_per_scoped_store() {
        let store = MemoryStore::new();
        store.seed(
            "messages_alice",
            r#"{"conversations":[{"id":"c1","sender":"Bob","unread":1}]}"#,
        );
        store.seed(
            "messages_supervisor",
            r#"{"conversations":[{"id":"c1","sender":"Dana","unread":4}]}"#,
        );

        let dismissed = CappedIdSet::new();
        let out = scan_messages(&store, &ctx(&dismissed));
        let ids: Vec<&str> = out.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["dm-alice", "dm-supervisor"]);
    }

    #[test]
    fn test_all_read_store_is_quiet() {
        let store = MemoryStore::new();
        store.seed(
            "messages_alice",
            r#"{"conversations":[{"id":"c1","sender":"Bob","unread":0}]}"#,
        );

        let dismissed = CappedIdSet::new();
        assert!(scan_messages(&store, &ctx(&dismissed)).is_empty());
    }

    #[test]
    fn test_dismissed_store_id_is_skipped() {
        let store = MemoryStore::new();
        store.seed(
            "messages_alice",
            r#"{"conversations":[{"id":"c1","sender":"Bob","unread":1}]}"#,
        );

        let mut dismissed = CappedIdSet::new();
        dismissed.insert("dm-alice");
        assert!(scan_messages(&store, &ctx(&dismissed)).is_empty());
    }

    #[test]
    fn test_team_chat_names_channels() {
        let store = MemoryStore::new();
        store.seed(
            "teamchat_day-shift",
            r##"{"channels":[
                {"id":"ch1","name":"#handover","unread":3},
                {"id":"ch2","name":"#rota","unread":0},
                {"id":"ch3","name":"#incidents","unread":1}]}"##,
        );

        let dismissed = CappedIdSet::new();
        let out = scan_team_chat(&store, &ctx(&dismissed));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "chat-day-shift");
        assert_eq!(out[0].message, "4 unread — #handover, #incidents");
    }

    #[test]
    fn test_email_aggregate_names_two_subjects() {
        let store = MemoryStore::new();
        store.seed(
            "emails_office",
            r#"{"emails":[
                {"id":"e1","subject":"Timesheet reminder","unread":true},
                {"id":"e2","subject":"Rota update","unread":true},
                {"id":"e3","subject":"Newsletter","unread":true},
                {"id":"e4","subject":"Read already","unread":false}]}"#,
        );

        let dismissed = CappedIdSet::new();
        let out = scan_emails(&store, &ctx(&dismissed));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "email-office");
        assert_eq!(out[0].category, Category::Email);
        assert_eq!(out[0].message, "3 unread — Timesheet reminder, Rota update");
    }

    #[test]
    fn test_malformed_scoped_store_is_quiet() {
        let store = MemoryStore::new();
        store.seed("emails_office", "][");

        let dismissed = CappedIdSet::new();
        assert!(scan_emails(&store, &ctx(&dismissed)).is_empty());
    }
}
