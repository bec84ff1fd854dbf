//! Markdown and JSON digests of the notification feed.
//!
//! Used by `show` and `watch` to print the current feed. The Markdown
//! digest groups entries by category in feed order; the JSON digest is the
//! raw feed plus summary, for piping into other tools.

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{Category, FeedSummary, Notification};

/// Categories in the order the digest prints them.
const CATEGORY_ORDER: [Category; 6] = [
    Category::Schedule,
    Category::Task,
    Category::Message,
    Category::Email,
    Category::FollowUp,
    Category::System,
];

/// Generate a Markdown digest of the feed.
pub fn generate_markdown_digest(
    feed: &[Notification],
    summary: &FeedSummary,
    generated_at: NaiveDateTime,
) -> String {
    let mut output = String::new();

    output.push_str("# CareFeed Digest\n\n");
    output.push_str(&format!(
        "Generated {} · {} notifications, {} unread\n\n",
        generated_at.format("%Y-%m-%d %H:%M"),
        summary.total,
        summary.unread
    ));

    if feed.is_empty() {
        output.push_str("All clear — nothing needs attention.\n");
        return output;
    }

    output.push_str(&format!(
        "🟠 High: {} | 🟡 Medium: {} | 🟢 Low: {}\n\n",
        summary.high, summary.medium, summary.low
    ));

    for category in CATEGORY_ORDER {
        let entries: Vec<&Notification> =
            feed.iter().filter(|n| n.category == category).collect();
        if entries.is_empty() {
            continue;
        }

        output.push_str(&format!("## {}\n\n", category));
        for n in entries {
            let read_marker = if n.read { " " } else { "•" };
            output.push_str(&format!(
                "- {} {} **{}** — {} _({})_\n",
                read_marker,
                n.priority.emoji(),
                n.title,
                n.message,
                n.timestamp.format("%Y-%m-%d %H:%M"),
            ));
            if let Some(link) = &n.link {
                output.push_str(&format!("  - open: `{}`\n", link));
            }
            output.push_str(&format!("  - id: `{}`\n", n.id));
        }
        output.push('\n');
    }

    output
}

#[derive(Serialize)]
struct JsonDigest<'a> {
    generated_at: NaiveDateTime,
    summary: &'a FeedSummary,
    notifications: &'a [Notification],
}

/// Generate a JSON digest of the feed.
pub fn generate_json_digest(
    feed: &[Notification],
    summary: &FeedSummary,
    generated_at: NaiveDateTime,
) -> Result<String> {
    let digest = JsonDigest {
        generated_at,
        summary,
        notifications: feed,
    };
    Ok(serde_json::to_string_pretty(&digest)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn sample_feed() -> Vec<Notification> {
        vec![
            Notification::new(
                "appt-a1-starting-soon",
                Category::Schedule,
                "Visit starting soon",
                "Home visit with M. Okafor at 09:20",
                ts(),
                Priority::High,
            )
            .with_link("/schedule/a1"),
            Notification::new(
                "task-t1-due-today",
                Category::Task,
                "Task due today",
                "Care plan review (due 2024-06-10)",
                ts(),
                Priority::Medium,
            ),
        ]
    }

    #[test]
    fn test_markdown_digest_sections() {
        let feed = sample_feed();
        let summary = FeedSummary::from_feed(&feed);
        let md = generate_markdown_digest(&feed, &summary, ts());

        assert!(md.contains("# CareFeed Digest"));
        assert!(md.contains("## Schedule"));
        assert!(md.contains("## Task"));
        assert!(md.contains("Visit starting soon"));
        assert!(md.contains("`appt-a1-starting-soon`"));
        assert!(md.contains("2 notifications, 2 unread"));
    }

    #[test]
    fn test_markdown_digest_empty_feed() {
        let summary = FeedSummary::default();
        let md = generate_markdown_digest(&[], &summary, ts());
        assert!(md.contains("All clear"));
        assert!(!md.contains("##"));
    }

    #[test]
    fn test_json_digest_roundtrips() {
        let feed = sample_feed();
        let summary = FeedSummary::from_feed(&feed);
        let json = generate_json_digest(&feed, &summary, ts()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["summary"]["total"], 2);
        assert_eq!(
            value["notifications"][0]["id"],
            "appt-a1-starting-soon"
        );
        assert_eq!(value["notifications"][0]["priority"], "high");
        assert_eq!(value["notifications"][0]["category"], "schedule");
    }
}
