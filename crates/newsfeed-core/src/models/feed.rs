use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::optional_date;
use crate::utils::{strip_html, truncate_string};

/// Maximum title length shown in list output.
const MAX_TITLE_DISPLAY_LEN: usize = 80;

/// A subscribable news source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Feed {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: String,
    #[serde(default, with = "optional_date")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub publish_date: Option<NaiveDate>,
}

impl Feed {
    /// Title with markup removed, suitable for terminal output.
    pub fn display_title(&self) -> String {
        let title = strip_html(&self.title);
        if title.is_empty() {
            self.url.clone()
        } else {
            truncate_string(&title, MAX_TITLE_DISPLAY_LEN)
        }
    }

    /// One-line listing entry with a subscription marker.
    pub fn display_line(&self, subscribed: bool) -> String {
        let marker = if subscribed { "[x]" } else { "[ ]" };
        format!("{} {}  {}", marker, self.display_title(), self.id)
    }
}

/// Join record between a user and a feed. Existence means subscribed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Subscription {
    pub user_id: String,
    pub feed_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_without_publish_date() {
        let json = r#"{"id": "f1", "author": "Rust Blog", "title": "Rust Blog", "url": "https://blog.rust-lang.org/feed.xml"}"#;
        let feed: Feed = serde_json::from_str(json).expect("parse feed");
        assert_eq!(feed.publish_date, None);
        assert_eq!(feed.display_line(true), "[x] Rust Blog  f1");
        assert_eq!(feed.display_line(false), "[ ] Rust Blog  f1");
    }

    #[test]
    fn test_parse_feed_with_empty_publish_date() {
        let json = r#"{"id": "f1", "author": "a", "title": "t", "url": "u", "publish_date": ""}"#;
        let feed: Feed = serde_json::from_str(json).expect("parse feed");
        assert_eq!(feed.publish_date, None);
    }

    #[test]
    fn test_display_title_falls_back_to_url() {
        let feed = Feed {
            id: "f2".to_string(),
            url: "https://example.com/rss".to_string(),
            title: "<span></span>".to_string(),
            author: String::new(),
            publish_date: None,
        };
        assert_eq!(feed.display_title(), "https://example.com/rss");
    }

    #[test]
    fn test_parse_subscriptions() {
        let json = r#"[{"feed_id": "f1", "user_id": "u1"}, {"feed_id": "f2", "user_id": "u1"}]"#;
        let subs: Vec<Subscription> = serde_json::from_str(json).expect("parse subscriptions");
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].feed_id, "f2");
    }
}
