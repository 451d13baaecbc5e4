use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::date::optional_date;
use crate::utils::{format_date, strip_html};

/// An article belonging to a feed.
///
/// Returned by the news listing and pushed as JSON text over the live channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct NewsItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub author: String,
    pub url: String,
    #[serde(default, with = "optional_date")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub publish_date: Option<NaiveDate>,
    pub feed_id: String,
}

impl NewsItem {
    /// Render as `title (author) date`.
    pub fn display_line(&self) -> String {
        let title = strip_html(&self.title);
        if self.author.is_empty() {
            format!("{} {}", title, format_date(self.publish_date))
        } else {
            format!("{} ({}) {}", title, self.author, format_date(self.publish_date))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_news_item() {
        let json = r#"{
            "id": "0b7c3a52-1c36-4cf6-a1b8-2a4c36a1e0f1",
            "author": "Jane Doe",
            "url": "https://example.com/a",
            "title": "Announcing <em>1.0</em>",
            "publish_date": "2023-06-01",
            "feed_id": "f1"
        }"#;
        let item: NewsItem = serde_json::from_str(json).expect("parse news item");
        assert_eq!(item.publish_date, NaiveDate::from_ymd_opt(2023, 6, 1));
        assert_eq!(item.display_line(), "Announcing 1.0 (Jane Doe) 2023-06-01");
    }

    #[test]
    fn test_news_item_without_id_or_author() {
        let json = r#"{"author": "", "url": "u", "title": "Hello", "publish_date": "", "feed_id": "f1"}"#;
        let item: NewsItem = serde_json::from_str(json).expect("parse news item");
        assert_eq!(item.id, None);
        assert_eq!(item.display_line(), "Hello undated");
    }

    #[test]
    fn test_serialize_writes_wire_date() {
        let item = NewsItem {
            id: None,
            title: "t".to_string(),
            author: "a".to_string(),
            url: "u".to_string(),
            publish_date: NaiveDate::from_ymd_opt(2022, 1, 5),
            feed_id: "f".to_string(),
        };
        let value = serde_json::to_value(&item).expect("serialize news item");
        assert_eq!(value["publish_date"], "2022-01-05");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        let json = r#"{"author": "a", "url": "u", "title": "t", "publish_date": "yesterday", "feed_id": "f"}"#;
        assert!(serde_json::from_str::<NewsItem>(json).is_err());
    }
}
