use tracing::warn;

use crate::models::NewsItem;
use crate::utils::truncate_string;

/// Longest payload excerpt written to the log when a push message is dropped.
const MAX_LOGGED_PAYLOAD_LEN: usize = 200;

/// Decode a pushed payload as a news item.
///
/// Payloads that do not parse are logged and dropped so one bad message does
/// not take the channel down.
pub fn parse_news(payload: &str) -> Option<NewsItem> {
    match serde_json::from_str(payload) {
        Ok(item) => Some(item),
        Err(e) => {
            warn!(
                error = %e,
                payload = %truncate_string(payload, MAX_LOGGED_PAYLOAD_LEN),
                "Dropping live payload that is not a news item"
            );
            None
        }
    }
}
