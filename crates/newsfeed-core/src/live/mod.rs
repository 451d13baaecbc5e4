//! Live channel: push delivery of fresh news over a WebSocket.
//!
//! - `channel`: connection task, login handshake, heartbeat, and the
//!   cancellable `Subscription` handle.
//! - `news`: helper for handlers that expect news items as JSON payloads.

pub mod channel;
pub mod news;

pub use channel::{
    login_directive, LiveChannel, MessageHandler, Subscription, DEFAULT_HEARTBEAT_INTERVAL,
    PING_PAYLOAD,
};
pub use news::parse_news;
