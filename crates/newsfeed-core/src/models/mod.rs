//! Data models exchanged with the newsfeed backend.
//!
//! - `User`, `LoginResponse`: authentication payloads
//! - `Feed`, `Subscription`: subscribable sources and user subscriptions
//! - `NewsItem`: articles belonging to a feed, also pushed over the live channel

pub mod date;
pub mod feed;
pub mod news;
pub mod user;

pub use feed::{Feed, Subscription};
pub use news::NewsItem;
pub use user::{LoginResponse, User};
