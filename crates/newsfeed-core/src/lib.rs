//! Client library for the newsfeed subscription service.
//!
//! The crate is organized by concern:
//! - `api`: authenticated REST client (`ApiClient`) and its error type.
//! - `auth`: the shared `Session` credential handle and token persistence.
//! - `live`: push channel that streams news to a handler over a WebSocket.
//! - `models`: DTOs exchanged with the backend.
//! - `config`: on-disk configuration and environment overrides.
//! - `utils`: string formatting helpers used for display and logging.

pub mod api;
pub mod auth;
pub mod config;
pub mod live;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use auth::{Session, SessionState};
pub use config::Config;
pub use live::{LiveChannel, MessageHandler, Subscription as LiveSubscription};
