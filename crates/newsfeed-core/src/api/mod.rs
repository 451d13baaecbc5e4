//! REST API client module for the newsfeed backend.
//!
//! This module provides the `ApiClient` for logging in and out, reading the
//! current user, listing feeds and news, and managing subscriptions.
//!
//! The API uses bearer token authentication; the token is held by a shared
//! `Session` so the live channel can reuse it.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, ErrorKind, INVALID_CREDENTIALS_FALLBACK};
