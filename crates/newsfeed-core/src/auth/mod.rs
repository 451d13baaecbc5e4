//! Authentication module for managing the session credential.
//!
//! This module provides:
//! - `Session`: shared handle over the bearer token and its lifecycle state
//! - `TokenStore`: persistence seam for the token, with file, keyring and
//!   in-memory implementations
//!
//! The token has no expiry on the client side; it is dropped on logout or
//! when the server answers 401.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use session::{Session, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
