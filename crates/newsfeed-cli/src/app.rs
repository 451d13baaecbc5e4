//! Application composition and command handlers.
//!
//! `App` owns the configuration and builds the shared `Session`, handing it to
//! both the REST client and the live channel. Each subcommand maps to one
//! client operation whose result is printed to stdout.

use std::collections::HashSet;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use newsfeed_core::api::{ApiClient, ApiError};
use newsfeed_core::config::Config;
use newsfeed_core::live::{parse_news, LiveChannel};
use newsfeed_core::utils::truncate_string;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::Command;

/// Maximum length for name input
const MAX_USERNAME_LENGTH: usize = 50;

/// Maximum length for password input
const MAX_PASSWORD_LENGTH: usize = 128;

/// Longest server error body shown to the user.
const MAX_DISPLAYED_BODY_LEN: usize = 200;

pub struct App {
    config: Config,
    api: ApiClient,
    live: LiveChannel,
    json: bool,
}

impl App {
    /// Build the client stack from configuration.
    pub fn new(config: Config, json: bool) -> Result<Self> {
        let session = config.restore_session()?;
        debug!(?session, "Session ready");

        let mut http = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            http = http.timeout(timeout);
        }
        let http = http.build().context("Failed to build HTTP client")?;

        let api = ApiClient::with_http_client(http, config.server_url(), session.clone());
        let live = LiveChannel::new(config.live_endpoint()?, session)
            .with_heartbeat_interval(config.heartbeat_interval());

        Ok(Self {
            config,
            api,
            live,
            json,
        })
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        let result = match command {
            Command::Login { name, password } => self.login(name, password).await,
            Command::Logout => self.logout().await,
            Command::Me => self.me().await,
            Command::Status => self.status(),
            Command::Feeds => self.feeds().await,
            Command::News => self.news().await,
            Command::Subscriptions => self.subscriptions().await,
            Command::Subscribe { feed_id } => self.subscribe(&feed_id).await,
            Command::Unsubscribe { feed_id } => self.unsubscribe(&feed_id).await,
            Command::Watch => self.watch().await,
        };

        result.map_err(|e| match e.downcast::<ApiError>() {
            Ok(api_error) => anyhow::anyhow!(user_message(&api_error, self.config.server_url())),
            Err(other) => other,
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    async fn login(&mut self, name: Option<String>, password: Option<String>) -> Result<()> {
        let name = match name.or_else(|| self.config.last_username.clone()) {
            Some(name) => name,
            None => prompt_username()?,
        };
        let password = match password {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };
        validate_login_input(&name, &password)?;

        self.api.login(&name, &password).await?;

        self.config.last_username = Some(name.clone());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        info!(user = %name, "Login successful");
        println!("Logged in as {}", name);
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        // Nothing to end on the server without a token; the library call
        // would only come back as a 401.
        if !self.api.session().is_authenticated() {
            println!("Not logged in");
            return Ok(());
        }
        self.api.logout().await?;
        println!("Logged out");
        Ok(())
    }

    async fn me(&self) -> Result<()> {
        let user = self.api.me().await?;
        if self.json {
            return print_json(&user);
        }
        println!("{} ({})", user.name, user.id);
        Ok(())
    }

    fn status(&self) -> Result<()> {
        let state = self.api.session().state();
        println!("Session:  {:?}", state);
        println!("Server:   {}", self.config.server_url());
        println!("Live:     {}", self.live.endpoint());
        if let Some(ref name) = self.config.last_username {
            println!("Last user: {}", name);
        }
        Ok(())
    }

    // =========================================================================
    // Feeds and News
    // =========================================================================

    async fn feeds(&self) -> Result<()> {
        let (feeds, subscriptions) = tokio::try_join!(self.api.feeds(), self.api.subscriptions())?;
        if self.json {
            return print_json(&feeds);
        }
        if feeds.is_empty() {
            println!("No feeds");
            return Ok(());
        }

        let subscribed: HashSet<&str> = subscriptions.iter().map(|s| s.feed_id.as_str()).collect();
        for feed in &feeds {
            println!("{}", feed.display_line(subscribed.contains(feed.id.as_str())));
        }
        Ok(())
    }

    async fn news(&self) -> Result<()> {
        let news = self.api.news().await?;
        if self.json {
            return print_json(&news);
        }
        if news.is_empty() {
            println!("No news");
            return Ok(());
        }
        for item in &news {
            println!("{}", item.display_line());
        }
        Ok(())
    }

    async fn subscriptions(&self) -> Result<()> {
        let subscriptions = self.api.subscriptions().await?;
        if self.json {
            return print_json(&subscriptions);
        }
        if subscriptions.is_empty() {
            println!("No subscriptions");
        }
        for subscription in &subscriptions {
            println!("{}", subscription.feed_id);
        }
        Ok(())
    }

    async fn subscribe(&self, feed_id: &str) -> Result<()> {
        let subscription = self.api.subscribe(feed_id).await?;
        if self.json {
            return print_json(&subscription);
        }
        println!("Subscribed to {}", subscription.feed_id);
        Ok(())
    }

    async fn unsubscribe(&self, feed_id: &str) -> Result<()> {
        let removed = self.api.unsubscribe(feed_id).await?;
        if self.json {
            return print_json(&removed);
        }
        if removed == 0 {
            println!("Not subscribed to {}", feed_id);
        } else {
            println!("Unsubscribed from {}", feed_id);
        }
        Ok(())
    }

    // =========================================================================
    // Live
    // =========================================================================

    async fn watch(&self) -> Result<()> {
        if !self.api.session().is_authenticated() {
            warn!("Watching without a session; the server will not push anything");
        }

        let json = self.json;
        let mut subscription = self.live.subscribe(move |payload: String| {
            if json {
                println!("{}", payload);
            } else if let Some(item) = parse_news(&payload) {
                println!("{}", item.display_line());
            }
        });
        eprintln!("Listening on {} (Ctrl-C to stop)", self.live.endpoint());

        let interrupted = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            _ = subscription.closed() => false,
        };

        if interrupted {
            info!("Interrupted, closing live channel");
            subscription.cancel();
            subscription.closed().await;
        } else {
            eprintln!("Live channel closed");
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt_username() -> Result<String> {
    print!("Name: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Reject empty or oversized credentials before they reach the server.
pub fn validate_login_input(name: &str, password: &str) -> Result<()> {
    if name.trim().is_empty() || password.is_empty() {
        return Err(anyhow::anyhow!("Name and password required"));
    }
    if name.chars().count() > MAX_USERNAME_LENGTH {
        return Err(anyhow::anyhow!(
            "Name must be at most {} characters",
            MAX_USERNAME_LENGTH
        ));
    }
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(anyhow::anyhow!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Turn a client error into the message shown on the terminal.
pub fn user_message(error: &ApiError, server_url: &str) -> String {
    match error {
        ApiError::InvalidCredentials(message) => message.clone(),
        ApiError::Unauthorized => {
            "Not logged in or session expired. Run `newsfeed login`.".to_string()
        }
        ApiError::RequestFailed { status, body } => {
            if body.trim().is_empty() {
                format!("Server returned {}", status)
            } else {
                format!(
                    "Server returned {}: {}",
                    status,
                    truncate_string(body.trim(), MAX_DISPLAYED_BODY_LEN)
                )
            }
        }
        ApiError::Transport(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::Transport(_) => format!("Unable to connect to server at {}", server_url),
        ApiError::InvalidHeader(_) => {
            "Stored session token is corrupt. Run `newsfeed login`.".to_string()
        }
        ApiError::InvalidResponse(detail) => format!("Unexpected response from server: {}", detail),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_validate_login_input() {
        assert!(validate_login_input("alice", "secret").is_ok());
        assert!(validate_login_input("", "secret").is_err());
        assert!(validate_login_input("   ", "secret").is_err());
        assert!(validate_login_input("alice", "").is_err());
        assert!(validate_login_input(&"a".repeat(51), "secret").is_err());
        assert!(validate_login_input("alice", &"p".repeat(128)).is_ok());
        assert!(validate_login_input("alice", &"p".repeat(129)).is_err());
    }

    #[test]
    fn test_user_message_for_login_failures() {
        let err = ApiError::invalid_credentials(r#"{"message": "Invalid password"}"#);
        assert_eq!(user_message(&err, "http://h"), "Invalid password");
    }

    #[test]
    fn test_user_message_for_unauthorized() {
        let msg = user_message(&ApiError::Unauthorized, "http://h");
        assert!(msg.contains("newsfeed login"));
    }

    #[test]
    fn test_user_message_for_request_failure() {
        let err = ApiError::RequestFailed {
            status: StatusCode::BAD_REQUEST,
            body: "Missing 'feed_id' query parameter".to_string(),
        };
        assert_eq!(
            user_message(&err, "http://h"),
            "Server returned 400 Bad Request: Missing 'feed_id' query parameter"
        );

        let err = ApiError::RequestFailed {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: String::new(),
        };
        assert_eq!(user_message(&err, "http://h"), "Server returned 500 Internal Server Error");
    }

    #[test]
    fn test_app_builds_from_default_config() {
        let config = Config {
            token_store: newsfeed_core::config::TokenStoreKind::Memory,
            ..Config::default()
        };
        let app = App::new(config, false).expect("build app");
        assert_eq!(app.live.endpoint(), "ws://localhost:3000/ws");
        assert!(!app.api.session().is_authenticated());
    }
}
