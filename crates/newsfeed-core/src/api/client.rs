//! API client for the newsfeed REST backend.
//!
//! Every call goes through [`ApiClient::execute`], which attaches the bearer
//! token held by the shared [`Session`] and applies the session-invalidation
//! policy: a 401 from any endpoint logs the client out locally before the
//! error is returned.

use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::auth::Session;
use crate::models::{Feed, LoginResponse, NewsItem, Subscription, User};
use crate::utils::truncate_string;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Path prefix every REST endpoint lives under
const API_PREFIX: &str = "/api";

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const ME_PATH: &str = "/auth/me";
const FEEDS_PATH: &str = "/feeds";
const NEWS_PATH: &str = "/news";
const SUBSCRIPTIONS_PATH: &str = "/subscriptions";

/// Response bodies longer than this are cut before they reach the logs.
const MAX_LOGGED_BODY_LEN: usize = 500;

#[derive(Debug, Serialize)]
struct LoginPayload<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SubscriptionPayload<'a> {
    feed_id: &'a str,
}

/// Non-2xx reply whose body has been read, after the 401 policy ran.
#[derive(Debug)]
struct Rejection {
    status: StatusCode,
    body: String,
}

/// Authenticated client for the newsfeed API.
/// Clone is cheap - reqwest::Client and Session are both reference counted.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    api_base: String,
    session: Session,
}

impl ApiClient {
    /// Create a client for the server at `server_url` (e.g. `http://localhost:3000`).
    pub fn new(server_url: &str, session: Session) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self::with_http_client(client, server_url, session))
    }

    /// Create a client around a preconfigured reqwest client, sharing its connection pool.
    pub fn with_http_client(client: Client, server_url: &str, session: Session) -> Self {
        Self {
            client,
            api_base: format!("{}{}", server_url.trim_end_matches('/'), API_PREFIX),
            session,
        }
    }

    /// The credential handle this client reads and updates.
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", self.session.token()))?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Send a request with auth headers attached.
    ///
    /// Returns the response for any 2xx status. A 401 clears the session
    /// before `ApiError::Unauthorized` is returned; any other status yields
    /// `ApiError::RequestFailed` with the raw body.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        self.dispatch(builder)
            .await?
            .map_err(|rejection| ApiError::from_status(rejection.status, &rejection.body))
    }

    /// Send a request and read the body of any non-2xx reply.
    ///
    /// The outer error is a transport or header failure. A 401 has already
    /// cleared the session by the time a `Rejection` is returned.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<Result<Response, Rejection>, ApiError> {
        let request = builder.headers(self.auth_headers()?).build()?;
        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, %url, "Sending request");

        let response = self.client.execute(request).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(Ok(response));
        }

        if status == StatusCode::UNAUTHORIZED {
            warn!(%method, %url, "Server rejected the session, logging out locally");
            if let Err(e) = self.session.clear() {
                warn!(error = %e, "Failed to remove persisted session");
            }
        }

        let body = response.text().await?;
        debug!(
            %method,
            %url,
            %status,
            body = %truncate_string(&body, MAX_LOGGED_BODY_LEN),
            "Request failed"
        );
        Ok(Err(Rejection { status, body }))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().clone();
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(%url, error = %e, "Response body did not match the expected shape");
            ApiError::InvalidResponse(format!("{} (from {})", e, url))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.client.get(self.url(path))).await?;
        Self::parse_json(response).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let response = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        Self::parse_json(response).await
    }

    // ===== Session =====

    /// Log in and make the returned token the active credential.
    ///
    /// Any rejection is reported as `ApiError::InvalidCredentials`, carrying the
    /// server's `message` when the body provides one.
    pub async fn login(&self, name: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let builder = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&LoginPayload { name, password });

        let response = match self.dispatch(builder).await? {
            Ok(response) => response,
            Err(rejection) => {
                warn!(user = name, status = %rejection.status, "Login rejected");
                return Err(ApiError::invalid_credentials(&rejection.body));
            }
        };

        let login: LoginResponse = Self::parse_json(response).await?;
        if let Err(e) = self.session.set_token(login.token.clone()) {
            warn!(error = %e, "Failed to persist session");
        }
        info!(user = name, "Login successful");
        Ok(login)
    }

    /// Tell the server to end the session, then drop the local credential.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.execute(self.client.post(self.url(LOGOUT_PATH))).await?;
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to remove persisted session");
        }
        info!("Logged out");
        Ok(())
    }

    /// Fetch the user the current credential belongs to
    pub async fn me(&self) -> Result<User, ApiError> {
        self.get(ME_PATH).await
    }

    // ===== Data Fetching Methods =====

    /// Fetch every feed available for subscription
    pub async fn feeds(&self) -> Result<Vec<Feed>, ApiError> {
        self.get(FEEDS_PATH).await
    }

    /// Fetch news from the feeds the current user subscribes to
    pub async fn news(&self) -> Result<Vec<NewsItem>, ApiError> {
        self.get(NEWS_PATH).await
    }

    /// Fetch the current user's subscriptions
    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        self.get(SUBSCRIPTIONS_PATH).await
    }

    // ===== Subscription Changes =====

    /// Subscribe the current user to `feed_id`
    pub async fn subscribe(&self, feed_id: &str) -> Result<Subscription, ApiError> {
        debug!(feed_id, "Subscribing");
        self.post(SUBSCRIPTIONS_PATH, &SubscriptionPayload { feed_id })
            .await
    }

    /// Remove the subscription to `feed_id`, returning how many records the server deleted.
    pub async fn unsubscribe(&self, feed_id: &str) -> Result<u64, ApiError> {
        debug!(feed_id, "Unsubscribing");
        let builder = self
            .client
            .delete(self.url(SUBSCRIPTIONS_PATH))
            .query(&[("feed_id", feed_id)]);
        let response = self.execute(builder).await?;
        Self::parse_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_api_prefix() {
        let client = ApiClient::new("http://localhost:3000/", Session::in_memory())
            .expect("build client");
        assert_eq!(client.url(ME_PATH), "http://localhost:3000/api/auth/me");
    }

    #[test]
    fn test_auth_headers_with_and_without_token() {
        let session = Session::in_memory();
        let client = ApiClient::new("http://localhost", session.clone()).expect("build client");

        let headers = client.auth_headers().expect("headers");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer ");
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");

        session.set_token("T1").unwrap();
        let headers = client.auth_headers().expect("headers");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer T1");
    }

    #[test]
    fn test_auth_headers_reject_control_characters() {
        let session = Session::in_memory();
        session.set_token("bad\ntoken").unwrap();
        let client = ApiClient::new("http://localhost", session).expect("build client");
        let err = client.auth_headers().expect_err("newline is not a valid header value");
        assert_eq!(err.kind(), crate::api::ErrorKind::TransportError);
    }
}
