use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{LogInRequest, LogInResponse, Notification, NotificationsResponse, User};

/// TransportError
///
/// Anything that prevented a usable answer: network failure, unexpected
/// status, undecodable body. Surfaced once through the error notification and
/// never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Malformed(String),
}

/// Outcome of the current-user request that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum UserFetch {
    Authenticated(User),
    /// The body carried `error` or `errors`: the session is no longer valid.
    Rejected,
}

/// SessionApi
///
/// The outbound collaborator of the navigation shell. `HttpSessionApi` talks
/// to the server; tests substitute scripted implementations.
#[async_trait]
pub trait SessionApi: Send + Sync {
    async fn get_user(&self) -> Result<UserFetch, TransportError>;
    async fn get_notifications(&self) -> Result<Vec<Notification>, TransportError>;
    /// Invalidates the local session. Nothing is reported back.
    async fn log_out(&self);
}

/// Body of `GET /me`: either `{ user }` or `{ error | errors }`.
#[derive(Debug, Deserialize)]
pub struct CurrentUserPayload {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

/// Whether an `error`/`errors` value counts as set. `null`, `false`, `0` and
/// `""` do not; arrays and objects do, even when empty.
fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl CurrentUserPayload {
    /// An error indicator wins over a user, matching how the server never sends both.
    pub fn into_fetch(self) -> Result<UserFetch, TransportError> {
        let flagged = |value: &Option<serde_json::Value>| value.as_ref().is_some_and(is_truthy);
        if flagged(&self.error) || flagged(&self.errors) {
            return Ok(UserFetch::Rejected);
        }
        self.user
            .map(UserFetch::Authenticated)
            .ok_or_else(|| TransportError::Malformed("neither user nor error in body".to_string()))
    }
}

/// HttpSessionApi
///
/// `reqwest`-backed client for the Tisn API holding the bearer token of the
/// current session.
pub struct HttpSessionApi {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl HttpSessionApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    pub async fn with_token(self, token: impl Into<String>) -> Self {
        *self.token.write().await = Some(token.into());
        self
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, TransportError> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = self.token.read().await.as_deref() {
            request = request.bearer_auth(token);
        }
        Ok(request.send().await?)
    }

    /// Exchanges credentials for a token and keeps it for later requests.
    pub async fn log_in(&self, email: &str, password: &str) -> Result<User, TransportError> {
        let response = self
            .client
            .post(self.url("/users/log-in"))
            .json(&LogInRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::Status(response.status().as_u16()));
        }

        let LogInResponse { token, user } = response.json().await?;
        *self.token.write().await = Some(token);
        Ok(user)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    async fn get_user(&self) -> Result<UserFetch, TransportError> {
        let response = self.get("/me").await?;
        let status = response.status();

        // Rejections are read from the body, whatever the status.
        match response.json::<CurrentUserPayload>().await {
            Ok(payload) => payload.into_fetch(),
            Err(_) if !status.is_success() => Err(TransportError::Status(status.as_u16())),
            Err(e) => Err(TransportError::Request(e)),
        }
    }

    async fn get_notifications(&self) -> Result<Vec<Notification>, TransportError> {
        let response = self.get("/notifications").await?;
        if response.status() != StatusCode::OK {
            return Err(TransportError::Status(response.status().as_u16()));
        }
        let body: NotificationsResponse = response.json().await?;
        Ok(body.notifications)
    }

    async fn log_out(&self) {
        // Tokens are stateless; forgetting it ends the session.
        *self.token.write().await = None;
        tracing::debug!("session token cleared");
    }
}
