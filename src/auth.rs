//! Token authentication for the Seafile web API.

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;
use tracing::debug;

use crate::endpoint::ApiUrl;
use crate::error::{Result, SeafileError};
use crate::models::AuthTokenResponse;

/// How a client proves its identity to the server.
#[derive(Clone)]
enum Credentials {
    Token,
    Password { username: String, password: String },
}

/// Authenticator for Seafile API requests.
///
/// Either wraps a ready-made API token or exchanges a username/password pair
/// for one on first use.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<Credentials>,
    cached_token: Arc<RwLock<Option<String>>>,
}

impl Authenticator {
    /// Use an existing API token.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credentials: Arc::new(Credentials::Token),
            cached_token: Arc::new(RwLock::new(Some(token.into()))),
        }
    }

    /// Log in with account credentials the first time a token is needed.
    pub fn with_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Arc::new(Credentials::Password {
                username: username.into(),
                password: password.into(),
            }),
            cached_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the API token, logging in if necessary.
    pub async fn get_token(&self, http: &Client, server: &str) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                return Ok(token.clone());
            }
        }

        let mut cached = self.cached_token.write().await;
        // Another caller may have logged in while we waited for the lock
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let token = self.fetch_token(http, server).await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    async fn fetch_token(&self, http: &Client, server: &str) -> Result<String> {
        let (username, password) = match self.credentials.as_ref() {
            Credentials::Password { username, password } => (username, password),
            Credentials::Token => {
                return Err(SeafileError::AuthenticationError(
                    "no token and no credentials available".to_string(),
                ))
            }
        };

        let url = ApiUrl::new("/api2/auth-token/").resolve(server);
        debug!(%url, %username, "requesting auth token");

        let params = [("username", username.as_str()), ("password", password.as_str())];
        let response = http.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SeafileError::AuthenticationError(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: AuthTokenResponse = response.json().await?;
        Ok(token_response.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_token_needs_no_request() {
        let auth = Authenticator::with_token("abc");
        // Nothing listens on this address; the cached token must be used.
        let token = auth
            .get_token(&Client::new(), "http://127.0.0.1:9")
            .await
            .unwrap();
        assert_eq!(token, "abc");
    }
}
