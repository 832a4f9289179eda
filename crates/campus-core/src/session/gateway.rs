//! Password login exchange and store access.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::record::SessionRecord;
use super::store::{CredentialStore, StoreError};

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password. Please try again.";
pub const NETWORK_ERROR_MESSAGE: &str = "Unable to reach the campus API. Please try again.";

#[derive(Debug, Error)]
pub enum AuthError {
    /// Never says whether the user exists.
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("login request failed")]
    Network(#[source] reqwest::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Message shown on the login screen.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => INVALID_CREDENTIALS_MESSAGE,
            AuthError::Network(_) | AuthError::Store(_) => NETWORK_ERROR_MESSAGE,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: Option<String>,
    username: Option<String>,
    role: Option<String>,
    name: Option<String>,
    email: Option<String>,
}

impl LoginResponse {
    fn into_record(self) -> Option<SessionRecord> {
        let token = self.token.filter(|t| !t.is_empty())?;
        Some(
            SessionRecord::new(
                token,
                self.username.unwrap_or_default(),
                self.role.unwrap_or_default(),
            )
            .with_profile(self.name, self.email),
        )
    }
}

/// Stateless auth operations over a credential store.
#[derive(Clone)]
pub struct AuthGateway {
    http: reqwest::Client,
    login_url: String,
    store: Arc<dyn CredentialStore>,
}

impl AuthGateway {
    pub fn new(auth_base_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            login_url: format!("{}/login", auth_base_url.trim_end_matches('/')),
            store,
        }
    }

    /// Exchanges a username and password for a session.
    ///
    /// The record is persisted before this returns, so the store is already
    /// consistent for any caller that observes `Ok`.
    ///
    /// # Errors
    /// `InvalidCredentials` on a non-2xx response or a response without a token,
    /// `Network` when the call cannot complete, `Store` when persisting fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionRecord, AuthError> {
        let response = self
            .http
            .post(&self.login_url)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(AuthError::Network)?;

        let status = response.status();
        if !status.is_success() {
            debug!(%status, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let body: LoginResponse = response.json().await.map_err(AuthError::Network)?;
        let record = body.into_record().ok_or(AuthError::InvalidCredentials)?;

        self.store.save(&record)?;
        info!(username = %record.username, role = %record.role, "logged in");
        Ok(record)
    }

    /// Clears the stored session. Local only; the API is not told.
    ///
    /// # Errors
    /// Fails if an existing record cannot be removed.
    pub fn logout(&self) -> Result<bool, StoreError> {
        let had_session = self.store.clear()?;
        if had_session {
            info!("logged out");
        }
        Ok(had_session)
    }

    pub fn current_session(&self) -> Option<SessionRecord> {
        self.store.load()
    }
}
