//! The single outbound path for resource API calls.
//!
//! Every request re-reads the current session from the injected provider and
//! carries `Authorization: Bearer <token>` only when one exists.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::session::{NETWORK_ERROR_MESSAGE, SessionContext, SessionProvider};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{method} {url} could not be completed")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("failed to decode response from {url}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { .. } | ApiError::Decode { .. } => None,
        }
    }

    /// The API rejected the credential (as opposed to the action).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport { .. } => NETWORK_ERROR_MESSAGE.to_string(),
            ApiError::Status { status, .. } if *status == StatusCode::FORBIDDEN => {
                "You do not have permission to perform this action.".to_string()
            }
            ApiError::Status { status, .. } => format!("Request failed (HTTP {status})."),
            ApiError::Decode { .. } => "Received an unexpected response from the API.".to_string(),
        }
    }
}

/// Reaction to a 401 from any protected endpoint.
pub trait UnauthorizedHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl UnauthorizedHandler for SessionContext {
    fn on_unauthorized(&self) {
        warn!("API rejected the stored credential; clearing session");
        if let Err(err) = self.logout() {
            warn!(error = %err, "failed to clear rejected session");
        }
    }
}

pub struct RequestDispatcher {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionProvider>,
    on_unauthorized: Option<Arc<dyn UnauthorizedHandler>>,
}

impl RequestDispatcher {
    pub fn new(base_url: &str, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            on_unauthorized: None,
        }
    }

    /// Installs a handler that runs whenever a call comes back 401.
    #[must_use]
    pub fn with_unauthorized_handler(mut self, handler: Arc<dyn UnauthorizedHandler>) -> Self {
        self.on_unauthorized = Some(handler);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::GET, path, |req| {
                if query.is_empty() {
                    req
                } else {
                    req.query(query)
                }
            })
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::POST, path, |req| req.json(body))
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .execute(Method::PUT, path, |req| req.json(body))
            .await?;
        decode(response).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, |req| req).await?;
        Ok(())
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        configure: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(session) = self.session.current_session() {
            request = request.bearer_auth(&session.token);
        }

        debug!(%method, %url, "dispatching request");
        let response = configure(request).send().await.map_err(|source| {
            warn!(%method, %url, error = %source, "request failed");
            ApiError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%method, %url, %status, "request returned an error status");
        if status == StatusCode::UNAUTHORIZED
            && let Some(handler) = &self.on_unauthorized
        {
            handler.on_unauthorized();
        }
        Err(ApiError::Status {
            method,
            url,
            status,
            body,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let url = response.url().to_string();
    response
        .json()
        .await
        .map_err(|source| ApiError::Decode { url, source })
}
