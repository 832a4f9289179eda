//! Completion of the identity-provider redirect.
//!
//! The provider sends the browser back to a fixed path with the outcome in
//! the query string (`token`, `username`, `role`, `name`, `email`). Only
//! `token` is required.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::RoutesConfig;
use crate::login::{ERROR_PARAM, OAUTH_FAILED_CODE};
use crate::navigation::{Location, Navigator};
use crate::session::{CredentialStore, SessionContext, SessionRecord};

/// Transient indicator rendered while the handoff completes.
pub const AUTHENTICATING_MESSAGE: &str = "Authenticating with the identity provider...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPhase {
    Parsing,
    Completing,
    Failed,
}

/// An expected external outcome, reported rather than raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandoffFailure {
    #[error("redirect carried no token")]
    MissingToken,
    #[error("session could not be persisted")]
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    Completed {
        record: SessionRecord,
        target: Location,
    },
    Failed {
        reason: HandoffFailure,
        target: Location,
    },
}

/// Builds a session record from the redirect's query parameters.
pub fn parse_redirect(location: &Location) -> Option<SessionRecord> {
    let token = location.param("token").filter(|t| !t.is_empty())?;
    let optional = |key: &str| {
        location
            .param(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    Some(
        SessionRecord::new(
            token,
            location.param("username").unwrap_or_default(),
            location.param("role").unwrap_or_default(),
        )
        .with_profile(optional("name"), optional("email")),
    )
}

/// One-shot handler for the redirect path.
pub struct RedirectCompletionHandler {
    store: Arc<dyn CredentialStore>,
    grace: Duration,
    login: Location,
    default_entry: Location,
    phase: RedirectPhase,
    outcome: Option<RedirectOutcome>,
}

impl RedirectCompletionHandler {
    pub fn new(store: Arc<dyn CredentialStore>, routes: &RoutesConfig, grace: Duration) -> Self {
        Self {
            store,
            grace,
            login: Location::new(&routes.login),
            default_entry: Location::new(&routes.default_entry),
            phase: RedirectPhase::Parsing,
            outcome: None,
        }
    }

    pub fn phase(&self) -> RedirectPhase {
        self.phase
    }

    pub fn render(&self) -> &'static str {
        AUTHENTICATING_MESSAGE
    }

    /// Consumes the redirect once. Later calls return `None`.
    ///
    /// With a token: persists the record, waits the grace delay, refreshes
    /// `session`, then hard-navigates to the default entry. Without one: the
    /// store is left alone and the user is sent to login with a failure flag.
    pub async fn complete(
        &mut self,
        location: &Location,
        session: &SessionContext,
        nav: &mut Navigator,
    ) -> Option<RedirectOutcome> {
        if self.phase != RedirectPhase::Parsing {
            debug!(phase = ?self.phase, "redirect already handled");
            return None;
        }

        let outcome = self.finish(location, session, nav).await;
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Runs the handler to the end of its lifetime and returns its outcome.
    ///
    /// A handler that already completed hands back the earlier outcome
    /// without touching the store or the navigator again.
    pub async fn run(
        mut self,
        location: &Location,
        session: &SessionContext,
        nav: &mut Navigator,
    ) -> RedirectOutcome {
        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.finish(location, session, nav).await,
        }
    }

    async fn finish(
        &mut self,
        location: &Location,
        session: &SessionContext,
        nav: &mut Navigator,
    ) -> RedirectOutcome {
        let Some(record) = parse_redirect(location) else {
            warn!("identity-provider redirect arrived without a token");
            return self.fail(HandoffFailure::MissingToken, nav);
        };

        if let Err(err) = self.store.save(&record) {
            error!(error = %err, "failed to persist redirect session");
            return self.fail(HandoffFailure::Persist, nav);
        }
        self.phase = RedirectPhase::Completing;

        if !self.grace.is_zero() {
            tokio::time::sleep(self.grace).await;
        }
        session.refresh();
        nav.hard(self.default_entry.clone());
        info!(username = %record.username, "identity-provider sign-in completed");

        RedirectOutcome::Completed {
            record,
            target: self.default_entry.clone(),
        }
    }

    fn fail(&mut self, reason: HandoffFailure, nav: &mut Navigator) -> RedirectOutcome {
        self.phase = RedirectPhase::Failed;
        let target = self
            .login
            .clone()
            .with_param(ERROR_PARAM, OAUTH_FAILED_CODE);
        nav.push(target.clone());
        RedirectOutcome::Failed { reason, target }
    }
}
