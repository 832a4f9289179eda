//! Reactive session state shared by the console.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::debug;

use super::gateway::{AuthError, AuthGateway};
use super::record::SessionRecord;
use super::store::StoreError;

/// What the console knows about the current user.
///
/// `Loading` carries no session data, so a half-resolved state cannot be
/// observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Resolved(Option<SessionRecord>),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&SessionRecord> {
        match self {
            SessionState::Resolved(session) => session.as_ref(),
            SessionState::Loading => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some_and(SessionRecord::has_token)
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(SessionRecord::is_admin)
    }
}

/// Handle to the session state. Clones share the same state.
///
/// Starts in [`SessionState::Loading`]; [`SessionContext::init`] resolves it
/// from the credential store once.
#[derive(Clone)]
pub struct SessionContext {
    gateway: AuthGateway,
    state: Arc<watch::Sender<SessionState>>,
    initialized: Arc<AtomicBool>,
}

impl SessionContext {
    pub fn new(gateway: AuthGateway) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            gateway,
            state: Arc::new(state),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resolves the state from the store. Only the first call has any effect.
    pub fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("session context already initialized");
            return;
        }
        let session = self.gateway.current_session();
        debug!(authenticated = session.is_some(), "session context resolved");
        self.state.send_replace(SessionState::Resolved(session));
    }

    /// Re-reads the store after something else wrote to it.
    pub fn refresh(&self) {
        self.initialized.store(true, Ordering::SeqCst);
        let session = self.gateway.current_session();
        debug!(authenticated = session.is_some(), "session context refreshed");
        self.state.send_replace(SessionState::Resolved(session));
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<SessionRecord> {
        self.state.borrow().session().cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    pub fn gateway(&self) -> &AuthGateway {
        &self.gateway
    }

    /// Logs in through the gateway and publishes the new session.
    ///
    /// # Errors
    /// Propagates the gateway's error; the state is left unchanged.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionRecord, AuthError> {
        let record = self.gateway.login(username, password).await?;
        self.initialized.store(true, Ordering::SeqCst);
        self.state
            .send_replace(SessionState::Resolved(Some(record.clone())));
        Ok(record)
    }

    /// Clears the stored session and publishes the logged-out state.
    ///
    /// # Errors
    /// Fails if the stored record cannot be removed; the state is unchanged.
    pub fn logout(&self) -> Result<(), StoreError> {
        self.gateway.logout()?;
        self.initialized.store(true, Ordering::SeqCst);
        self.state.send_replace(SessionState::Resolved(None));
        Ok(())
    }
}

/// Provider scope for screens that read the session.
#[derive(Clone, Default)]
pub struct Scope {
    session: Option<SessionContext>,
}

impl Scope {
    /// A scope with no session provider installed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: SessionContext) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Returns the installed session context.
    ///
    /// # Panics
    /// Panics when no session provider was installed. That is a wiring bug.
    #[track_caller]
    pub fn use_session(&self) -> &SessionContext {
        match &self.session {
            Some(session) => session,
            None => panic!("use_session must be used within a session provider scope"),
        }
    }
}
