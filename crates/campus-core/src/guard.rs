//! Access decisions for protected console views.

use crate::navigation::{Location, Navigator};
use crate::session::SessionState;

/// Shown while the session is still being resolved.
pub const PLACEHOLDER: &str = "Loading...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet; decide later.
    Placeholder,
    /// Send the user to `to`, restoring `origin` after login.
    Redirect { to: Location, origin: Location },
    Render,
}

#[derive(Debug, Clone)]
pub struct RouteGuard {
    login: Location,
}

impl RouteGuard {
    pub fn new(login_path: &str) -> Self {
        Self {
            login: Location::new(login_path),
        }
    }

    pub fn decide(&self, state: &SessionState, location: &Location) -> GuardDecision {
        if state.is_loading() {
            return GuardDecision::Placeholder;
        }
        if state.is_authenticated() {
            GuardDecision::Render
        } else {
            GuardDecision::Redirect {
                to: self.login.clone(),
                origin: location.clone(),
            }
        }
    }

    /// Decides for the navigator's current location and performs the redirect.
    pub fn apply(&self, state: &SessionState, nav: &mut Navigator) -> GuardDecision {
        let decision = self.decide(state, nav.current());
        if let GuardDecision::Redirect { to, origin } = &decision {
            nav.redirect_to_login(to.clone(), origin.clone());
        }
        decision
    }
}
