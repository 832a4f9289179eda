//! Login screen flow: submits credentials and restores the saved origin.

use tracing::warn;

use crate::navigation::{Location, Navigator};
use crate::session::SessionContext;

/// Query parameter the login screen reads to show a failure banner.
pub const ERROR_PARAM: &str = "error";
/// Value of [`ERROR_PARAM`] after a failed identity-provider handoff.
pub const OAUTH_FAILED_CODE: &str = "oauth2_failed";
pub const OAUTH_FAILED_MESSAGE: &str = "Sign-in with the identity provider failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Logged in; the navigator now points at this location.
    Redirected(Location),
    /// Rejected; the message is safe to show the user.
    Rejected(&'static str),
}

/// Banner to show on the login screen for `location`, if any.
pub fn banner_for(location: &Location) -> Option<&'static str> {
    match location.param(ERROR_PARAM) {
        Some(OAUTH_FAILED_CODE) => Some(OAUTH_FAILED_MESSAGE),
        _ => None,
    }
}

/// Submits the login form.
///
/// On success the saved origin is consumed and navigated to (replacing the
/// login entry); without one the user lands on `default_entry`. On failure
/// the origin is kept for the next attempt.
pub async fn submit(
    session: &SessionContext,
    nav: &mut Navigator,
    default_entry: &Location,
    username: &str,
    password: &str,
) -> LoginOutcome {
    match session.login(username, password).await {
        Ok(_) => {
            let target = nav.take_origin().unwrap_or_else(|| default_entry.clone());
            nav.replace(target.clone());
            LoginOutcome::Redirected(target)
        }
        Err(err) => {
            warn!(error = %err, "login failed");
            LoginOutcome::Rejected(err.user_message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_for_oauth_failure() {
        let loc = Location::new("/login").with_param(ERROR_PARAM, OAUTH_FAILED_CODE);
        assert_eq!(banner_for(&loc), Some(OAUTH_FAILED_MESSAGE));
    }

    #[test]
    fn test_no_banner_for_plain_login() {
        assert_eq!(banner_for(&Location::new("/login")), None);
        let other = Location::new("/login").with_param(ERROR_PARAM, "something_else");
        assert_eq!(banner_for(&other), None);
    }
}
