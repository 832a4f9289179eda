//! In-process navigation: locations, history, and the saved login origin.

use std::fmt;

/// A console location: a path plus decoded query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
        }
    }

    /// Parses `/path?key=value` or a full URL; only path and query are kept.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if let Ok(url) = url::Url::parse(input) {
            return Self {
                path: url.path().to_string(),
                query: url.query_pairs().into_owned().collect(),
            };
        }

        let (path, query) = input.split_once('?').unwrap_or((input, ""));
        let path = if path.is_empty() {
            "/".to_string()
        } else if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            query: url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// First value for `key`, if any.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    Push,
    /// Replaces the current history entry.
    Replace,
    /// Full reload: in-memory state is rebuilt from persistent storage.
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: Location,
    pub kind: NavigationKind,
}

/// Location history for one console session.
#[derive(Debug)]
pub struct Navigator {
    current: Location,
    back_stack: Vec<Location>,
    origin: Option<Location>,
    last: Option<Navigation>,
    reload_pending: bool,
}

impl Navigator {
    pub fn new(start: Location) -> Self {
        Self {
            current: start,
            back_stack: Vec::new(),
            origin: None,
            last: None,
            reload_pending: false,
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn last(&self) -> Option<&Navigation> {
        self.last.as_ref()
    }

    /// Adds a history entry. The saved origin belongs to the entry being left.
    pub fn push(&mut self, to: Location) {
        self.origin = None;
        let previous = std::mem::replace(&mut self.current, to.clone());
        self.back_stack.push(previous);
        self.last = Some(Navigation {
            to,
            kind: NavigationKind::Push,
        });
    }

    pub fn replace(&mut self, to: Location) {
        self.current = to.clone();
        self.last = Some(Navigation {
            to,
            kind: NavigationKind::Replace,
        });
    }

    /// Navigates and asks the host to rebuild in-memory state.
    pub fn hard(&mut self, to: Location) {
        self.back_stack.clear();
        self.origin = None;
        self.current = to.clone();
        self.reload_pending = true;
        self.last = Some(Navigation {
            to,
            kind: NavigationKind::Hard,
        });
    }

    /// Returns `false` when there is nothing to go back to.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.back_stack.pop() else {
            return false;
        };
        self.origin = None;
        self.current = previous.clone();
        self.last = Some(Navigation {
            to: previous,
            kind: NavigationKind::Push,
        });
        true
    }

    /// Replaces the current entry with the login page and remembers `origin`.
    pub fn redirect_to_login(&mut self, login: Location, origin: Location) {
        self.origin = Some(origin);
        self.replace(login);
    }

    pub fn origin(&self) -> Option<&Location> {
        self.origin.as_ref()
    }

    /// Consumes the saved origin.
    pub fn take_origin(&mut self) -> Option<Location> {
        self.origin.take()
    }

    /// Consumes a pending reload request.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path_and_query() {
        let loc = Location::parse("/oauth2/redirect?token=abc123&username=alice&role=ROLE_ADMIN");

        assert_eq!(loc.path, "/oauth2/redirect");
        assert_eq!(loc.param("token"), Some("abc123"));
        assert_eq!(loc.param("username"), Some("alice"));
        assert_eq!(loc.param("email"), None);
    }

    #[test]
    fn test_parse_full_url_decodes_params() {
        let loc = Location::parse(
            "http://localhost:3000/oauth2/redirect?token=a%2Bb&email=alice%40campus.edu&name=Alice+Smith",
        );

        assert_eq!(loc.path, "/oauth2/redirect");
        assert_eq!(loc.param("token"), Some("a+b"));
        assert_eq!(loc.param("email"), Some("alice@campus.edu"));
        assert_eq!(loc.param("name"), Some("Alice Smith"));
    }

    #[test]
    fn test_parse_normalizes_relative_paths() {
        assert_eq!(Location::parse("resources").path, "/resources");
        assert_eq!(Location::parse("").path, "/");
    }

    #[test]
    fn test_display_round_trips_query() {
        let loc = Location::new("/login").with_param("error", "oauth2_failed");
        assert_eq!(loc.to_string(), "/login?error=oauth2_failed");
        assert_eq!(Location::parse(&loc.to_string()), loc);
    }

    #[test]
    fn test_origin_is_consumed_once() {
        let mut nav = Navigator::new(Location::new("/"));
        nav.push(Location::new("/resources"));
        nav.redirect_to_login(Location::new("/login"), Location::new("/resources"));

        assert_eq!(nav.current().path, "/login");
        assert_eq!(nav.last().unwrap().kind, NavigationKind::Replace);
        assert_eq!(nav.take_origin(), Some(Location::new("/resources")));
        assert_eq!(nav.take_origin(), None);
    }

    #[test]
    fn test_origin_does_not_outlive_its_login_entry() {
        let login = Location::new("/login");
        let resources = Location::new("/resources");

        let mut nav = Navigator::new(Location::new("/dashboard"));
        nav.redirect_to_login(login.clone(), resources.clone());
        nav.hard(Location::new("/dashboard"));
        assert!(nav.origin().is_none());

        nav.redirect_to_login(login.clone(), resources.clone());
        nav.push(login.clone().with_param("error", "oauth2_failed"));
        assert!(nav.origin().is_none());

        nav.redirect_to_login(login, resources);
        assert!(nav.back());
        assert!(nav.origin().is_none());
    }

    #[test]
    fn test_hard_navigation_requests_reload_once() {
        let mut nav = Navigator::new(Location::new("/oauth2/redirect"));
        nav.hard(Location::new("/dashboard"));

        assert!(nav.take_reload());
        assert!(!nav.take_reload());
        assert!(!nav.back());
    }

    #[test]
    fn test_back_returns_to_previous() {
        let mut nav = Navigator::new(Location::new("/dashboard"));
        nav.push(Location::new("/resources"));

        assert!(nav.back());
        assert_eq!(nav.current().path, "/dashboard");
        assert!(!nav.back());
    }
}
