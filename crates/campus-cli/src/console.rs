//! Console host: wires the session subsystem together and renders screens as text.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use campus_core::config::{Config, UnauthorizedPolicy};
use campus_core::dispatch::RequestDispatcher;
use campus_core::guard::{GuardDecision, PLACEHOLDER, RouteGuard};
use campus_core::login::{self, LoginOutcome};
use campus_core::navigation::{Location, Navigator};
use campus_core::redirect::{RedirectCompletionHandler, RedirectOutcome};
use campus_core::resources::{Resource, ResourceClient};
use campus_core::session::{AuthGateway, FileCredentialStore, Scope, SessionContext, SessionRecord};
use comfy_table::{ContentArrangement, Table};

const MAX_REDIRECTS: usize = 8;

enum Screen {
    Root,
    Login,
    OAuthRedirect,
    Dashboard,
    Resources,
    NotFound,
}

/// One console "page load" worth of state plus the navigation history.
pub struct Console {
    config: Config,
    store: Arc<FileCredentialStore>,
    auth_base_url: String,
    api_base_url: String,
    scope: Scope,
    resources: ResourceClient,
    guard: RouteGuard,
    nav: Navigator,
}

impl Console {
    /// Builds the console and resolves the session from the store.
    ///
    /// # Errors
    /// Fails if a configured base URL is invalid.
    pub fn boot(config: Config) -> Result<Self> {
        let store = Arc::new(FileCredentialStore::in_campus_home());
        let auth_base_url = config.effective_auth_base_url()?;
        let api_base_url = config.effective_api_base_url()?;
        let (scope, resources) = load_page(&config, &store, &auth_base_url, &api_base_url);

        Ok(Self {
            guard: RouteGuard::new(&config.routes.login),
            nav: Navigator::new(Location::new(&config.routes.default_entry)),
            config,
            store,
            auth_base_url,
            api_base_url,
            scope,
            resources,
        })
    }

    /// Full reload: the session is re-derived from the store.
    fn reload(&mut self) {
        let (scope, resources) = load_page(
            &self.config,
            &self.store,
            &self.auth_base_url,
            &self.api_base_url,
        );
        self.scope = scope;
        self.resources = resources;
    }

    pub fn session(&self) -> &SessionContext {
        self.scope.use_session()
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn current(&self) -> &Location {
        self.nav.current()
    }

    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }

    /// Applies the route guard for a one-shot command targeting `path`.
    ///
    /// # Errors
    /// Fails when there is no session.
    pub fn require_session(&mut self, path: &str) -> Result<SessionRecord> {
        self.nav.push(Location::parse(path));
        let state = self.session().state();
        match self.guard.apply(&state, &mut self.nav) {
            GuardDecision::Render => match state.session() {
                Some(session) => Ok(session.clone()),
                None => bail!("Not logged in. Run `campus login` first."),
            },
            GuardDecision::Redirect { origin, .. } => {
                bail!("Not logged in. Run `campus login` first (to open {origin}).")
            }
            GuardDecision::Placeholder => bail!("Session is still loading."),
        }
    }

    /// Navigates to `target` and renders whatever ends up on screen.
    ///
    /// # Errors
    /// Fails on a redirect loop.
    pub async fn open(&mut self, target: &str) -> Result<String> {
        self.nav.push(Location::parse(target));
        self.render().await
    }

    /// # Errors
    /// Fails on a redirect loop.
    pub async fn back(&mut self) -> Result<Option<String>> {
        if !self.nav.back() {
            return Ok(None);
        }
        self.render().await.map(Some)
    }

    /// Renders the current location, following redirects.
    ///
    /// # Errors
    /// Fails on a redirect loop.
    pub async fn render(&mut self) -> Result<String> {
        let mut lines: Vec<String> = Vec::new();

        for _ in 0..MAX_REDIRECTS {
            let location = self.nav.current().clone();
            match self.screen_for(&location) {
                Screen::Root => {
                    self.nav.replace(Location::new(&self.config.routes.default_entry));
                }
                Screen::OAuthRedirect => {
                    let (message, _) = self.run_redirect(&location).await;
                    lines.push(message.to_string());
                }
                Screen::Login => {
                    lines.push(self.render_login(&location));
                    return Ok(lines.join("\n"));
                }
                Screen::NotFound => {
                    lines.push(format!("Page Not Found: {}", location.path));
                    return Ok(lines.join("\n"));
                }
                screen @ (Screen::Dashboard | Screen::Resources) => {
                    let state = self.session().state();
                    match self.guard.apply(&state, &mut self.nav) {
                        GuardDecision::Placeholder => {
                            lines.push(PLACEHOLDER.to_string());
                            return Ok(lines.join("\n"));
                        }
                        GuardDecision::Redirect { .. } => {}
                        GuardDecision::Render => {
                            let page = match screen {
                                Screen::Dashboard => self.render_dashboard().await,
                                _ => self.render_resources().await,
                            };
                            lines.push(page);
                            if self.session().is_authenticated() {
                                return Ok(lines.join("\n"));
                            }
                            // A 401 cleared the session; the next pass sends the user to login.
                        }
                    }
                }
            }
        }

        bail!("Too many redirects while opening {}", self.nav.current())
    }

    /// Submits the login form from wherever the console currently is.
    pub async fn submit_login(&mut self, username: &str, password: &str) -> LoginOutcome {
        let default_entry = Location::new(&self.config.routes.default_entry);
        let session = self.session().clone();
        login::submit(&session, &mut self.nav, &default_entry, username, password).await
    }

    /// Completes the identity-provider handoff from a pasted redirect URL.
    ///
    /// Accepts a full URL, a `/path?query`, or a bare `token=...` query.
    pub async fn complete_redirect(&mut self, input: &str) -> RedirectOutcome {
        let input = input.trim();
        let parsed = if input.contains('?') || input.contains("://") {
            Location::parse(input)
        } else {
            Location::parse(&format!("?{input}"))
        };
        let location = Location {
            path: self.config.routes.oauth_redirect.clone(),
            query: parsed.query,
        };

        self.nav.push(location.clone());
        let (_, outcome) = self.run_redirect(&location).await;
        outcome
    }

    /// Mounts a handler for the redirect entry and runs it. Returns what the
    /// screen showed while it was mounted.
    async fn run_redirect(&mut self, location: &Location) -> (&'static str, RedirectOutcome) {
        let handler = RedirectCompletionHandler::new(
            Arc::<FileCredentialStore>::clone(&self.store),
            &self.config.routes,
            self.config.redirect_grace(),
        );
        let message = handler.render();
        let session = self.session().clone();
        let outcome = handler.run(location, &session, &mut self.nav).await;
        if self.nav.take_reload() {
            self.reload();
        }
        (message, outcome)
    }

    /// Logs out and returns to the login screen. Returns whether a session existed.
    ///
    /// # Errors
    /// Fails if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<bool> {
        let had_session = self.session().gateway().current_session().is_some();
        self.session().logout()?;
        self.nav.push(Location::new(&self.config.routes.login));
        Ok(had_session)
    }

    fn screen_for(&self, location: &Location) -> Screen {
        let routes = &self.config.routes;
        match location.path.as_str() {
            "/" => Screen::Root,
            p if p == routes.login => Screen::Login,
            p if p == routes.oauth_redirect => Screen::OAuthRedirect,
            p if p == routes.default_entry || p == "/dashboard" => Screen::Dashboard,
            "/resources" => Screen::Resources,
            _ => Screen::NotFound,
        }
    }

    fn render_login(&self, location: &Location) -> String {
        let mut lines = vec!["Sign in to the Smart Campus Operations Hub".to_string()];
        if let Some(banner) = login::banner_for(location) {
            lines.push(format!("! {banner}"));
        }
        if let Some(origin) = self.nav.origin() {
            lines.push(format!("  (you will return to {origin} after signing in)"));
        }
        lines.push("  login <username> <password>".to_string());
        lines.push(format!(
            "  or sign in with the identity provider: {}",
            self.config.oauth_authorize_url
        ));
        lines.join("\n")
    }

    async fn render_dashboard(&self) -> String {
        let session = self.session();
        let mut lines = Vec::new();
        if let Some(record) = session.session() {
            lines.push(format!("Welcome, {}", record.display_name()));
        }

        match self.resources.analytics().await {
            Ok(analytics) => {
                lines.push(format!("Total resources:  {}", analytics.total_resources));
                lines.push(format!("Active:           {}", analytics.active_resources));
                lines.push(format!(
                    "Out of service:   {}",
                    analytics.out_of_service_resources
                ));
                for (kind, count) in &analytics.resources_by_type {
                    lines.push(format!("  {kind}: {count}"));
                }
            }
            Err(err) => lines.push(format!("! {}", err.user_message())),
        }
        lines.join("\n")
    }

    async fn render_resources(&self) -> String {
        match self.resources.list().await {
            Ok(resources) => {
                let mut out = resource_table(&resources);
                if self.session().is_admin() {
                    out.push_str("\nAdmin actions: resources create | update <id> | delete <id>");
                }
                out
            }
            Err(err) => format!("! {}", err.user_message()),
        }
    }
}

fn load_page(
    config: &Config,
    store: &Arc<FileCredentialStore>,
    auth_base_url: &str,
    api_base_url: &str,
) -> (Scope, ResourceClient) {
    let session = SessionContext::new(AuthGateway::new(auth_base_url, Arc::<FileCredentialStore>::clone(store)));
    session.init();

    let mut dispatcher = RequestDispatcher::new(api_base_url, Arc::<FileCredentialStore>::clone(store));
    if config.unauthorized_policy == UnauthorizedPolicy::ClearSession {
        dispatcher = dispatcher.with_unauthorized_handler(Arc::new(session.clone()));
    }

    (
        Scope::with_session(session),
        ResourceClient::new(Arc::new(dispatcher)),
    )
}

/// Renders resources as a plain text table.
pub fn resource_table(resources: &[Resource]) -> String {
    if resources.is_empty() {
        return "No resources found.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Name", "Type", "Capacity", "Location", "Status"]);
    for resource in resources {
        table.add_row(vec![
            resource.id.map(|id| id.to_string()).unwrap_or_default(),
            resource.name.clone(),
            resource.kind.clone(),
            resource.capacity.to_string(),
            resource.location.clone(),
            format!("{:?}", resource.status),
        ]);
    }
    table.to_string()
}
