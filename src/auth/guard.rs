use reqwest::Url;

/// Outcome of checking a path against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Not signed in on a protected page; `location` carries the `callbackUrl`.
    RedirectToLogin { location: String },
    /// Signed in on a login/register page.
    RedirectToDashboard,
}

/// Decides whether a page may be shown for the current session.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    protected: Vec<String>,
    auth_routes: Vec<String>,
    login_path: String,
    dashboard_path: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            protected: ["/dashboard", "/projects", "/jobs", "/settings"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            auth_routes: ["/login", "/register"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            login_path: "/login".to_string(),
            dashboard_path: "/dashboard".to_string(),
        }
    }
}

impl RouteGuard {
    pub fn dashboard_path(&self) -> &str {
        &self.dashboard_path
    }

    /// `pathname` is protected when it equals a protected route or lies below it.
    pub fn is_protected(&self, pathname: &str) -> bool {
        self.protected.iter().any(|route| {
            pathname == route
                || pathname
                    .strip_prefix(route.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }

    /// Auth routes match exactly.
    pub fn is_auth_route(&self, pathname: &str) -> bool {
        self.auth_routes.iter().any(|route| pathname == route)
    }

    pub fn check(&self, pathname: &str, authenticated: bool) -> GuardDecision {
        if self.is_protected(pathname) && !authenticated {
            return GuardDecision::RedirectToLogin {
                location: self.login_location(pathname),
            };
        }
        if self.is_auth_route(pathname) && authenticated {
            return GuardDecision::RedirectToDashboard;
        }
        GuardDecision::Allow
    }

    fn login_location(&self, callback: &str) -> String {
        match Url::parse("http://localhost").and_then(|base| base.join(&self.login_path)) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("callbackUrl", callback);
                format!("{}?{}", url.path(), url.query().unwrap_or_default())
            }
            Err(_) => self.login_path.clone(),
        }
    }
}
