use parking_lot::RwLock;
use tracing::info;

pub const HOME_ROUTE: &str = "/";
pub const LOGIN_ROUTE: &str = "/login";
pub const ADMIN_LOGIN_ROUTE: &str = "/admin/login";
pub const ADMIN_ROUTE: &str = "/admin";

/// Tracks the logical screen the client is on so a forced logout can send the
/// user back to the right login page.
#[derive(Debug)]
pub struct Navigator {
    current: RwLock<String>,
}

impl Default for Navigator {
    fn default() -> Self { Self::new(HOME_ROUTE) }
}

impl Navigator {
    pub fn new<S: Into<String>>(initial: S) -> Self { Self { current: RwLock::new(initial.into()) } }

    pub fn current(&self) -> String { self.current.read().clone() }

    pub fn navigate<S: Into<String>>(&self, route: S) {
        let route = route.into();
        info!(target: "unisearch::nav", "navigate -> {}", route);
        *self.current.write() = route;
    }

    pub fn is_login_route(route: &str) -> bool {
        let path = route.split(['?', '#']).next().unwrap_or(route);
        path == LOGIN_ROUTE || path == ADMIN_LOGIN_ROUTE
    }

    pub fn on_login_route(&self) -> bool { Self::is_login_route(&self.current.read()) }

    /// Redirect after an unauthorized response. Admin screens go to the admin
    /// login. Returns false when already on a login route.
    pub fn redirect_to_login(&self) -> bool {
        let target = {
            let cur = self.current.read();
            if Self::is_login_route(&cur) { return false; }
            if cur.starts_with(ADMIN_ROUTE) { ADMIN_LOGIN_ROUTE } else { LOGIN_ROUTE }
        };
        self.navigate(target);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_routes_detected() {
        assert!(Navigator::is_login_route("/login"));
        assert!(Navigator::is_login_route("/admin/login?next=/admin"));
        assert!(!Navigator::is_login_route("/"));
        assert!(!Navigator::is_login_route("/admin"));
    }

    #[test]
    fn redirect_targets() {
        let n = Navigator::default();
        assert!(n.redirect_to_login());
        assert_eq!(n.current(), LOGIN_ROUTE);
        assert!(!n.redirect_to_login());

        let n = Navigator::new("/admin/keys");
        assert!(n.redirect_to_login());
        assert_eq!(n.current(), ADMIN_LOGIN_ROUTE);
    }
}
