//! Route authorization gate.
//!
//! Every navigation to a protected route mounts a [`GuardedMount`] in the
//! `Checking` state. The gate asks its session query whether a token is
//! present and resolves the mount synchronously; no request is made; the
//! first gateway call from the view is what validates the token.

use tracing::debug;

use crate::navigation::{Navigator, Route};

/// Read-only view of the session used for authorization decisions.
pub trait SessionQuery {
    fn has_token(&self) -> bool;
}

impl<Q: SessionQuery + ?Sized> SessionQuery for &Q {
    fn has_token(&self) -> bool {
        (**self).has_token()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Checking,
    Authenticated,
    Unauthenticated,
}

/// A protected view being mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardedMount {
    route: Route,
    state: GateState,
}

impl GuardedMount {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            state: GateState::Checking,
        }
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Apply the decision. Only a mount still in `Checking` transitions.
    pub fn resolve(&mut self, decision: AuthorizationDecision) -> GateState {
        if self.state == GateState::Checking {
            self.state = match decision {
                AuthorizationDecision::Authenticated => GateState::Authenticated,
                AuthorizationDecision::Unauthenticated => GateState::Unauthenticated,
            };
        }
        self.state
    }

    pub fn can_render(&self) -> bool {
        self.state == GateState::Authenticated
    }
}

/// Outcome of asking the gate to open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Route is not protected.
    Public(Route),
    /// Protected route, session present.
    Granted(Route),
    /// Protected route, no session; the navigator is now on login.
    Redirected { from: Route },
}

impl Admission {
    pub fn can_render(&self) -> bool {
        !matches!(self, Admission::Redirected { .. })
    }
}

pub struct RouteGate<Q> {
    session: Q,
    navigator: Navigator,
}

impl<Q: SessionQuery> RouteGate<Q> {
    pub fn new(session: Q, navigator: Navigator) -> Self {
        Self { session, navigator }
    }

    pub fn decide(&self) -> AuthorizationDecision {
        if self.session.has_token() {
            AuthorizationDecision::Authenticated
        } else {
            AuthorizationDecision::Unauthenticated
        }
    }

    /// Run the gate for `route` and move the navigator accordingly.
    pub fn admit(&self, route: Route) -> Admission {
        if !route.is_protected() {
            self.navigator.navigate(route);
            return Admission::Public(route);
        }

        let mut mount = GuardedMount::new(route);
        match mount.resolve(self.decide()) {
            GateState::Authenticated => {
                self.navigator.navigate(route);
                Admission::Granted(route)
            }
            _ => {
                debug!(%route, "Protected route without session");
                self.navigator.redirect_to_login(Some(route));
                Admission::Redirected { from: route }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionStore;
    use crate::navigation::AdminSection;

    #[test]
    fn test_mount_starts_checking() {
        let mount = GuardedMount::new(Route::MemberInfo);
        assert_eq!(mount.state(), GateState::Checking);
        assert!(!mount.can_render());
    }

    #[test]
    fn test_mount_resolves_once() {
        let mut mount = GuardedMount::new(Route::MemberInfo);
        assert_eq!(
            mount.resolve(AuthorizationDecision::Unauthenticated),
            GateState::Unauthenticated
        );
        // Terminal states do not move
        assert_eq!(
            mount.resolve(AuthorizationDecision::Authenticated),
            GateState::Unauthenticated
        );
        assert!(!mount.can_render());

        let mut mount = GuardedMount::new(Route::MemberInfo);
        mount.resolve(AuthorizationDecision::Authenticated);
        assert!(mount.can_render());
    }

    #[test]
    fn test_admit_without_session_redirects() {
        let session = SessionStore::ephemeral();
        let nav = Navigator::default();
        let gate = RouteGate::new(&session, nav.clone());

        let route = Route::Admin(AdminSection::Users);
        let admission = gate.admit(route);

        assert_eq!(admission, Admission::Redirected { from: route });
        assert!(!admission.can_render());
        assert_eq!(nav.route(), Route::Login);
        assert_eq!(nav.return_destination(), route);
    }

    #[test]
    fn test_admit_with_session_grants() {
        let session = SessionStore::ephemeral();
        session.set("abc123");
        let nav = Navigator::default();
        let gate = RouteGate::new(session, nav.clone());

        assert_eq!(gate.decide(), AuthorizationDecision::Authenticated);
        assert_eq!(gate.admit(Route::OrderHistory), Admission::Granted(Route::OrderHistory));
        assert_eq!(nav.route(), Route::OrderHistory);
    }

    #[test]
    fn test_public_routes_skip_gate() {
        let session = SessionStore::ephemeral();
        let nav = Navigator::default();
        let gate = RouteGate::new(&session, nav.clone());

        assert_eq!(gate.admit(Route::Products), Admission::Public(Route::Products));
        assert_eq!(nav.route(), Route::Products);
    }

    #[test]
    fn test_gate_rechecks_on_every_admit() {
        let session = SessionStore::ephemeral();
        let nav = Navigator::default();
        let gate = RouteGate::new(&session, nav.clone());

        session.set("abc123");
        assert!(gate.admit(Route::MemberInfo).can_render());

        session.clear();
        assert!(!gate.admit(Route::MemberInfo).can_render());
    }
}
