use tokio::sync::watch;
use tracing::debug;

use super::SessionStore;

/// Top-level "logged in" flag shown in the navigation bar or prompt.
///
/// Follows the session store through its change channel. Refreshing it does
/// not re-run the route gate for views that are already mounted.
#[derive(Debug)]
pub struct AuthIndicator {
    authenticated: bool,
    changes: watch::Receiver<Option<String>>,
}

impl AuthIndicator {
    pub fn new(session: &SessionStore) -> Self {
        let mut changes = session.subscribe();
        let authenticated = changes.borrow_and_update().is_some();
        Self {
            authenticated,
            changes,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Pick up a pending token change. Returns true if the flag flipped.
    pub fn refresh(&mut self) -> bool {
        match self.changes.has_changed() {
            Ok(true) => self.apply(),
            _ => false,
        }
    }

    fn apply(&mut self) -> bool {
        let now = self.changes.borrow_and_update().is_some();
        let flipped = now != self.authenticated;
        if flipped {
            debug!(authenticated = now, "Auth state changed");
        }
        self.authenticated = now;
        flipped
    }
}
