//! Screen routing rules driven by session state.

use serde::Serialize;

use super::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    SignIn,
    Register,
    Editor,
}

impl Route {
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        matches!(self, Self::Editor)
    }
}

/// Where a request for `requested` actually lands.
///
/// Signed-out users are sent to sign-in instead of the editor; signed-in
/// users are sent to the editor instead of sign-in/register. Nothing
/// redirects while the session is still loading.
#[must_use]
pub const fn resolve_route(state: &SessionState, requested: Route) -> Route {
    match (state, requested) {
        (SessionState::Unauthenticated, requested) if requested.requires_auth() => Route::SignIn,
        (SessionState::Authenticated { .. }, Route::SignIn | Route::Register) => Route::Editor,
        _ => requested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Account;

    fn signed_in() -> SessionState {
        SessionState::Authenticated {
            account: Account {
                id: "u".to_string(),
                name: String::new(),
                email: "u@example.com".to_string(),
            },
            session: None,
        }
    }

    #[test]
    fn signed_out_users_are_sent_to_sign_in() {
        let state = SessionState::Unauthenticated;
        assert_eq!(resolve_route(&state, Route::Editor), Route::SignIn);
        assert_eq!(resolve_route(&state, Route::Register), Route::Register);
    }

    #[test]
    fn signed_in_users_skip_auth_screens() {
        let state = signed_in();
        assert_eq!(resolve_route(&state, Route::SignIn), Route::Editor);
        assert_eq!(resolve_route(&state, Route::Register), Route::Editor);
        assert_eq!(resolve_route(&state, Route::Editor), Route::Editor);
    }

    #[test]
    fn loading_never_redirects() {
        for route in [Route::SignIn, Route::Register, Route::Editor] {
            assert_eq!(resolve_route(&SessionState::Loading, route), route);
        }
    }
}
