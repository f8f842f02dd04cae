//! Session state machine.

use crate::backend::{Account, SessionHandle};

/// Who is signed in, as seen by every consumer of the session context.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Bootstrap has not finished yet
    #[default]
    Loading,
    Unauthenticated,
    /// `session` is `None` when the backend recognised an ambient session
    /// whose handle this process never saw.
    Authenticated {
        account: Account,
        session: Option<SessionHandle>,
    },
}

/// Everything that can change the session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Restored {
        account: Account,
        session: Option<SessionHandle>,
    },
    RestoreFailed,
    SignedIn {
        account: Account,
        session: SessionHandle,
    },
    SignedOut,
}

impl SessionState {
    /// Apply an event. Restore events only count while loading; sign-in
    /// replaces any previous state wholesale; sign-out always ends
    /// unauthenticated.
    #[must_use]
    pub fn apply(self, event: SessionEvent) -> Self {
        match (self, event) {
            (Self::Loading, SessionEvent::Restored { account, session }) => {
                Self::Authenticated { account, session }
            }
            (Self::Loading, SessionEvent::RestoreFailed) | (_, SessionEvent::SignedOut) => {
                Self::Unauthenticated
            }
            (_, SessionEvent::SignedIn { account, session }) => Self::Authenticated {
                account,
                session: Some(session),
            },
            (state, SessionEvent::Restored { .. } | SessionEvent::RestoreFailed) => state,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub const fn account(&self) -> Option<&Account> {
        match self {
            Self::Authenticated { account, .. } => Some(account),
            _ => None,
        }
    }

    #[must_use]
    pub const fn session(&self) -> Option<&SessionHandle> {
        match self {
            Self::Authenticated { session, .. } => session.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated { .. } => "authenticated",
        }
    }
}
