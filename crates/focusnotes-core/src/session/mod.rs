//! Session context: the single source of truth for who is signed in.
//!
//! [`SessionContext`] owns the backend session lifecycle (bootstrap, sign-up,
//! sign-in, sign-out) and publishes every [`SessionState`] change on a
//! `watch` channel so any number of consumers can follow it.

mod route;
mod state;
mod store;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

pub use route::{resolve_route, Route};
pub use state::{SessionEvent, SessionState};
pub use store::{MemorySessionStore, SessionPersistence};

use crate::backend::{Account, Backend, BackendError, SessionHandle};

/// Shown to users for any sign-in/sign-up failure.
pub const GENERIC_AUTH_FAILURE: &str = "Invalid credentials or error connecting to the server.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("Could not reach the backend: {0}")]
    Network(String),
    #[error("Backend failure: {0}")]
    Server(String),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("{0}")]
    Validation(&'static str),
    #[error("Secure storage error: {0}")]
    Storage(String),
    #[error("Failed to encode session: {0}")]
    Json(#[from] serde_json::Error),
}

impl AuthError {
    /// Message suitable for an alert. Only validation problems are spelled
    /// out; everything else collapses into one generic message.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(message) => *message,
            _ => GENERIC_AUTH_FAILURE,
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(error: BackendError) -> Self {
        if error.is_network() {
            return Self::Network(error.to_string());
        }
        if error.is_server() {
            return Self::Server(error.to_string());
        }
        match error {
            BackendError::Unauthorized(message) => Self::InvalidCredentials(message),
            other => Self::Rejected(other.to_string()),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

pub struct SessionContext<B: Backend + ?Sized, S: SessionPersistence> {
    backend: Arc<B>,
    store: S,
    state: watch::Sender<SessionState>,
}

impl<B: Backend + ?Sized, S: SessionPersistence> SessionContext<B, S> {
    /// New context in the `Loading` state. Call [`Self::bootstrap`] next.
    pub fn new(backend: Arc<B>, store: S) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            backend,
            store,
            state,
        }
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every later state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Where a request for `requested` lands given the current state.
    pub fn route(&self, requested: Route) -> Route {
        resolve_route(&self.state.borrow(), requested)
    }

    fn dispatch(&self, event: SessionEvent) {
        self.state.send_modify(|state| {
            let previous = state.label();
            *state = std::mem::take(state).apply(event);
            tracing::debug!("Session state {} -> {}", previous, state.label());
        });
    }

    /// Restore the remote session on process start.
    ///
    /// Always leaves `Loading`. A persisted handle that the backend rejects
    /// is forgotten; one that merely could not be checked (network) is kept.
    pub async fn bootstrap(&self) -> SessionState {
        let stored = match self.store.load_session() {
            Ok(stored) => stored,
            Err(error) => {
                tracing::warn!("Failed to load persisted session: {}", error);
                None
            }
        };
        self.backend.attach_session(stored.as_ref());

        match self.backend.get_account().await {
            Ok(account) => {
                tracing::info!("Restored session for {}", account.email);
                self.dispatch(SessionEvent::Restored {
                    account,
                    session: stored,
                });
            }
            Err(error) => {
                tracing::info!("No active session: {}", error);
                if matches!(error, BackendError::Unauthorized(_)) && stored.is_some() {
                    self.backend.attach_session(None);
                    if let Err(error) = self.store.clear_session() {
                        tracing::warn!("Failed to clear rejected session: {}", error);
                    }
                }
                self.dispatch(SessionEvent::RestoreFailed);
            }
        }

        self.state()
    }

    /// Create an account, then sign into it.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> AuthResult<Account> {
        let result = self.register(name, email, password).await;
        self.finish_sign_in("Sign-up", result)
    }

    /// Sign in with email and password.
    pub async fn signin(&self, email: &str, password: &str) -> AuthResult<Account> {
        let result = self.open_session(email, password).await;
        self.finish_sign_in("Sign-in", result)
    }

    /// Delete the remote session and clear local state.
    ///
    /// Local state is cleared even when the remote call fails; that error is
    /// still returned.
    pub async fn signout(&self) -> AuthResult<()> {
        let remote = self.backend.delete_session().await;
        self.backend.attach_session(None);
        let cleared = self.store.clear_session();
        self.dispatch(SessionEvent::SignedOut);

        if let Err(error) = remote {
            tracing::warn!("Remote sign-out failed, local session cleared anyway: {}", error);
            return Err(error.into());
        }
        cleared
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<(Account, SessionHandle)> {
        validate_credentials(email, password)?;
        self.backend
            .create_account(name.trim(), email.trim(), password)
            .await?;
        self.open_session(email, password).await
    }

    async fn open_session(
        &self,
        email: &str,
        password: &str,
    ) -> AuthResult<(Account, SessionHandle)> {
        validate_credentials(email, password)?;
        let session = self
            .backend
            .create_email_session(email.trim(), password)
            .await?;
        let account = self.backend.get_account().await?;
        Ok((account, session))
    }

    fn finish_sign_in(
        &self,
        action: &str,
        result: AuthResult<(Account, SessionHandle)>,
    ) -> AuthResult<Account> {
        match result {
            Ok((account, session)) => {
                if let Err(error) = self.store.save_session(&session) {
                    tracing::warn!(
                        "{} succeeded but the session could not be persisted: {}",
                        action,
                        error
                    );
                }
                tracing::info!("{} succeeded for {}", action, account.email);
                self.dispatch(SessionEvent::SignedIn {
                    account: account.clone(),
                    session,
                });
                Ok(account)
            }
            Err(error) => {
                tracing::error!("{} failed: {}", action, error);
                // A half-finished attempt may have attached a new session.
                self.backend.attach_session(self.state().session());
                Err(error)
            }
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> AuthResult<()> {
    if email.trim().is_empty() {
        return Err(AuthError::Validation("Email is required"));
    }
    if password.trim().is_empty() {
        return Err(AuthError::Validation("Password is required"));
    }
    Ok(())
}
