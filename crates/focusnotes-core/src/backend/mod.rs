//! Remote backend collaborator.
//!
//! The hosted backend owns accounts, sessions, and documents. Everything the
//! client does goes through the [`Backend`] trait: [`AppwriteBackend`] speaks
//! the REST API over HTTP, [`MemoryBackend`] keeps the same semantics in
//! process for tests.

mod appwrite;
mod memory;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use appwrite::AppwriteBackend;
pub use memory::MemoryBackend;

use crate::config::CollectionRef;

/// Error type returned when a session is created while another is active.
pub const SESSION_ALREADY_EXISTS: &str = "user_session_already_exists";

/// Raw document payload: user fields only, backend `$`-prefixed fields stripped.
pub type DocumentData = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// Opaque handle for an active remote session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: String,
    pub user_id: String,
    pub secret: String,
    #[serde(default)]
    pub expire: Option<String>,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("secret", &"[REDACTED]")
            .field("expire", &self.expire)
            .finish()
    }
}

/// A stored document as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub data: DocumentData,
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid backend configuration: {0}")]
    InvalidConfiguration(String),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Failed to parse JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Not authorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Backend API error: {message} ({status})")]
    Api {
        status: u16,
        kind: Option<String>,
        message: String,
    },
    #[error("Backend is unreachable")]
    Offline,
}

impl BackendError {
    /// The request never got a response (connection, timeout, offline).
    #[must_use]
    pub fn is_network(&self) -> bool {
        match self {
            Self::Http(error) => error.is_connect() || error.is_timeout() || error.is_request(),
            Self::Offline => true,
            _ => false,
        }
    }

    /// The backend answered with a 5xx.
    #[must_use]
    pub fn is_server(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status >= 500,
            Self::Http(error) => error.status().is_some_and(|status| status.is_server_error()),
            _ => false,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Operations the hosted backend exposes to this client.
///
/// A successful `create_email_session` attaches the new session to the
/// backend handle so later calls run as that user; `delete_session` detaches
/// it. `attach_session` restores a session persisted by an earlier process.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn create_account(&self, name: &str, email: &str, password: &str)
        -> BackendResult<Account>;

    async fn create_email_session(&self, email: &str, password: &str)
        -> BackendResult<SessionHandle>;

    async fn get_account(&self) -> BackendResult<Account>;

    /// Delete the currently attached session.
    async fn delete_session(&self) -> BackendResult<()>;

    fn attach_session(&self, session: Option<&SessionHandle>);

    async fn create_document(
        &self,
        collection: &CollectionRef,
        data: DocumentData,
    ) -> BackendResult<Document>;

    async fn get_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<Document>;

    /// Merge `data` into an existing document.
    async fn update_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        data: DocumentData,
    ) -> BackendResult<Document>;

    async fn delete_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<()>;

    /// All documents visible to the attached session, in backend order.
    async fn list_documents(&self, collection: &CollectionRef) -> BackendResult<Vec<Document>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_debug_redacts_secret() {
        let session = SessionHandle {
            id: "sess".to_string(),
            user_id: "user".to_string(),
            secret: "very-secret-token".to_string(),
            expire: None,
        };
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("very-secret-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn classifies_error_kinds() {
        assert!(BackendError::Offline.is_network());
        assert!(!BackendError::Unauthorized("nope".to_string()).is_network());

        let server = BackendError::Api {
            status: 503,
            kind: None,
            message: "unavailable".to_string(),
        };
        assert!(server.is_server());

        let client = BackendError::Api {
            status: 400,
            kind: Some("document_invalid_structure".to_string()),
            message: "bad".to_string(),
        };
        assert!(!client.is_server());
    }
}
