//! In-process backend with the same observable semantics as the hosted one.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};

use super::{
    Account, Backend, BackendError, BackendResult, Document, DocumentData, SessionHandle,
    SESSION_ALREADY_EXISTS,
};
use crate::config::CollectionRef;

#[derive(Debug, Clone)]
struct StoredAccount {
    account: Account,
    password: String,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    owner_id: String,
    document: Document,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<StoredAccount>,
    /// session secret -> (session id, user id)
    sessions: HashMap<String, (String, String)>,
    attached: Option<String>,
    collections: HashMap<CollectionRef, Vec<StoredDocument>>,
    offline: bool,
    last_stamp_ms: i64,
    updates: Vec<(String, DocumentData)>,
}

impl MemoryState {
    fn check_online(&self) -> BackendResult<()> {
        if self.offline {
            Err(BackendError::Offline)
        } else {
            Ok(())
        }
    }

    fn current_user_id(&self) -> BackendResult<String> {
        self.attached
            .as_ref()
            .and_then(|secret| self.sessions.get(secret))
            .map(|(_, user_id)| user_id.clone())
            .ok_or_else(|| {
                BackendError::Unauthorized("User (role: guests) missing scope".to_string())
            })
    }

    /// Strictly increasing timestamps so every write produces a new revision.
    fn next_stamp(&mut self) -> String {
        let stamp = chrono::Utc::now().timestamp_millis().max(self.last_stamp_ms + 1);
        self.last_stamp_ms = stamp;
        DateTime::from_timestamp_millis(stamp).map_or_else(
            || stamp.to_string(),
            |time| time.to_rfc3339_opts(SecondsFormat::Millis, false),
        )
    }

    fn owned_document_mut(
        &mut self,
        collection: &CollectionRef,
        id: &str,
    ) -> BackendResult<&mut StoredDocument> {
        let user_id = self.current_user_id()?;
        self.collections
            .get_mut(collection)
            .and_then(|documents| {
                documents
                    .iter_mut()
                    .find(|stored| stored.document.id == id && stored.owner_id == user_id)
            })
            .ok_or_else(|| {
                BackendError::NotFound(format!("Document with the requested ID '{id}' could not be found"))
            })
    }
}

/// Thread-safe in-memory backend. Documents are scoped to the account that
/// created them, mirroring per-user document permissions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate losing (or regaining) connectivity.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every `update_document` payload received so far, in order.
    pub fn recorded_updates(&self) -> Vec<(String, DocumentData)> {
        self.lock().updates.clone()
    }

    /// Register an account directly, bypassing the remote call.
    pub fn seed_account(&self, name: &str, email: &str, password: &str) -> Account {
        let account = Account {
            id: uuid::Uuid::now_v7().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.lock().accounts.push(StoredAccount {
            account: account.clone(),
            password: password.to_string(),
        });
        account
    }

    /// Number of remote sessions that are still valid.
    pub fn active_sessions(&self) -> usize {
        self.lock().sessions.len()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<Account> {
        let mut state = self.lock();
        state.check_online()?;
        if state
            .accounts
            .iter()
            .any(|stored| stored.account.email.eq_ignore_ascii_case(email))
        {
            return Err(BackendError::Api {
                status: 409,
                kind: Some("user_already_exists".to_string()),
                message: "A user with the same email already exists".to_string(),
            });
        }
        if password.len() < 8 {
            return Err(BackendError::Api {
                status: 400,
                kind: Some("general_argument_invalid".to_string()),
                message: "Password must be at least 8 characters".to_string(),
            });
        }

        let account = Account {
            id: uuid::Uuid::now_v7().simple().to_string(),
            name: name.to_string(),
            email: email.to_string(),
        };
        state.accounts.push(StoredAccount {
            account: account.clone(),
            password: password.to_string(),
        });
        Ok(account)
    }

    async fn create_email_session(
        &self,
        email: &str,
        password: &str,
    ) -> BackendResult<SessionHandle> {
        let mut state = self.lock();
        state.check_online()?;
        if state.current_user_id().is_ok() {
            return Err(BackendError::Api {
                status: 401,
                kind: Some(SESSION_ALREADY_EXISTS.to_string()),
                message: "Creation of a session is prohibited when a session is active.".to_string(),
            });
        }
        let user_id = state
            .accounts
            .iter()
            .find(|stored| {
                stored.account.email.eq_ignore_ascii_case(email) && stored.password == password
            })
            .map(|stored| stored.account.id.clone())
            .ok_or_else(|| {
                BackendError::Unauthorized(
                    "Invalid credentials. Please check the email and password.".to_string(),
                )
            })?;

        let session = SessionHandle {
            id: uuid::Uuid::now_v7().simple().to_string(),
            user_id: user_id.clone(),
            secret: uuid::Uuid::now_v7().simple().to_string(),
            expire: None,
        };
        state
            .sessions
            .insert(session.secret.clone(), (session.id.clone(), user_id));
        state.attached = Some(session.secret.clone());
        Ok(session)
    }

    async fn get_account(&self) -> BackendResult<Account> {
        let state = self.lock();
        state.check_online()?;
        let user_id = state.current_user_id()?;
        state
            .accounts
            .iter()
            .find(|stored| stored.account.id == user_id)
            .map(|stored| stored.account.clone())
            .ok_or_else(|| BackendError::NotFound(format!("User {user_id} not found")))
    }

    async fn delete_session(&self) -> BackendResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        if let Some(secret) = state.attached.take() {
            state.sessions.remove(&secret);
        }
        Ok(())
    }

    fn attach_session(&self, session: Option<&SessionHandle>) {
        self.lock().attached = session.map(|session| session.secret.clone());
    }

    async fn create_document(
        &self,
        collection: &CollectionRef,
        data: DocumentData,
    ) -> BackendResult<Document> {
        let mut state = self.lock();
        state.check_online()?;
        let owner_id = state.current_user_id()?;
        let stamp = state.next_stamp();
        let document = Document {
            id: uuid::Uuid::now_v7().simple().to_string(),
            created_at: Some(stamp.clone()),
            updated_at: Some(stamp),
            data,
        };
        state
            .collections
            .entry(collection.clone())
            .or_default()
            .push(StoredDocument {
                owner_id,
                document: document.clone(),
            });
        Ok(document)
    }

    async fn get_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<Document> {
        let mut state = self.lock();
        state.check_online()?;
        Ok(state.owned_document_mut(collection, id)?.document.clone())
    }

    async fn update_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        data: DocumentData,
    ) -> BackendResult<Document> {
        let mut state = self.lock();
        state.check_online()?;
        let stamp = state.next_stamp();
        state.updates.push((id.to_string(), data.clone()));
        let stored = state.owned_document_mut(collection, id)?;
        stored.document.data.extend(data);
        stored.document.updated_at = Some(stamp);
        Ok(stored.document.clone())
    }

    async fn delete_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<()> {
        let mut state = self.lock();
        state.check_online()?;
        state.owned_document_mut(collection, id)?;
        if let Some(documents) = state.collections.get_mut(collection) {
            documents.retain(|stored| stored.document.id != id);
        }
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionRef) -> BackendResult<Vec<Document>> {
        let state = self.lock();
        state.check_online()?;
        let user_id = state.current_user_id()?;
        Ok(state
            .collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|stored| stored.owner_id == user_id)
                    .map(|stored| stored.document.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
