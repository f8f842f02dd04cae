//! Appwrite REST client.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{
    Account, Backend, BackendError, BackendResult, Document, DocumentData, SessionHandle,
    SESSION_ALREADY_EXISTS,
};
use crate::config::{normalize_endpoint, BackendConfig, CollectionRef};

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const PLATFORM_HEADER: &str = "X-Appwrite-Platform";
const SESSION_HEADER: &str = "X-Appwrite-Session";
const FALLBACK_COOKIES_HEADER: &str = "X-Fallback-Cookies";
/// Asks the server to generate the identifier.
const UNIQUE_ID: &str = "unique()";

/// Longest slice of a non-JSON error body kept in an error message.
const ERROR_EXCERPT_CHARS: usize = 180;

pub struct AppwriteBackend {
    endpoint: String,
    project_id: String,
    platform: Option<String>,
    client: Client,
    session_secret: RwLock<Option<String>>,
}

impl AppwriteBackend {
    pub fn new(config: &BackendConfig) -> BackendResult<Self> {
        let endpoint =
            normalize_endpoint(&config.endpoint).map_err(BackendError::InvalidConfiguration)?;
        let project_id = config.project_id.trim().to_string();
        if project_id.is_empty() {
            return Err(BackendError::InvalidConfiguration(
                "project id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            endpoint,
            project_id,
            platform: config.platform.clone(),
            client: Client::builder().build()?,
            session_secret: RwLock::new(None),
        })
    }

    fn current_secret(&self) -> Option<String> {
        self.session_secret
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_secret(&self, secret: Option<String>) {
        *self
            .session_secret
            .write()
            .unwrap_or_else(PoisonError::into_inner) = secret;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.endpoint))
            .header(PROJECT_HEADER, &self.project_id);
        if let Some(platform) = &self.platform {
            request = request.header(PLATFORM_HEADER, platform);
        }
        if let Some(secret) = self.current_secret() {
            request = request.header(SESSION_HEADER, secret);
        }
        request
    }

    fn documents_path(collection: &CollectionRef) -> String {
        format!(
            "/databases/{}/collections/{}/documents",
            urlencoding::encode(&collection.database_id),
            urlencoding::encode(&collection.collection_id)
        )
    }

    fn document_path(collection: &CollectionRef, id: &str) -> String {
        format!(
            "{}/{}",
            Self::documents_path(collection),
            urlencoding::encode(id)
        )
    }

    async fn send(request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(parse_api_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> BackendResult<T> {
        let response = Self::send(request).await?;
        Ok(response.json::<T>().await?)
    }

    fn session_cookie_name(&self) -> String {
        format!("a_session_{}", self.project_id)
    }
}

#[async_trait]
impl Backend for AppwriteBackend {
    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<Account> {
        let payload = serde_json::json!({
            "userId": UNIQUE_ID,
            "email": email,
            "password": password,
            "name": name,
        });
        let account: AccountPayload =
            Self::send_json(self.request(Method::POST, "/account").json(&payload)).await?;
        Ok(account.into())
    }

    async fn create_email_session(
        &self,
        email: &str,
        password: &str,
    ) -> BackendResult<SessionHandle> {
        let payload = serde_json::json!({
            "email": email,
            "password": password,
        });
        let response = Self::send(
            self.request(Method::POST, "/account/sessions/email")
                .json(&payload),
        )
        .await?;

        let fallback_secret = response
            .headers()
            .get(FALLBACK_COOKIES_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| secret_from_fallback_cookies(raw, &self.session_cookie_name()));
        let payload = response.json::<SessionPayload>().await?;

        let secret = Some(payload.secret)
            .filter(|secret| !secret.trim().is_empty())
            .or(fallback_secret)
            .ok_or_else(|| BackendError::Api {
                status: StatusCode::OK.as_u16(),
                kind: None,
                message: "Session response did not include a session secret".to_string(),
            })?;

        let session = SessionHandle {
            id: payload.id,
            user_id: payload.user_id,
            secret,
            expire: payload.expire,
        };
        self.attach_session(Some(&session));
        Ok(session)
    }

    async fn get_account(&self) -> BackendResult<Account> {
        let account: AccountPayload = Self::send_json(self.request(Method::GET, "/account")).await?;
        Ok(account.into())
    }

    async fn delete_session(&self) -> BackendResult<()> {
        let result = Self::send(self.request(Method::DELETE, "/account/sessions/current")).await;
        match result {
            Ok(_) | Err(BackendError::Unauthorized(_)) => {
                self.attach_session(None);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn attach_session(&self, session: Option<&SessionHandle>) {
        self.set_secret(session.map(|session| session.secret.clone()));
    }

    async fn create_document(
        &self,
        collection: &CollectionRef,
        data: DocumentData,
    ) -> BackendResult<Document> {
        let payload = serde_json::json!({
            "documentId": UNIQUE_ID,
            "data": data,
        });
        let document: DocumentPayload = Self::send_json(
            self.request(Method::POST, &Self::documents_path(collection))
                .json(&payload),
        )
        .await?;
        Ok(document.into())
    }

    async fn get_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<Document> {
        let document: DocumentPayload =
            Self::send_json(self.request(Method::GET, &Self::document_path(collection, id)))
                .await?;
        Ok(document.into())
    }

    async fn update_document(
        &self,
        collection: &CollectionRef,
        id: &str,
        data: DocumentData,
    ) -> BackendResult<Document> {
        let payload = serde_json::json!({ "data": data });
        let document: DocumentPayload = Self::send_json(
            self.request(Method::PATCH, &Self::document_path(collection, id))
                .json(&payload),
        )
        .await?;
        Ok(document.into())
    }

    async fn delete_document(&self, collection: &CollectionRef, id: &str) -> BackendResult<()> {
        Self::send(self.request(Method::DELETE, &Self::document_path(collection, id))).await?;
        Ok(())
    }

    async fn list_documents(&self, collection: &CollectionRef) -> BackendResult<Vec<Document>> {
        let list: DocumentListPayload =
            Self::send_json(self.request(Method::GET, &Self::documents_path(collection))).await?;
        tracing::debug!(
            "Listed {} of {} documents",
            list.documents.len(),
            list.total
        );
        Ok(list.documents.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Deserialize)]
struct AccountPayload {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
}

impl From<AccountPayload> for Account {
    fn from(value: AccountPayload) -> Self {
        Self {
            id: value.id,
            name: value.name,
            email: value.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionPayload {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(default)]
    expire: Option<String>,
    #[serde(default)]
    secret: String,
}

#[derive(Debug, Deserialize)]
struct DocumentPayload {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "$createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "$updatedAt", default)]
    updated_at: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl From<DocumentPayload> for Document {
    fn from(value: DocumentPayload) -> Self {
        let data = value
            .fields
            .into_iter()
            .filter(|(key, _)| !key.starts_with('$'))
            .collect();
        Self {
            id: value.id,
            created_at: value.created_at,
            updated_at: value.updated_at,
            data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DocumentListPayload {
    #[serde(default)]
    total: u64,
    documents: Vec<DocumentPayload>,
}

#[derive(Debug, Deserialize)]
struct AppwriteErrorResponse {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> BackendError {
    let (message, kind) = match serde_json::from_str::<AppwriteErrorResponse>(body) {
        Ok(payload) => (
            payload
                .message
                .map(|message| message.trim().to_string())
                .filter(|message| !message.is_empty()),
            payload.kind,
        ),
        Err(_) => (None, None),
    };
    let message = message.unwrap_or_else(|| {
        let trimmed: String = body.trim().chars().take(ERROR_EXCERPT_CHARS).collect();
        if trimmed.is_empty() {
            format!("HTTP {}", status.as_u16())
        } else {
            trimmed
        }
    });

    match status {
        StatusCode::UNAUTHORIZED if kind.as_deref() != Some(SESSION_ALREADY_EXISTS) => {
            BackendError::Unauthorized(message)
        }
        StatusCode::NOT_FOUND => BackendError::NotFound(message),
        _ => BackendError::Api {
            status: status.as_u16(),
            kind,
            message,
        },
    }
}

fn secret_from_fallback_cookies(raw: &str, cookie_name: &str) -> Option<String> {
    let cookies = serde_json::from_str::<Map<String, Value>>(raw).ok()?;
    cookies
        .get(cookie_name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|secret| !secret.is_empty())
}
