//! Firestore REST client.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::traits::{Document, DocumentStore, StoreError};
use crate::value::decode_fields;

/// Public Firestore REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://firestore.googleapis.com/v1";

/// Configuration for connecting to Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project id
    pub project_id: String,

    /// Database id
    pub database: String,

    /// REST API base; falls back to the emulator host or the public endpoint
    pub api_base: Option<String>,

    /// OAuth bearer token, if the database requires one
    pub token: Option<String>,

    /// Documents requested per list call
    pub page_size: u32,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            database: "(default)".to_string(),
            api_base: None,
            token: None,
            page_size: 300,
        }
    }
}

impl FirestoreConfig {
    /// Resolve the API base, honoring `FIRESTORE_EMULATOR_HOST`.
    pub fn resolved_api_base(&self) -> String {
        if let Some(base) = &self.api_base {
            return base.trim_end_matches('/').to_string();
        }

        match std::env::var("FIRESTORE_EMULATOR_HOST") {
            Ok(host) if !host.trim().is_empty() => format!("http://{}/v1", host.trim()),
            _ => DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

impl RawDocument {
    fn into_document(self) -> Result<Document, StoreError> {
        let id = self
            .name
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StoreError::Decode(format!("document name without id: {}", self.name)))?
            .to_string();

        Ok(Document {
            id,
            fields: decode_fields(&self.fields)?,
        })
    }
}

/// A Firestore database reached over its REST API.
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: String,
    token: Option<String>,
    page_size: u32,
    closed: AtomicBool,
}

impl FirestoreStore {
    /// Open a client for the configured database.
    pub fn connect(config: FirestoreConfig) -> Result<Self, StoreError> {
        if config.project_id.trim().is_empty() {
            return Err(StoreError::Config("Firestore project_id is not set".to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("sitesmith/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        let documents_url = format!(
            "{}/projects/{}/databases/{}/documents",
            config.resolved_api_base(),
            config.project_id.trim(),
            config.database
        );

        tracing::debug!("Connecting to Firestore at {}", documents_url);

        Ok(Self {
            client,
            documents_url,
            token: config.token.filter(|t| !t.trim().is_empty()),
            page_size: config.page_size.max(1),
            closed: AtomicBool::new(false),
        })
    }

    /// GET a JSON body; `Ok(None)` on 404.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }

        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| StoreError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| StoreError::Decode(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    fn name(&self) -> &'static str {
        "firestore"
    }

    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let url = format!("{}/{}/{}", self.documents_url, collection, id);

        match self.get_json::<RawDocument>(&url, &[]).await? {
            Some(raw) => raw.into_document().map(Some),
            None => Ok(None),
        }
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}/{}", self.documents_url, collection);
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", self.page_size.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }

            // A missing collection lists as empty
            let Some(page) = self.get_json::<ListResponse>(&url, &query).await? else {
                break;
            };

            for raw in page.documents {
                documents.push(raw.into_document()?);
            }

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Fetched {} documents from {}", documents.len(), collection);

        Ok(documents)
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::routing::get;
    use axum::{Json, Router};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    const PREFIX: &str = "projects/demo/databases/(default)/documents";

    fn doc(collection: &str, id: &str, title: &str) -> Value {
        json!({
            "name": format!("{PREFIX}/{collection}/{id}"),
            "fields": { "title": { "stringValue": title } }
        })
    }

    async fn list(
        Path(collection): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, HttpStatus> {
        match (collection.as_str(), params.get("pageToken").map(String::as_str)) {
            ("services", None) => Ok(Json(json!({
                "documents": [doc("services", "a", "First")],
                "nextPageToken": "page-2"
            }))),
            ("services", Some("page-2")) => Ok(Json(json!({
                "documents": [doc("services", "b", "Second")]
            }))),
            ("blog", _) => Ok(Json(json!({}))),
            ("broken", _) => Err(HttpStatus::INTERNAL_SERVER_ERROR),
            _ => Err(HttpStatus::NOT_FOUND),
        }
    }

    async fn single(
        Path((collection, id)): Path<(String, String)>,
        headers: HeaderMap,
    ) -> Result<Json<Value>, HttpStatus> {
        let authorized = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            == Some("Bearer secret");

        match (collection.as_str(), id.as_str()) {
            ("home", "content") if authorized => Ok(Json(json!({
                "name": format!("{PREFIX}/home/content"),
                "fields": { "seoTitle": { "stringValue": "Digital Craft" } }
            }))),
            ("home", "content") => Err(HttpStatus::FORBIDDEN),
            _ => Err(HttpStatus::NOT_FOUND),
        }
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route(&format!("/v1/{PREFIX}/{{collection}}"), get(list))
            .route(&format!("/v1/{PREFIX}/{{collection}}/{{id}}"), get(single));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/v1", addr)
    }

    fn store(api_base: String, token: Option<&str>) -> FirestoreStore {
        FirestoreStore::connect(FirestoreConfig {
            project_id: "demo".to_string(),
            api_base: Some(api_base),
            token: token.map(str::to_string),
            page_size: 1,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn requires_project_id() {
        let result = FirestoreStore::connect(FirestoreConfig::default());

        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn explicit_api_base_wins() {
        let config = FirestoreConfig {
            api_base: Some("http://localhost:8080/v1/".to_string()),
            ..Default::default()
        };

        assert_eq!(config.resolved_api_base(), "http://localhost:8080/v1");
    }

    #[tokio::test]
    async fn follows_page_tokens() {
        let store = store(spawn_server().await, None);

        let docs = store.list_documents("services").await.unwrap();

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(docs[1].fields.get("title"), Some(&json!("Second")));
    }

    #[tokio::test]
    async fn empty_and_missing_collections_list_as_empty() {
        let store = store(spawn_server().await, None);

        assert!(store.list_documents("blog").await.unwrap().is_empty());
        assert!(store.list_documents("contact").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reports_server_errors() {
        let store = store(spawn_server().await, None);

        let err = store.list_documents("broken").await.unwrap_err();

        assert!(matches!(err, StoreError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn sends_bearer_token() {
        let base = spawn_server().await;

        let anonymous = store(base.clone(), None);
        assert!(matches!(
            anonymous.get_document("home", "content").await,
            Err(StoreError::Status { status: 403, .. })
        ));

        let authorized = store(base, Some("secret"));
        let home = authorized.get_document("home", "content").await.unwrap().unwrap();
        assert_eq!(home.id, "content");
        assert_eq!(home.fields.get("seoTitle"), Some(&json!("Digital Craft")));
    }

    #[tokio::test]
    async fn missing_document_is_none() {
        let store = store(spawn_server().await, None);

        assert_eq!(store.get_document("home", "other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn closed_store_rejects_requests() {
        let store = store(spawn_server().await, None);
        store.close().await.unwrap();

        assert!(matches!(
            store.list_documents("services").await,
            Err(StoreError::Closed)
        ));
    }
}
