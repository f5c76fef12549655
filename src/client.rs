//! This module provides a client to connect to the hosted database

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::record::{DatabaseSchema, ExternalRecord, FieldSet, QueryPage, StoreQuery};
use crate::traits::TaskStore;

/// Version of the hosted database API this client speaks
pub const NOTION_VERSION: &str = "2022-06-28";

/// The part of a database description we care about
#[derive(Deserialize)]
struct DatabaseDescription {
    #[serde(default)]
    properties: Map<String, Value>,
}

/// The error body the hosted database sends along non-success statuses
#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    message: String,
}


/// A [`TaskStore`] backed by a database of the hosted service
pub struct NotionClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    database_id: String,
}

impl NotionClient {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString, U: ToString>(base_url: S, token: T, database_id: U) -> Result<Self> {
        let mut base_url = Url::parse(base_url.as_ref())?;
        // So that joining relative paths keeps the base path (e.g. `/v1`)
        if base_url.path().ends_with('/') == false {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            token: token.to_string(),
            database_id: database_id.to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.api_url, &settings.token, &settings.database_id)
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        Ok(self.http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header("Notion-Version", NOTION_VERSION)
            .header(CONTENT_TYPE, "application/json"))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let response = check_status(response).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Turn a non-success response into an [`Error::ExternalService`], keeping the service's own message when there is one
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiError>(&body) {
        Ok(ApiError { code: Some(code), message }) => {
            log::debug!("External service answered {} ({})", status, code);
            message
        },
        Ok(ApiError { code: None, message }) => message,
        Err(_) => format!("Unexpected HTTP status code {:?}", status),
    };
    Err(Error::ExternalService(message))
}

#[async_trait]
impl TaskStore for NotionClient {
    async fn describe_database(&self) -> Result<DatabaseSchema> {
        let request = self.request(Method::GET, &format!("databases/{}", self.database_id))?;
        let description: DatabaseDescription = self.send(request).await?;
        Ok(DatabaseSchema::from_properties(&description.properties))
    }

    async fn query(&self, query: &StoreQuery) -> Result<QueryPage> {
        let request = self.request(Method::POST, &format!("databases/{}/query", self.database_id))?
            .json(&query.to_json());
        self.send(request).await
    }

    async fn create_record(&self, fields: &FieldSet) -> Result<ExternalRecord> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": fields,
        });
        let request = self.request(Method::POST, "pages")?.json(&body);
        self.send(request).await
    }

    async fn update_record(&self, id: &str, fields: &FieldSet) -> Result<ExternalRecord> {
        let request = self.request(Method::PATCH, &format!("pages/{}", id))?
            .json(&json!({ "properties": fields }));
        self.send(request).await
    }

    async fn archive_record(&self, id: &str) -> Result<()> {
        let request = self.request(Method::PATCH, &format!("pages/{}", id))?
            .json(&json!({ "archived": true }));
        let _: ExternalRecord = self.send(request).await?;
        Ok(())
    }

    async fn get_record(&self, id: &str) -> Result<ExternalRecord> {
        let request = self.request(Method::GET, &format!("pages/{}", id))?;
        self.send(request).await
    }
}
