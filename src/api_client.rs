//! This module provides a client of the task API, for presentation surfaces

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::{Error, Result};
use crate::server::TASKS_PATH;
use crate::task::{Task, TaskMutation};
use crate::traits::TaskApi;

/// Where presentation surfaces find the task API, unless told otherwise
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Deserialize)]
struct TasksReply {
    tasks: Vec<Task>,
}

#[derive(Deserialize)]
struct TaskReply {
    task: Task,
}

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}


/// A [`TaskApi`] that talks to a task API server over HTTP
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    tasks_url: Url,
}

impl ApiClient {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>>(base_url: S) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        let tasks_url = base_url.join(TASKS_PATH)?;
        Ok(Self {
            http: reqwest::Client::new(),
            tasks_url,
        })
    }

    pub fn tasks_url(&self) -> &Url {
        &self.tasks_url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(client_error)?;
        let status = response.status();
        let text = response.text().await.map_err(client_error)?;

        if status.is_success() == false {
            return Err(Error::ClientSync(error_message(status, &text)));
        }
        serde_json::from_str(&text)
            .map_err(|err| Error::ClientSync(format!("Unexpected reply from the task API: {}", err)))
    }

    /// Create a task
    pub async fn create_task(&self, title: &str, due: Option<&str>) -> Result<Task> {
        let request = self.http.post(self.tasks_url.clone())
            .json(&json!({ "title": title, "due": due }));
        let reply: TaskReply = self.send(request).await?;
        Ok(reply.task)
    }

    /// Archive a task
    pub async fn delete_task(&self, id: &str) -> Result<()> {
        let request = self.http.delete(self.tasks_url.clone())
            .json(&json!({ "id": id }));
        let _: serde_json::Value = self.send(request).await?;
        Ok(())
    }
}

fn client_error(err: reqwest::Error) -> Error {
    Error::ClientSync(err.to_string())
}

/// The `error` field of an error reply, or the raw reply if it has none
fn error_message(status: StatusCode, text: &str) -> String {
    match serde_json::from_str::<ErrorReply>(text) {
        Ok(reply) => reply.error,
        Err(_) if text.is_empty() => format!("Unexpected HTTP status code {:?}", status),
        Err(_) => text.to_string(),
    }
}

#[async_trait]
impl TaskApi for ApiClient {
    async fn list_tasks(&self, date: &str) -> Result<Vec<Task>> {
        let request = self.http.get(self.tasks_url.clone())
            .query(&[("date", date)]);
        let reply: TasksReply = self.send(request).await?;
        Ok(reply.tasks)
    }

    async fn update_task(&self, id: &str, mutation: &TaskMutation) -> Result<Task> {
        let mut body = serde_json::to_value(mutation)
            .map_err(|err| Error::ClientSync(err.to_string()))?;
        if let Some(fields) = body.as_object_mut() {
            fields.insert("id".to_string(), json!(id));
        }
        let request = self.http.patch(self.tasks_url.clone()).json(&body);
        let reply: TaskReply = self.send(request).await?;
        Ok(reply.task)
    }
}
