//! The HTTP surface of the task API
//!
//! | Route | Body | Success |
//! |---|---|---|
//! | `GET /api/tasks?date=YYYY-MM-DD&cursor=…` | | `200 {tasks, nextCursor, hasMore}` |
//! | `POST /api/tasks` | `{title, due?}` | `201 {task}` |
//! | `PATCH /api/tasks` | `{id, title?, done?, due?}` | `200 {task}` |
//! | `DELETE /api/tasks` | `{id}` | `200 {ok: true}` |
//!
//! Caller errors are answered with `400 {error}`, everything else with `500 {error}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::service::{TaskPage, TaskService};
use crate::task::TaskMutation;
use crate::traits::TaskStore;

/// The service shared by every request handler
pub type SharedService = Arc<TaskService<dyn TaskStore>>;

pub const TASKS_PATH: &str = "/api/tasks";

#[derive(Deserialize)]
struct ListParams {
    date: Option<String>,
    cursor: Option<String>,
}

#[derive(Deserialize)]
struct CreateBody {
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    due: Option<String>,
}

#[derive(Deserialize)]
struct UpdateBody {
    id: Option<String>,
    title: Option<String>,
    done: Option<bool>,
    #[serde(default, deserialize_with = "lenient_date_change")]
    due: Option<Option<String>>,
}

#[derive(Deserialize)]
struct DeleteBody {
    id: Option<String>,
}

/// A `due` that is not a string is ignored, as if it was absent
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_date_change(deserializer)?.flatten())
}

/// Same as [`lenient_date`], but a `null` clears the date
fn lenient_date_change<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::String(date) => Ok(Some(Some(date))),
        other => {
            log::debug!("Ignoring a due date that is not a string: {}", other);
            Ok(None)
        },
    }
}


impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_caller_error() {
            StatusCode::BAD_REQUEST
        } else {
            log::warn!("Request failed: {}", self);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Unwrap a JSON body, turning malformed ones into validation errors
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}

/// Build the task API routes
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route(TASKS_PATH, get(list_tasks).post(create_task).patch(update_task).delete(delete_task))
        .with_state(service)
}

/// Start serving the task API on `addr` in a background task.
///
/// Returns the bound address (useful when binding port `0`) and the handle of the server task.
pub async fn start_server(addr: &str, service: SharedService) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    let app = router(service);

    let handle = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            log::error!("Task API server error: {}", err);
        }
    });

    Ok((bound_addr, handle))
}


async fn list_tasks(
    State(service): State<SharedService>,
    Query(params): Query<ListParams>,
) -> Result<Json<TaskPage>> {
    log::debug!("Listing tasks for {:?}", params.date);
    let page = service.list(params.date.as_deref(), params.cursor.as_deref()).await?;
    Ok(Json(page))
}

async fn create_task(
    State(service): State<SharedService>,
    payload: std::result::Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let CreateBody { title, due } = body(payload)?;
    let title = title.ok_or_else(|| Error::Validation("Title is required".to_string()))?;

    let task = service.create(&title, due.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(json!({ "task": task }))))
}

async fn update_task(
    State(service): State<SharedService>,
    payload: std::result::Result<Json<UpdateBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let UpdateBody { id, title, done, due } = body(payload)?;
    let id = id.ok_or_else(|| Error::Validation("id is required".to_string()))?;

    let task = service.update(&id, &TaskMutation { title, done, due }).await?;
    Ok(Json(json!({ "task": task })))
}

async fn delete_task(
    State(service): State<SharedService>,
    payload: std::result::Result<Json<DeleteBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let DeleteBody { id } = body(payload)?;
    let id = id.ok_or_else(|| Error::Validation("id is required".to_string()))?;

    service.delete(&id).await?;
    Ok(Json(json!({ "ok": true })))
}
