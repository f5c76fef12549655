//! Tests of the task API over HTTP, backed by an in-memory store

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use minilist::config::FieldOverrides;
use minilist::memory_store::MemoryStore;
use minilist::mock_behaviour::{MockBehaviour, StoreOperation};
use minilist::record::{DatabaseSchema, FieldDescriptor};
use minilist::schema::SchemaResolver;
use minilist::server::{start_server, SharedService};
use minilist::traits::TaskStore;
use minilist::TaskService;

/// Serve the task API on a random port. Returns the URL of `/api/tasks`
async fn serve(store: Arc<MemoryStore>) -> String {
    let _ = env_logger::builder().is_test(true).try_init();

    let service: SharedService = Arc::new(TaskService::new(
        store as Arc<dyn TaskStore>,
        SchemaResolver::new(FieldOverrides::default()),
    ));
    let (addr, _handle) = start_server("127.0.0.1:0", service).await.unwrap();
    format!("http://{}/api/tasks", addr)
}

fn title_only_store() -> MemoryStore {
    MemoryStore::new(DatabaseSchema::new(vec![
        FieldDescriptor::new("Notes", "rich_text"),
        FieldDescriptor::new("Name", "title"),
    ]))
}

async fn create(http: &reqwest::Client, url: &str, body: Value) -> (StatusCode, Value) {
    let res = http.post(url).json(&body).send().await.unwrap();
    (res.status(), res.json().await.unwrap())
}

fn titles(reply: &Value) -> Vec<String> {
    reply["tasks"].as_array().unwrap().iter()
        .map(|task| task["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn create_and_read_back() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store.clone()).await;
    let http = reqwest::Client::new();

    let (status, reply) = create(&http, &url, json!({ "title": "Write blog post", "due": "2025-09-01" })).await;
    assert_eq!(status, StatusCode::CREATED);
    let task = &reply["task"];
    assert_eq!(task["title"], json!("Write blog post"));
    assert_eq!(task["done"], json!(false));
    assert_eq!(task["due"], json!("2025-09-01"));

    // The record in the store maps back to the same task
    let id = task["id"].as_str().unwrap();
    let record = store.get_record(id).await.unwrap();
    assert_eq!(record.properties["Name"]["title"][0]["plain_text"], json!("Write blog post"));
    assert_eq!(record.properties["Done"]["checkbox"], json!(false));
    assert_eq!(record.properties["Due"]["date"]["start"], json!("2025-09-01"));

    let reply: Value = http.get(&url).query(&[("date", "2025-09-01")]).send().await.unwrap().json().await.unwrap();
    assert_eq!(&reply["tasks"][0], task);
}

#[tokio::test]
async fn create_requires_a_title() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store.clone()).await;
    let http = reqwest::Client::new();

    for body in [json!({ "title": "" }), json!({}), json!({ "title": 42 })] {
        let (status, reply) = create(&http, &url, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(reply["error"].is_string());
    }
    assert!(store.records().is_empty());
}

#[tokio::test]
async fn non_string_due_dates_are_ignored() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store).await;
    let http = reqwest::Client::new();

    let (status, reply) = create(&http, &url, json!({ "title": "A", "due": 5 })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["task"]["due"], Value::Null);

    let id = reply["task"]["id"].as_str().unwrap();
    http.patch(&url).json(&json!({ "id": id, "due": "2025-09-01" })).send().await.unwrap();
    let res = http.patch(&url).json(&json!({ "id": id, "due": { "start": "2025-09-02" }, "title": "B" })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["task"]["title"], json!("B"));
    assert_eq!(reply["task"]["due"], json!("2025-09-01"));
}

#[tokio::test]
async fn list_filters_on_the_date_field() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store).await;
    let http = reqwest::Client::new();

    create(&http, &url, json!({ "title": "tomorrow", "due": "2025-09-02" })).await;
    create(&http, &url, json!({ "title": "today", "due": "2025-09-01" })).await;
    create(&http, &url, json!({ "title": "someday" })).await;
    create(&http, &url, json!({ "title": "today too", "due": "2025-09-01" })).await;

    let res = http.get(&url).query(&[("date", "2025-09-01")]).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(titles(&reply), vec!["today", "today too"]);
    assert_eq!(reply["hasMore"], json!(false));
    assert_eq!(reply["nextCursor"], Value::Null);

    let reply: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(titles(&reply), vec!["tomorrow", "today", "someday", "today too"]);
}

#[tokio::test]
async fn list_without_date_field_ignores_the_date() {
    let store = Arc::new(title_only_store());
    let url = serve(store).await;
    let http = reqwest::Client::new();

    create(&http, &url, json!({ "title": "A", "due": "2025-09-02" })).await;
    create(&http, &url, json!({ "title": "B" })).await;

    let reply: Value = http.get(&url).query(&[("date", "2025-09-01")]).send().await.unwrap().json().await.unwrap();
    assert_eq!(titles(&reply), vec!["A", "B"]);
    assert_eq!(reply["tasks"][0]["due"], Value::Null);
}

#[tokio::test]
async fn list_pagination() {
    let store = Arc::new(MemoryStore::with_task_schema().with_page_size(2));
    let url = serve(store).await;
    let http = reqwest::Client::new();
    for title in ["A", "B", "C"] {
        create(&http, &url, json!({ "title": title })).await;
    }

    let first: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(titles(&first), vec!["A", "B"]);
    assert_eq!(first["hasMore"], json!(true));

    let cursor = first["nextCursor"].as_str().unwrap();
    let second: Value = http.get(&url).query(&[("cursor", cursor)]).send().await.unwrap().json().await.unwrap();
    assert_eq!(titles(&second), vec!["C"]);
    assert_eq!(second["hasMore"], json!(false));
}

#[tokio::test]
async fn failing_store_lists_nothing() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store.clone()).await;
    let http = reqwest::Client::new();
    create(&http, &url, json!({ "title": "A" })).await;

    store.set_mock_behaviour(MockBehaviour::fail_now(1));
    let res = http.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["tasks"], json!([]));
}

#[tokio::test]
async fn unreachable_database_lists_nothing() {
    let store = Arc::new(MemoryStore::with_task_schema());
    store.set_mock_behaviour(MockBehaviour::new().with(StoreOperation::DescribeDatabase, 0, 1));
    let url = serve(store).await;

    let res = reqwest::get(&url).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply, json!({ "tasks": [], "nextCursor": null, "hasMore": false }));
}

#[tokio::test]
async fn database_without_title_is_a_server_error() {
    let store = Arc::new(MemoryStore::new(DatabaseSchema::new(vec![FieldDescriptor::new("Done", "checkbox")])));
    let url = serve(store).await;

    let res = reqwest::get(&url).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let reply: Value = res.json().await.unwrap();
    assert!(reply["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn update_tasks() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store).await;
    let http = reqwest::Client::new();
    let (_, reply) = create(&http, &url, json!({ "title": "A", "due": "2025-09-01" })).await;
    let id = reply["task"]["id"].as_str().unwrap().to_string();

    let res = http.patch(&url).json(&json!({ "id": id, "done": true })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let reply: Value = res.json().await.unwrap();
    assert_eq!(reply["task"], json!({ "id": id, "title": "A", "done": true, "due": "2025-09-01" }));

    let reply: Value = http.patch(&url).json(&json!({ "id": id, "due": null, "title": "B" })).send().await.unwrap().json().await.unwrap();
    assert_eq!(reply["task"], json!({ "id": id, "title": "B", "done": true, "due": null }));

    let res = http.patch(&url).json(&json!({ "done": true })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = http.patch(&url).json(&json!({ "id": "does-not-exist", "done": true })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn toggling_needs_a_checkbox_field() {
    let store = Arc::new(title_only_store());
    let url = serve(store).await;
    let http = reqwest::Client::new();
    let (_, reply) = create(&http, &url, json!({ "title": "A" })).await;
    let id = reply["task"]["id"].as_str().unwrap();

    let res = http.patch(&url).json(&json!({ "id": id, "done": true })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let reply: Value = res.json().await.unwrap();
    assert!(reply["error"].as_str().unwrap().contains("checkbox"));
}

#[tokio::test]
async fn delete_archives() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store.clone()).await;
    let http = reqwest::Client::new();
    let (_, reply) = create(&http, &url, json!({ "title": "A" })).await;
    let id = reply["task"]["id"].as_str().unwrap();

    let res = http.delete(&url).json(&json!({ "id": id })).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({ "ok": true }));

    let reply: Value = http.get(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(reply["tasks"], json!([]));

    // Still there, only hidden
    let record = store.get_record(id).await.unwrap();
    assert!(record.archived);

    let res = http.delete(&url).json(&json!({})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn schema_is_discovered_once() {
    let store = Arc::new(MemoryStore::with_task_schema());
    let url = serve(store.clone()).await;
    let http = reqwest::Client::new();

    create(&http, &url, json!({ "title": "A" })).await;
    http.get(&url).send().await.unwrap();
    http.get(&url).query(&[("date", "2025-09-01")]).send().await.unwrap();

    assert_eq!(store.describe_calls(), 1);
}
