//! This crate serves "today's tasks" out of a database of a hosted document-database service.
//!
//! The database is used as an ad-hoc task store: the [`schema`] module discovers which of its fields hold the title,
//! the completion flag and the due date of a task, and the [`mapper`] module translates between its records and
//! [`Task`]s. \
//! The [`service`] module exposes list/create/update/delete operations on top of any [`TaskStore`](traits::TaskStore),
//! either the hosted service itself ([`client::NotionClient`]) or an in-process [`memory_store::MemoryStore`]. \
//! The [`server`] module serves these operations over HTTP.
//!
//! On the other end, presentation surfaces talk to this HTTP API with an [`api_client::ApiClient`], and keep their
//! display in sync (with optimistic updates and rollbacks) with the [`sync`] module.

pub mod error;
pub use error::{Error, Result};
pub mod config;
pub mod traits;

mod task;
pub use task::{Task, TaskMutation};
pub mod record;
pub mod schema;
pub mod mapper;

pub mod client;
pub mod memory_store;
pub mod mock_behaviour;

pub mod service;
pub use service::TaskService;
pub mod server;

pub mod api_client;
pub mod sync;
pub mod widget;

pub mod utils;
