use async_trait::async_trait;

use crate::error::Result;
use crate::record::{DatabaseSchema, ExternalRecord, FieldSet, QueryPage, StoreQuery};
use crate::task::{Task, TaskMutation};

/// The external database that acts as the system of record for tasks
///
/// The production implementation is [`NotionClient`](crate::client::NotionClient);
/// [`MemoryStore`](crate::memory_store::MemoryStore) is an in-process stand-in.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns the field layout of the database, in the store's own order
    async fn describe_database(&self) -> Result<DatabaseSchema>;
    /// Returns one page of the non-archived records matching `query`
    async fn query(&self, query: &StoreQuery) -> Result<QueryPage>;
    /// Creates a record with the given fields
    async fn create_record(&self, fields: &FieldSet) -> Result<ExternalRecord>;
    /// Writes the given fields on an existing record. Other fields are left untouched
    async fn update_record(&self, id: &str, fields: &FieldSet) -> Result<ExternalRecord>;
    /// Hides a record from queries, without removing it
    async fn archive_record(&self, id: &str) -> Result<()>;
    /// Looks a record up by id, whether it is archived or not
    async fn get_record(&self, id: &str) -> Result<ExternalRecord>;
}

/// The task API, as seen by a presentation surface (a web page, a widget...)
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Returns the tasks that are due on `date` (`YYYY-MM-DD`)
    async fn list_tasks(&self, date: &str) -> Result<Vec<Task>>;
    /// Applies a partial change to a task, and returns the updated task
    async fn update_task(&self, id: &str, mutation: &TaskMutation) -> Result<Task>;
}
