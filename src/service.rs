//! The task service: list, create, update and delete tasks in the external store
//!
//! It keeps no state of its own apart from the memoized [`SchemaMapping`](crate::schema::SchemaMapping).

use std::sync::Arc;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::mapper;
use crate::record::{DateFilter, StoreQuery};
use crate::schema::SchemaResolver;
use crate::task::{Task, TaskMutation};
use crate::traits::TaskStore;
use crate::utils::validate_date;

/// One page of tasks
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}


/// Translates task operations into operations on a [`TaskStore`]
pub struct TaskService<S: ?Sized> {
    resolver: SchemaResolver,
    store: Arc<S>,
}

impl<S> TaskService<S>
where
    S: TaskStore + ?Sized,
{
    pub fn new(store: Arc<S>, resolver: SchemaResolver) -> Self {
        Self { resolver, store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn resolver(&self) -> &SchemaResolver {
        &self.resolver
    }

    /// List the tasks due on `date`.
    ///
    /// Without a date (or when the database has no date field), every task is listed in the store's default order.
    /// A failing store (while describing the database or querying it) yields an empty page rather than an error.
    /// A database without a title field is still an error.
    pub async fn list(&self, date: Option<&str>, cursor: Option<&str>) -> Result<TaskPage> {
        let schema = match self.resolver.resolve(self.store.as_ref()).await {
            Ok(schema) => schema,
            Err(Error::ExternalService(err)) => {
                log::warn!("Unable to discover the database schema ({}). Returning an empty list", err);
                return Ok(TaskPage::default());
            },
            Err(err) => return Err(err),
        };

        let mut query = StoreQuery {
            start_cursor: cursor.map(str::to_string),
            ..StoreQuery::default()
        };
        if let (Some(field), Some(date)) = (&schema.due_field, date.filter(|d| d.is_empty() == false)) {
            query.filter = Some(DateFilter { field: field.clone(), date: date.to_string() });
            query.sort_ascending_by = Some(field.clone());
        }

        let page = match self.store.query(&query).await {
            Ok(page) => page,
            Err(err) => {
                log::warn!("Unable to query tasks ({}). Returning an empty list", err);
                return Ok(TaskPage::default());
            },
        };

        Ok(TaskPage {
            tasks: page.results.iter().map(|record| mapper::to_task(record, schema)).collect(),
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    /// Create a new, uncompleted task
    pub async fn create(&self, title: &str, due: Option<&str>) -> Result<Task> {
        if title.is_empty() {
            return Err(Error::Validation("Title is required".to_string()));
        }
        if let Some(due) = due {
            validate_date(due)?;
        }

        let schema = self.resolver.resolve(self.store.as_ref()).await?;
        let fields = mapper::new_record_fields(title, due, schema);
        let created = self.store.create_record(&fields).await?;
        log::debug!("Created task {}", created.id);
        Ok(mapper::to_task(&created, schema))
    }

    /// Apply a partial change to a task, and return it as it is after the change
    pub async fn update(&self, id: &str, mutation: &TaskMutation) -> Result<Task> {
        if id.is_empty() {
            return Err(Error::Validation("id is required".to_string()));
        }
        if let Some(title) = &mutation.title {
            if title.is_empty() {
                return Err(Error::Validation("Title cannot be empty".to_string()));
            }
        }
        if let Some(Some(due)) = &mutation.due {
            validate_date(due)?;
        }

        let schema = self.resolver.resolve(self.store.as_ref()).await?;
        let fields = mapper::to_external_patch(mutation, schema)?;
        let updated = self.store.update_record(id, &fields).await?;
        Ok(mapper::to_task(&updated, schema))
    }

    /// Archive a task. It disappears from the lists, but stays in the store
    pub async fn delete(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::Validation("id is required".to_string()));
        }
        self.store.archive_record(id).await?;
        log::debug!("Archived task {}", id);
        Ok(())
    }
}
