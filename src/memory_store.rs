//! This module provides an in-process external store
//!
//! It behaves like the hosted database as far as this crate is concerned (same record JSON, archived records, paginated
//! queries), which makes it a test double for the whole stack, and a backend for local demos.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::mock_behaviour::{MockBehaviour, StoreOperation};
use crate::record::{DatabaseSchema, ExternalRecord, FieldDescriptor, FieldSet, FieldValue, QueryPage, StoreQuery};
use crate::schema::{CHECKBOX_KIND, DATE_KIND, TITLE_KIND};
use crate::traits::TaskStore;

/// How many records a query returns at most, unless told otherwise
pub const DEFAULT_PAGE_SIZE: usize = 100;


/// A [`TaskStore`] that keeps its records in memory
#[derive(Debug)]
pub struct MemoryStore {
    schema: DatabaseSchema,
    page_size: usize,
    describe_calls: AtomicUsize,
    data: Mutex<StoreData>,
}

#[derive(Debug, Default)]
struct StoreData {
    /// Records, in creation order (the store's default ordering)
    records: Vec<ExternalRecord>,
    behaviour: MockBehaviour,
}

impl MemoryStore {
    /// Create an empty store with the given field layout
    pub fn new(schema: DatabaseSchema) -> Self {
        Self {
            schema,
            page_size: DEFAULT_PAGE_SIZE,
            describe_calls: AtomicUsize::new(0),
            data: Mutex::new(StoreData::default()),
        }
    }

    /// Create an empty store with a typical task database layout: `Name` (title), `Done` (checkbox), `Due` (date)
    pub fn with_task_schema() -> Self {
        Self::new(DatabaseSchema::new(vec![
            FieldDescriptor::new("Name", TITLE_KIND),
            FieldDescriptor::new("Done", CHECKBOX_KIND),
            FieldDescriptor::new("Due", DATE_KIND),
        ]))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn schema(&self) -> &DatabaseSchema {
        &self.schema
    }

    /// How many times the database has been described so far
    pub fn describe_calls(&self) -> usize {
        self.describe_calls.load(Ordering::SeqCst)
    }

    pub fn set_mock_behaviour(&self, behaviour: MockBehaviour) {
        self.lock().behaviour = behaviour;
    }

    /// Add a record, bypassing the mock behaviour
    pub fn insert(&self, fields: &FieldSet) -> Result<ExternalRecord> {
        let record = self.build_record(fields)?;
        self.lock().records.push(record.clone());
        Ok(record)
    }

    /// Every record, archived or not, in creation order
    pub fn records(&self) -> Vec<ExternalRecord> {
        self.lock().records.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build_record(&self, fields: &FieldSet) -> Result<ExternalRecord> {
        let mut properties = Map::new();
        for field in &self.schema.fields {
            properties.insert(field.name.clone(), empty_property(&field.kind));
        }
        let mut record = ExternalRecord {
            id: uuid::Uuid::new_v4().to_string(),
            archived: false,
            properties,
        };
        self.apply_fields(&mut record, fields)?;
        Ok(record)
    }

    /// Write `fields` on `record`. Nothing is written if any of them is invalid
    fn apply_fields(&self, record: &mut ExternalRecord, fields: &FieldSet) -> Result<()> {
        let mut properties = record.properties.clone();
        for (name, value) in fields.iter() {
            let descr = self.schema.fields.iter()
                .find(|field| &field.name == name)
                .ok_or_else(|| Error::ExternalService(format!("{} is not a property that exists.", name)))?;
            properties.insert(name.clone(), stored_property(&descr.kind, name, value)?);
        }
        record.properties = properties;
        Ok(())
    }
}

fn find_record<'a>(records: &'a mut [ExternalRecord], id: &str) -> Result<&'a mut ExternalRecord> {
    records.iter_mut()
        .find(|record| record.id == id)
        .ok_or_else(|| Error::ExternalService(format!("Could not find page with ID: {}.", id)))
}

/// The value a freshly created record holds for a field of the given type
fn empty_property(kind: &str) -> Value {
    match kind {
        TITLE_KIND => json!({ "type": TITLE_KIND, "title": [] }),
        CHECKBOX_KIND => json!({ "type": CHECKBOX_KIND, "checkbox": false }),
        DATE_KIND => json!({ "type": DATE_KIND, "date": null }),
        "rich_text" => json!({ "type": "rich_text", "rich_text": [] }),
        other => json!({ "type": other }),
    }
}

/// The value the store reports after writing `value` in a field of the given type
fn stored_property(kind: &str, name: &str, value: &FieldValue) -> Result<Value> {
    let stored = match (kind, value) {
        (TITLE_KIND, FieldValue::Title(content)) => json!({
            "type": TITLE_KIND,
            "title": [{
                "type": "text",
                "text": { "content": content, "link": null },
                "plain_text": content,
            }],
        }),
        (CHECKBOX_KIND, FieldValue::Checkbox(checked)) => json!({ "type": CHECKBOX_KIND, "checkbox": checked }),
        (DATE_KIND, FieldValue::Date(Some(start))) => json!({ "type": DATE_KIND, "date": { "start": start, "end": null } }),
        (DATE_KIND, FieldValue::Date(None)) => json!({ "type": DATE_KIND, "date": null }),
        (kind, _) => return Err(Error::ExternalService(format!("{} is expected to be {}.", name, kind))),
    };
    Ok(stored)
}

fn date_start<'a>(record: &'a ExternalRecord, field: &str) -> Option<&'a str> {
    record.property(field)?
        .get("date")?
        .get("start")?
        .as_str()
}


#[async_trait]
impl TaskStore for MemoryStore {
    async fn describe_database(&self) -> Result<DatabaseSchema> {
        self.lock().behaviour.check(StoreOperation::DescribeDatabase)?;
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.schema.clone())
    }

    async fn query(&self, query: &StoreQuery) -> Result<QueryPage> {
        let mut data = self.lock();
        data.behaviour.check(StoreOperation::Query)?;

        let mut matching: Vec<&ExternalRecord> = data.records.iter()
            .filter(|record| record.archived == false)
            .filter(|record| match &query.filter {
                None => true,
                Some(filter) => date_start(record, &filter.field) == Some(filter.date.as_str()),
            })
            .collect();

        if let Some(field) = &query.sort_ascending_by {
            // Stable: records with the same date keep their creation order. Empty dates go last
            matching.sort_by_key(|record| {
                let start = date_start(record, field);
                (start.is_none(), start.map(str::to_string))
            });
        }

        let start = match &query.start_cursor {
            None => 0,
            Some(cursor) => matching.iter()
                .position(|record| &record.id == cursor)
                .ok_or_else(|| Error::ExternalService(format!("The start_cursor provided is invalid: {}", cursor)))?,
        };
        let end = (start + self.page_size).min(matching.len());
        let next_cursor = matching.get(end).map(|record| record.id.clone());

        Ok(QueryPage {
            results: matching[start..end].iter().map(|record| (*record).clone()).collect(),
            has_more: next_cursor.is_some(),
            next_cursor,
        })
    }

    async fn create_record(&self, fields: &FieldSet) -> Result<ExternalRecord> {
        self.lock().behaviour.check(StoreOperation::CreateRecord)?;
        let record = self.build_record(fields)?;
        self.lock().records.push(record.clone());
        Ok(record)
    }

    async fn update_record(&self, id: &str, fields: &FieldSet) -> Result<ExternalRecord> {
        let mut data = self.lock();
        data.behaviour.check(StoreOperation::UpdateRecord)?;

        let record = find_record(&mut data.records, id)?;
        if record.archived {
            return Err(Error::ExternalService("Can't edit block that is archived. You must unarchive the block before editing.".to_string()));
        }
        self.apply_fields(record, fields)?;
        Ok(record.clone())
    }

    async fn archive_record(&self, id: &str) -> Result<()> {
        let mut data = self.lock();
        data.behaviour.check(StoreOperation::ArchiveRecord)?;

        let record = find_record(&mut data.records, id)?;
        record.archived = true;
        Ok(())
    }

    async fn get_record(&self, id: &str) -> Result<ExternalRecord> {
        let mut data = self.lock();
        data.behaviour.check(StoreOperation::GetRecord)?;

        find_record(&mut data.records, id).map(|record| record.clone())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DateFilter;

    fn task_fields(title: &str, due: Option<&str>) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.insert("Name", FieldValue::Title(title.to_string()));
        if let Some(due) = due {
            fields.insert("Due", FieldValue::Date(Some(due.to_string())));
        }
        fields
    }

    fn titles(page: &QueryPage) -> Vec<String> {
        page.results.iter()
            .map(|record| record.properties["Name"]["title"][0]["plain_text"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn new_records_hold_every_field() {
        let store = MemoryStore::with_task_schema();
        let record = store.create_record(&task_fields("A", None)).await.unwrap();

        assert_eq!(record.properties["Done"], json!({ "type": "checkbox", "checkbox": false }));
        assert_eq!(record.properties["Due"], json!({ "type": "date", "date": null }));
        assert_eq!(record.properties["Name"]["title"][0]["plain_text"], json!("A"));
    }

    #[tokio::test]
    async fn unknown_or_mistyped_fields_are_rejected() {
        let store = MemoryStore::with_task_schema();

        let mut fields = FieldSet::new();
        fields.insert("Nope", FieldValue::Checkbox(true));
        assert!(store.create_record(&fields).await.is_err());

        let mut fields = FieldSet::new();
        fields.insert("Name", FieldValue::Checkbox(true));
        assert!(store.create_record(&fields).await.is_err());

        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn filter_sort_and_paginate() {
        let store = MemoryStore::with_task_schema().with_page_size(2);
        store.insert(&task_fields("late", Some("2025-09-03"))).unwrap();
        store.insert(&task_fields("today 1", Some("2025-09-01"))).unwrap();
        store.insert(&task_fields("undated", None)).unwrap();
        store.insert(&task_fields("today 2", Some("2025-09-01"))).unwrap();
        store.insert(&task_fields("today 3", Some("2025-09-01"))).unwrap();

        let query = StoreQuery {
            filter: Some(DateFilter { field: "Due".into(), date: "2025-09-01".into() }),
            sort_ascending_by: Some("Due".into()),
            start_cursor: None,
        };
        let first = store.query(&query).await.unwrap();
        assert_eq!(titles(&first), vec!["today 1", "today 2"]);
        assert!(first.has_more);

        let query = StoreQuery { start_cursor: first.next_cursor.clone(), ..query };
        let second = store.query(&query).await.unwrap();
        assert_eq!(titles(&second), vec!["today 3"]);
        assert!(second.has_more == false);
        assert_eq!(second.next_cursor, None);

    }

    #[tokio::test]
    async fn default_ordering_is_creation_order() {
        let store = MemoryStore::with_task_schema();
        store.insert(&task_fields("b", Some("2025-09-02"))).unwrap();
        store.insert(&task_fields("none", None)).unwrap();
        store.insert(&task_fields("a", Some("2025-09-01"))).unwrap();

        let page = store.query(&StoreQuery::default()).await.unwrap();
        assert_eq!(titles(&page), vec!["b", "none", "a"]);

        let sorted = StoreQuery { sort_ascending_by: Some("Due".into()), ..StoreQuery::default() };
        let page = store.query(&sorted).await.unwrap();
        assert_eq!(titles(&page), vec!["a", "b", "none"]);
    }

    #[tokio::test]
    async fn archived_records_are_hidden_but_kept() {
        let store = MemoryStore::with_task_schema();
        let record = store.insert(&task_fields("A", None)).unwrap();

        store.archive_record(&record.id).await.unwrap();
        assert!(store.query(&StoreQuery::default()).await.unwrap().results.is_empty());

        let found = store.get_record(&record.id).await.unwrap();
        assert!(found.archived);
        assert!(store.update_record(&record.id, &task_fields("B", None)).await.is_err());
    }

    #[tokio::test]
    async fn mocked_failures() {
        let store = MemoryStore::with_task_schema();
        store.set_mock_behaviour(MockBehaviour::new().with(StoreOperation::DescribeDatabase, 1, 1));

        assert!(store.describe_database().await.is_ok());
        assert!(store.describe_database().await.is_err());
        assert!(store.describe_database().await.is_ok());
        assert_eq!(store.describe_calls(), 2);
    }
}
