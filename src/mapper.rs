//! Conversions between external records and [`Task`]s

use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::{ExternalRecord, FieldSet, FieldValue};
use crate::schema::SchemaMapping;
use crate::task::{Task, TaskMutation};

/// Build a [`Task`] out of an external record. This never fails: missing or mistyped values
/// fall back to an empty title, an uncompleted task, and no due date.
pub fn to_task(record: &ExternalRecord, schema: &SchemaMapping) -> Task {
    let title = record.property(&schema.title_field)
        .and_then(|prop| first_plain_text(prop, "title").or_else(|| first_plain_text(prop, "rich_text")))
        .unwrap_or_default();

    let done = schema.done_field.as_ref()
        .and_then(|field| record.property(field))
        .and_then(|prop| prop.get("checkbox"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let due = schema.due_field.as_ref()
        .and_then(|field| record.property(field))
        .and_then(|prop| prop.get("date"))
        .and_then(|date| date.get("start"))
        .and_then(Value::as_str)
        .map(str::to_string);

    Task::new(record.id.clone(), title, done, due)
}

/// `prop[container][0].plain_text`
fn first_plain_text(prop: &Value, container: &str) -> Option<String> {
    prop.get(container)?
        .get(0)?
        .get("plain_text")?
        .as_str()
        .map(str::to_string)
}

/// Build the external fields to write for a partial change.
///
/// Only the requested fields are written. Changing the completion flag while the database has no checkbox field
/// is an [`Error::UnsupportedOperation`]. Due date changes are dropped when the database has no date field.
pub fn to_external_patch(mutation: &TaskMutation, schema: &SchemaMapping) -> Result<FieldSet> {
    let mut fields = FieldSet::new();

    if let Some(title) = &mutation.title {
        fields.insert(&schema.title_field, FieldValue::Title(title.clone()));
    }

    if let Some(done) = mutation.done {
        match &schema.done_field {
            None => return Err(Error::UnsupportedOperation("No checkbox property found in your database.".to_string())),
            Some(field) => fields.insert(field, FieldValue::Checkbox(done)),
        }
    }

    if let Some(due) = &mutation.due {
        match &schema.due_field {
            None => log::debug!("Ignoring a due date change, since the database has no date property"),
            Some(field) => fields.insert(field, FieldValue::Date(due.clone())),
        }
    }

    Ok(fields)
}

/// Build the external fields of a brand new task. It is not completed, and has a due date only if `due` is given
/// and the database supports it
pub fn new_record_fields(title: &str, due: Option<&str>, schema: &SchemaMapping) -> FieldSet {
    let mut fields = FieldSet::new();
    fields.insert(&schema.title_field, FieldValue::Title(title.to_string()));
    if let Some(field) = &schema.done_field {
        fields.insert(field, FieldValue::Checkbox(false));
    }
    if let (Some(field), Some(due)) = (&schema.due_field, due) {
        fields.insert(field, FieldValue::Date(Some(due.to_string())));
    }
    fields
}
