//! Discovery of the external database's field layout
//!
//! The task API only knows three logical fields (a title, a completion checkbox and a due date).
//! This module finds which concrete fields of the database play these roles.

use once_cell::sync::OnceCell;

use crate::config::{FieldOverride, FieldOverrides};
use crate::error::{Error, Result};
use crate::record::DatabaseSchema;
use crate::traits::TaskStore;

pub const TITLE_KIND: &str = "title";
pub const CHECKBOX_KIND: &str = "checkbox";
pub const DATE_KIND: &str = "date";

/// Which external fields hold the title, the completion flag and the due date of a task
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaMapping {
    /// Always present: the task API cannot work without a title
    pub title_field: String,
    /// When absent, tasks cannot be toggled
    pub done_field: Option<String>,
    /// When absent, tasks are never filtered by date
    pub due_field: Option<String>,
}

impl SchemaMapping {
    /// Resolve the logical fields from the overrides, looking at `schema` for the ones that are not overridden.
    ///
    /// When several fields share a type, the first one the database declares wins.
    pub fn resolve(overrides: &FieldOverrides, schema: &DatabaseSchema) -> Result<Self> {
        let title_field = match &overrides.title {
            Some(name) => name.clone(),
            None => schema.first_of_kind(TITLE_KIND)
                .map(|field| field.name.clone())
                .ok_or_else(|| Error::Configuration("No title property found in the database.".to_string()))?,
        };

        let optional = |choice: &FieldOverride, kind: &str| match choice {
            FieldOverride::Named(name) => Some(name.clone()),
            FieldOverride::Disabled => None,
            FieldOverride::Discover => schema.first_of_kind(kind).map(|field| field.name.clone()),
        };

        Ok(Self {
            title_field,
            done_field: optional(&overrides.done, CHECKBOX_KIND),
            due_field: optional(&overrides.due, DATE_KIND),
        })
    }
}


/// A memoized [`SchemaMapping`].
///
/// The mapping is resolved on first use and kept for the lifetime of this object, which is
/// usually the lifetime of the process. Schema changes in the database are not picked up until
/// a new resolver is built.
#[derive(Debug, Default)]
pub struct SchemaResolver {
    overrides: FieldOverrides,
    cache: OnceCell<SchemaMapping>,
}

impl SchemaResolver {
    pub fn new(overrides: FieldOverrides) -> Self {
        Self {
            overrides,
            cache: OnceCell::new(),
        }
    }

    /// Returns the cached mapping, if it has been resolved already
    pub fn cached(&self) -> Option<&SchemaMapping> {
        self.cache.get()
    }

    /// Return the schema mapping, or discover it from `store` if not known yet.
    ///
    /// Concurrent first calls may both run a discovery. They come to the same result, and the first one to finish is kept.
    pub async fn resolve<S>(&self, store: &S) -> Result<&SchemaMapping>
    where
        S: TaskStore + ?Sized,
    {
        if let Some(mapping) = self.cache.get() {
            log::trace!("Schema mapping is already cached.");
            return Ok(mapping);
        }

        let schema = if self.overrides.is_complete() {
            log::debug!("Every field is overridden, skipping schema discovery");
            DatabaseSchema::default()
        } else {
            log::debug!("Discovering the database schema...");
            store.describe_database().await?
        };

        let mapping = SchemaMapping::resolve(&self.overrides, &schema)?;
        log::info!("Using title field {:?}, checkbox field {:?}, date field {:?}",
            mapping.title_field, mapping.done_field, mapping.due_field);

        Ok(self.cache.get_or_init(|| mapping))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldDescriptor;

    fn schema(fields: &[(&str, &str)]) -> DatabaseSchema {
        DatabaseSchema::new(fields.iter().map(|(n, k)| FieldDescriptor::new(n, k)).collect())
    }

    #[test]
    fn first_field_of_each_kind() {
        let schema = schema(&[
            ("Tags", "multi_select"),
            ("When", "date"),
            ("Name", "title"),
            ("Done", "checkbox"),
            ("Archived", "checkbox"),
            ("Deadline", "date"),
        ]);
        let mapping = SchemaMapping::resolve(&FieldOverrides::default(), &schema).unwrap();

        assert_eq!(mapping, SchemaMapping {
            title_field: "Name".into(),
            done_field: Some("Done".into()),
            due_field: Some("When".into()),
        });
    }

    #[test]
    fn missing_title_is_fatal() {
        let schema = schema(&[("Done", "checkbox"), ("Notes", "rich_text")]);
        let err = SchemaMapping::resolve(&FieldOverrides::default(), &schema).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn missing_optional_fields_degrade() {
        let schema = schema(&[("Name", "title")]);
        let mapping = SchemaMapping::resolve(&FieldOverrides::default(), &schema).unwrap();
        assert_eq!(mapping.done_field, None);
        assert_eq!(mapping.due_field, None);
    }

    #[test]
    fn overrides_are_used_verbatim() {
        let schema = schema(&[("Name", "title"), ("Done", "checkbox"), ("Due", "date")]);
        let overrides = FieldOverrides {
            title: Some("Does not exist".into()),
            done: FieldOverride::Named("Neither".into()),
            due: FieldOverride::Disabled,
        };
        let mapping = SchemaMapping::resolve(&overrides, &schema).unwrap();
        assert_eq!(mapping, SchemaMapping {
            title_field: "Does not exist".into(),
            done_field: Some("Neither".into()),
            due_field: None,
        });
    }
}
