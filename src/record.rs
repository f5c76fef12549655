//! Records, as stored by the external database
//!
//! These types mirror the JSON the hosted database exchanges. Record properties are kept as raw
//! JSON, since the database supports many more property kinds than the three this crate reads.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};

/// A record (a database "page") as returned by the external store
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub id: String,
    /// Archived records are hidden from queries but can still be looked up by id
    #[serde(default)]
    pub archived: bool,
    /// Property name -> property value, in the store's own JSON shape
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl ExternalRecord {
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// The declared type of a database field, e.g. `title`, `checkbox`, `date`, `rich_text`...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: String,
}

impl FieldDescriptor {
    pub fn new<S: ToString, T: ToString>(name: S, kind: T) -> Self {
        Self { name: name.to_string(), kind: kind.to_string() }
    }
}

/// The field layout of the external database, in the order the store reports it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub fields: Vec<FieldDescriptor>,
}

impl DatabaseSchema {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields }
    }

    /// Returns the first field (in declaration order) whose type is `kind`
    pub fn first_of_kind(&self, kind: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.kind == kind)
    }

    /// Build a schema from the `properties` object of a database description.
    /// Keys are kept in document order.
    pub fn from_properties(properties: &Map<String, Value>) -> Self {
        let fields = properties.iter()
            .map(|(name, descr)| {
                let kind = descr.get("type").and_then(Value::as_str).unwrap_or_default();
                FieldDescriptor::new(name, kind)
            })
            .collect();
        Self { fields }
    }
}


/// A value to write into a single external field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    Title(String),
    Checkbox(bool),
    /// A `YYYY-MM-DD` date, or `None` to clear the field
    Date(Option<String>),
}

impl FieldValue {
    /// The JSON the external store expects when writing this value
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Title(content) => json!({ "title": [{ "text": { "content": content } }] }),
            FieldValue::Checkbox(checked) => json!({ "checkbox": checked }),
            FieldValue::Date(Some(start)) => json!({ "date": { "start": start } }),
            FieldValue::Date(None) => json!({ "date": Value::Null }),
        }
    }
}

/// A set of external fields to write. Fields that are not in the set are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<S: ToString>(&mut self, field: S, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize     { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

impl Serialize for FieldSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, &value.to_json())?;
        }
        map.end()
    }
}


/// Restricts a query to records whose date field is exactly `date`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFilter {
    pub field: String,
    pub date: String,
}

/// A query on the external database
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreQuery {
    pub filter: Option<DateFilter>,
    /// Sort ascending by this field. `None` keeps the store's default ordering
    pub sort_ascending_by: Option<String>,
    /// Where to resume a paginated query
    pub start_cursor: Option<String>,
}

impl StoreQuery {
    /// The JSON body of a query request
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".into(), json!({
                "property": filter.field,
                "date": { "equals": filter.date },
            }));
        }
        if let Some(field) = &self.sort_ascending_by {
            body.insert("sorts".into(), json!([{ "property": field, "direction": "ascending" }]));
        }
        if let Some(cursor) = &self.start_cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }
        Value::Object(body)
    }
}

/// One page of query results
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct QueryPage {
    pub results: Vec<ExternalRecord>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}
