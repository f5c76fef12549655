//! Support for configuration options
//!
//! Everything is read once from the environment, when the process starts.

use crate::error::{Error, Result};

/// Access token of the hosted database
pub const TOKEN_VAR: &str = "NOTION_TOKEN";
/// Identifier of the database that holds the tasks
pub const DATABASE_ID_VAR: &str = "NOTION_DATABASE_ID";
/// Explicit name of the title field
pub const TITLE_FIELD_VAR: &str = "NOTION_NAME_PROP";
/// Explicit name of the checkbox field. Set it to an empty string to disable toggling
pub const DONE_FIELD_VAR: &str = "NOTION_DONE_PROP";
/// Explicit name of the date field. Set it to an empty string to disable date filtering
pub const DUE_FIELD_VAR: &str = "NOTION_DUE_PROP";
/// Base URL of the hosted database API
pub const API_URL_VAR: &str = "NOTION_API_URL";
/// Address the task API listens on
pub const BIND_VAR: &str = "MINILIST_BIND";

pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";


/// What the deployment says about a single logical field
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOverride {
    /// Nothing configured: discover the field from the database schema
    Discover,
    /// Use this field name verbatim, without checking it exists
    Named(String),
    /// The field is explicitly absent
    Disabled,
}

impl Default for FieldOverride {
    fn default() -> Self {
        FieldOverride::Discover
    }
}

/// Field-name overrides for the three logical fields
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldOverrides {
    /// The title field cannot be disabled: an empty override falls back to discovery
    pub title: Option<String>,
    pub done: FieldOverride,
    pub due: FieldOverride,
}

impl FieldOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let title = lookup(TITLE_FIELD_VAR).filter(|name| name.is_empty() == false);
        let optional = |key: &str| match lookup(key) {
            None => FieldOverride::Discover,
            Some(name) if name.is_empty() => FieldOverride::Disabled,
            Some(name) => FieldOverride::Named(name),
        };

        Self {
            title,
            done: optional(DONE_FIELD_VAR),
            due: optional(DUE_FIELD_VAR),
        }
    }

    /// Whether every logical field is decided without looking at the database schema
    pub fn is_complete(&self) -> bool {
        self.title.is_some()
            && self.done != FieldOverride::Discover
            && self.due != FieldOverride::Discover
    }
}


/// Process-wide settings of the task API
#[derive(Clone, Debug)]
pub struct Settings {
    pub token: String,
    pub database_id: String,
    pub api_url: String,
    pub bind_addr: String,
    pub overrides: FieldOverrides,
}

impl Settings {
    /// Read the settings from the environment.
    ///
    /// Fails with [`Error::Configuration`] in case the token or the database identifier is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| value.is_empty() == false)
                .ok_or_else(|| Error::Configuration(format!("{} missing", key)))
        };
        let token = required(TOKEN_VAR)?;
        let database_id = required(DATABASE_ID_VAR)?;

        Ok(Self {
            token,
            database_id,
            api_url: lookup(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            bind_addr: lookup(BIND_VAR).unwrap_or_else(|| DEFAULT_BIND.to_string()),
            overrides: FieldOverrides::from_lookup(&lookup),
        })
    }
}
