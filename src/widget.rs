//! A home-screen widget surface: a small, periodically refreshed view of today's tasks

use std::fmt::{Display, Error, Formatter};
use std::time::Duration;

use crate::sync::{SyncSession, SyncState, ToggleOutcome, UiItem};
use crate::traits::TaskApi;

/// How often the widget fetches the tasks again
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// How many tasks the widget has room for
pub const MAX_ITEMS: usize = 6;

/// What the widget displays at a given time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WidgetEntry {
    pub date: String,
    pub items: Vec<UiItem>,
}

impl WidgetEntry {
    /// Build an entry out of the current state of a surface. Load errors simply show no tasks
    pub fn from_state(date: &str, state: &SyncState) -> Self {
        Self {
            date: date.to_string(),
            items: state.items().iter().take(MAX_ITEMS).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The widget's toggle action: update the task, then fetch the day's tasks again and build the entry to re-render.
///
/// The item has to be displayed by `session` already, see [`SyncSession::toggle`].
pub async fn toggle_task<A: TaskApi>(session: &SyncSession<A>, date: &str, id: &str) -> (ToggleOutcome, WidgetEntry) {
    let outcome = session.toggle(id).await;
    session.load(date).await;
    (outcome, WidgetEntry::from_state(date, &session.snapshot()))
}


impl Display for WidgetEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        if self.items.is_empty() {
            return writeln!(f, "No tasks today");
        }
        for item in &self.items {
            match item.ui_done {
                true => writeln!(f, "[x] {}", item.title)?,
                false => writeln!(f, "[ ] {}", item.title)?,
            }
        }
        Ok(())
    }
}
