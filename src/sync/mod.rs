//! This module keeps the list of a presentation surface in sync with the task API
//!
//! Every surface (a web page, a widget, the command line) follows the same contract:
//! * load the day's tasks once, and display them in a stable order (see [`sort_for_view`])
//! * toggle an item optimistically: the change is visible before the server confirms it
//! * in case the server fails, roll the whole list back to what it was before the toggle, and show an error

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::task::TaskMutation;
use crate::traits::TaskApi;

mod state;
pub use state::{sort_for_view, PendingToggle, SyncState, UiItem};

/// What happened to a toggle request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The server confirmed the change
    Confirmed,
    /// The server refused or failed, the list has been rolled back
    RolledBack,
    /// Nothing was done: the item is unknown, or a previous toggle of it is still pending
    Ignored,
}


/// A [`SyncState`] together with the API it mirrors.
///
/// The state is shared, so that a surface can render it while requests are in flight. The lock is never held across
/// a network call.
pub struct SyncSession<A> {
    api: A,
    state: Arc<Mutex<SyncState>>,
}

impl<A: TaskApi> SyncSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Arc::new(Mutex::new(SyncState::new())),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// A handle on the shared state, e.g. for a renderer
    pub fn state(&self) -> Arc<Mutex<SyncState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the current state
    pub fn snapshot(&self) -> SyncState {
        self.lock().clone()
    }

    /// Fetch the tasks due on `date`, replacing whatever was displayed
    pub async fn load(&self, date: &str) {
        self.lock().begin_load();
        let result = self.api.list_tasks(date).await;
        self.lock().finish_load(result);
    }

    /// Toggle the completion status of an item
    pub async fn toggle(&self, id: &str) -> ToggleOutcome {
        let pending = match self.lock().begin_toggle(id) {
            None => return ToggleOutcome::Ignored,
            Some(pending) => pending,
        };

        let mutation = TaskMutation::set_done(pending.done());
        let result = self.api.update_task(id, &mutation).await.map(|_| ());
        let outcome = match result {
            Ok(()) => ToggleOutcome::Confirmed,
            Err(_) => ToggleOutcome::RolledBack,
        };
        self.lock().finish_toggle(pending, result);
        outcome
    }
}
