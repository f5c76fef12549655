//! The local view of a presentation surface, and how it follows optimistic changes

use std::collections::HashSet;

use crate::error::Error;
use crate::task::Task;

/// A task, as displayed by a presentation surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiItem {
    pub id: String,
    pub title: String,
    /// What the surface currently shows, which may be ahead of the server
    pub ui_done: bool,
    /// Position of this item when it was fetched. Used to keep the display order stable
    pub order: usize,
}

/// Sort items for display: uncompleted items first, then completed ones, both in fetch order
pub fn sort_for_view(items: &mut [UiItem]) {
    items.sort_by_key(|item| (item.ui_done, item.order));
}


/// A toggle that has been shown to the user but not confirmed by the server yet
#[derive(Clone, Debug)]
pub struct PendingToggle {
    id: String,
    done: bool,
    /// The whole list, as it was right before the toggle
    snapshot: Vec<UiItem>,
    /// The load the snapshot was taken from
    generation: u64,
}

impl PendingToggle {
    pub fn id(&self) -> &str { &self.id }
    /// The completion status the server should end up with
    pub fn done(&self) -> bool { self.done }
}


/// What a presentation surface displays
#[derive(Clone, Debug, Default)]
pub struct SyncState {
    items: Vec<UiItem>,
    loading: bool,
    error: Option<String>,
    in_flight: HashSet<String>,
    /// Bumped on every completed load
    generation: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[UiItem]      { &self.items }
    pub fn is_loading(&self) -> bool      { self.loading }
    pub fn error(&self) -> Option<&str>   { self.error.as_deref() }

    /// Whether a toggle of this item is waiting for the server. Surfaces should disable the item meanwhile
    pub fn is_pending(&self, id: &str) -> bool {
        self.in_flight.contains(id)
    }

    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Replace the items with freshly fetched tasks, or show the error and no items at all
    pub fn finish_load(&mut self, result: Result<Vec<Task>, Error>) {
        match result {
            Ok(tasks) => {
                let mut items: Vec<UiItem> = tasks.into_iter()
                    .enumerate()
                    .map(|(order, task)| UiItem {
                        id: task.id,
                        title: task.title,
                        ui_done: task.done,
                        order,
                    })
                    .collect();
                sort_for_view(&mut items);
                self.items = items;
            },
            Err(err) => {
                log::warn!("Unable to load tasks: {}", err);
                self.items.clear();
                self.error = Some(err.to_string());
            },
        }
        // Pending toggles stay pending: their item must not be toggled again until they settle
        self.generation += 1;
        self.loading = false;
    }

    /// Flip an item and re-sort right away, before the server knows about it.
    ///
    /// Returns `None` (and changes nothing) if the item is unknown, or if a previous toggle of it is still pending.
    pub fn begin_toggle(&mut self, id: &str) -> Option<PendingToggle> {
        if self.in_flight.contains(id) {
            log::debug!("Ignoring a toggle of {}, a previous one is still pending", id);
            return None;
        }
        let snapshot = self.items.clone();
        let item = self.items.iter_mut().find(|item| item.id == id)?;

        item.ui_done = !item.ui_done;
        let done = item.ui_done;
        sort_for_view(&mut self.items);
        self.in_flight.insert(id.to_string());

        Some(PendingToggle { id: id.to_string(), done, snapshot, generation: self.generation })
    }

    /// Settle a toggle. On failure, the whole list goes back to what it was right before the toggle.
    ///
    /// If the list has been reloaded meanwhile, the reloaded list is kept: it already reflects what the server has.
    pub fn finish_toggle(&mut self, pending: PendingToggle, result: Result<(), Error>) {
        self.in_flight.remove(&pending.id);
        if let Err(err) = result {
            if pending.generation == self.generation {
                log::warn!("Unable to toggle {}: {}. Rolling back", pending.id, err);
                self.items = pending.snapshot;
            } else {
                log::warn!("Unable to toggle {}: {}. The list has been reloaded since", pending.id, err);
            }
            self.error = Some(err.to_string());
        }
    }
}
