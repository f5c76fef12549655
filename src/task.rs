//! To-do tasks, as seen by the task API and its clients

use serde::{Deserialize, Deserializer, Serialize};

/// A to-do task
///
/// This is the stable shape exchanged over the task API, whatever the field names of the
/// underlying database are.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// The identifier of the external record. It never changes once the task is created
    pub id: String,
    /// The display name of the task
    pub title: String,
    /// Whether the task has been completed
    #[serde(default)]
    pub done: bool,
    /// The day this task is due (`YYYY-MM-DD`), if any
    #[serde(default)]
    pub due: Option<String>,
}

impl Task {
    pub fn new(id: String, title: String, done: bool, due: Option<String>) -> Self {
        Self { id, title, done, due }
    }
}

/// A partial change to apply to a task.
///
/// Fields left to `None` are left untouched. `due` has three states: untouched (`None`),
/// cleared (`Some(None)`), or set (`Some(Some(date))`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMutation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_present", skip_serializing_if = "Option::is_none")]
    pub due: Option<Option<String>>,
}

impl TaskMutation {
    /// A mutation that only sets the completion flag
    pub fn set_done(done: bool) -> Self {
        Self { done: Some(done), ..Self::default() }
    }

    /// A mutation that only renames the task
    pub fn rename(title: String) -> Self {
        Self { title: Some(title), ..Self::default() }
    }

    /// A mutation that only changes (or clears, with `None`) the due date
    pub fn set_due(due: Option<String>) -> Self {
        Self { due: Some(due), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.done.is_none() && self.due.is_none()
    }
}

/// Tells a JSON `null` apart from an absent key: a present key (even `null`) becomes `Some(_)`.
/// Absent keys are handled by `#[serde(default)]`.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_has_three_states() {
        let untouched: TaskMutation = serde_json::from_str(r#"{"done": true}"#).unwrap();
        assert_eq!(untouched.due, None);
        assert_eq!(untouched.done, Some(true));

        let cleared: TaskMutation = serde_json::from_str(r#"{"due": null}"#).unwrap();
        assert_eq!(cleared.due, Some(None));

        let set: TaskMutation = serde_json::from_str(r#"{"due": "2025-09-01"}"#).unwrap();
        assert_eq!(set.due, Some(Some("2025-09-01".to_string())));
    }

    #[test]
    fn cleared_due_is_sent_as_null() {
        let json = serde_json::to_value(&TaskMutation::set_due(None)).unwrap();
        assert_eq!(json, serde_json::json!({ "due": null }));

        let json = serde_json::to_value(&TaskMutation::set_done(false)).unwrap();
        assert_eq!(json, serde_json::json!({ "done": false }));
    }

    #[test]
    fn task_json_shape() {
        let task = Task::new("abc".into(), "Write blog post".into(), false, None);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json, serde_json::json!({
            "id": "abc", "title": "Write blog post", "done": false, "due": null
        }));
    }
}
