//! Some utility functions

use chrono::{Local, NaiveDate};

use crate::error::{Error, Result};
use crate::sync::UiItem;
use crate::task::Task;

/// The format of every date exchanged by this crate
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date (`YYYY-MM-DD`), in the local timezone
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Check that `date` is a valid `YYYY-MM-DD` calendar date
pub fn validate_date(date: &str) -> Result<()> {
    match NaiveDate::parse_from_str(date, DATE_FORMAT) {
        Ok(parsed) if parsed.format(DATE_FORMAT).to_string() == date => Ok(()),
        _ => Err(Error::Validation(format!("Invalid date {:?}, expected YYYY-MM-DD", date))),
    }
}

/// A debug utility that pretty-prints a task
pub fn print_task(task: &Task) {
    let completion = if task.done { "✓" } else { " " };
    let due = task.due.as_deref().unwrap_or("-");
    println!("    {} {}\t{}\t{}", completion, task.title, due, task.id);
}

/// A debug utility that pretty-prints the items of a presentation surface
pub fn print_items(items: &[UiItem]) {
    if items.is_empty() {
        println!("No tasks due today.");
    }
    for item in items {
        let completion = if item.ui_done { "✓" } else { " " };
        println!("    {} {}\t{}", completion, item.title, item.id);
    }
}
