// Task entity and creation-time validation

use crate::error::{Result, StoreError};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// A single to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub deadline: NaiveDate,
}

/// Deadline years outside this range do not format as plain `YYYY-MM-DD`,
/// which would break ordering of the stored text.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Check the inputs of a create call before anything is written.
pub fn validate(description: &str, deadline: NaiveDate) -> Result<()> {
    if description.trim().is_empty() {
        return Err(StoreError::validation("description cannot be empty"));
    }

    let year = deadline.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(StoreError::validation(format!(
            "deadline {} out of range (years {}..={})",
            deadline, MIN_YEAR, MAX_YEAR
        )));
    }

    Ok(())
}
