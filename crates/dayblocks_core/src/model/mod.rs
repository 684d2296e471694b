//! Planner domain model.
//!
//! # Responsibility
//! - Define the persisted records: time blocks, tags, habits, todos, modules.
//! - Keep the camelCase JSON shape used by the key-value store.
//!
//! # Invariants
//! - Every record is identified by a stable string id.
//! - Cross-record references (tags, linked blocks) are weak, by id.

pub mod clock;
pub mod habit;
pub mod module;
pub mod tag;
pub mod time_block;
pub mod todo;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Generates a fresh record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Input validation failures shared by all planner records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title (or habit name) is empty after trimming.
    EmptyTitle,
    /// Duration must be a positive number of minutes.
    NonPositiveDuration,
    /// Form minute field outside `0..60`.
    MinutesOutOfRange(u32),
    /// `addedToTimeline` and `timeBlockId` disagree.
    TimelineLinkMismatch(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::NonPositiveDuration => write!(f, "duration must be greater than zero"),
            Self::MinutesOutOfRange(value) => {
                write!(f, "minutes must be within 0..60, got {value}")
            }
            Self::TimelineLinkMismatch(id) => write!(
                f,
                "todo {id} has inconsistent addedToTimeline/timeBlockId fields"
            ),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

pub(crate) fn validate_duration(duration: u32) -> Result<(), ValidationError> {
    if duration == 0 {
        return Err(ValidationError::NonPositiveDuration);
    }
    Ok(())
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
