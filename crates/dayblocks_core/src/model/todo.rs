//! To-do records and their timeline link.
//!
//! # Invariants
//! - `added_to_timeline == true` exactly when `time_block_id` is set.
//! - The linked block is owned by the todo: unscheduling or deleting the todo
//!   deletes that block too.

use super::clock::ClockTime;
use super::tag::TagId;
use super::time_block::TimeBlockId;
use super::{new_id, validate_duration, validate_title, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TodoId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    /// Minutes.
    pub duration: u32,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<ClockTime>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub added_to_timeline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_block_id: Option<TimeBlockId>,
}

impl Todo {
    pub fn from_draft(draft: TodoDraft) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: new_id(),
            title: draft.title.trim().to_string(),
            duration: draft.duration,
            tag_ids: draft.tag_ids,
            due_date: draft.due_date,
            due_time: draft.due_time,
            completed: false,
            added_to_timeline: false,
            time_block_id: None,
        })
    }

    pub fn apply_draft(&mut self, draft: TodoDraft) -> Result<(), ValidationError> {
        draft.validate()?;
        self.title = draft.title.trim().to_string();
        self.duration = draft.duration;
        self.tag_ids = draft.tag_ids;
        self.due_date = draft.due_date;
        self.due_time = draft.due_time;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_duration(self.duration)?;
        if self.added_to_timeline != self.time_block_id.is_some() {
            return Err(ValidationError::TimelineLinkMismatch(self.id.clone()));
        }
        Ok(())
    }

    pub fn link_block(&mut self, block_id: TimeBlockId) {
        self.added_to_timeline = true;
        self.time_block_id = Some(block_id);
    }

    /// Clears the link and returns the block id that was linked.
    pub fn unlink_block(&mut self) -> Option<TimeBlockId> {
        self.added_to_timeline = false;
        self.time_block_id.take()
    }
}

/// Form input for creating or editing a todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub duration: u32,
    pub tag_ids: Vec<TagId>,
    pub due_date: Option<NaiveDate>,
    pub due_time: Option<ClockTime>,
}

impl TodoDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_duration(self.duration)
    }
}
