//! Time block domain model.
//!
//! # Responsibility
//! - Define the scheduled/unscheduled activity record shown on the timeline.
//! - Provide draft validation and partial-update helpers.
//!
//! # Invariants
//! - `title` is non-empty after trimming and `duration > 0` minutes.
//! - A block without `start_time` is "unassigned" and never laid out.
//! - `locked` blocks are owned by another record (a todo) and are not
//!   user-draggable or user-deletable.

use super::clock::ClockTime;
use super::tag::TagId;
use super::{is_false, new_id, validate_duration, validate_title, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type TimeBlockId = String;

/// Scheduled or unscheduled activity with a duration in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlock {
    pub id: TimeBlockId,
    pub title: String,
    /// Minutes, always positive for valid blocks.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    /// Overrides the tag-derived display color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub locked: bool,
}

impl TimeBlock {
    /// Builds a block with a fresh id from a validated draft.
    pub fn from_draft(draft: NewTimeBlock) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: new_id(),
            title: draft.title.trim().to_string(),
            duration: draft.duration,
            start_time: draft.start_time,
            date: draft.date,
            tag_ids: draft.tag_ids,
            color: draft.color,
            locked: draft.locked,
        })
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_duration(self.duration)
    }

    pub fn is_assigned(&self) -> bool {
        self.start_time.is_some()
    }

    /// Exclusive end in minutes since midnight, when placed.
    pub fn end_minutes(&self) -> Option<u32> {
        self.start_time
            .map(|start| start.minutes_since_midnight().saturating_add(self.duration))
    }
}

/// Creation input for a time block (everything but the id).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTimeBlock {
    pub title: String,
    pub duration: u32,
    pub start_time: Option<ClockTime>,
    pub date: Option<NaiveDate>,
    pub tag_ids: Vec<TagId>,
    pub color: Option<String>,
    pub locked: bool,
}

impl NewTimeBlock {
    pub fn new(title: impl Into<String>, duration: u32) -> Self {
        Self {
            title: title.into(),
            duration,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.title)?;
        validate_duration(self.duration)
    }
}

/// Partial update for a time block.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears optional fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBlockPatch {
    pub title: Option<String>,
    pub duration: Option<u32>,
    pub start_time: Option<Option<ClockTime>>,
    pub date: Option<Option<NaiveDate>>,
    pub tag_ids: Option<Vec<TagId>>,
    pub color: Option<Option<String>>,
    pub locked: Option<bool>,
}

impl TimeBlockPatch {
    /// Applies the patch, validating the result before writing into `block`.
    pub fn apply(&self, block: &mut TimeBlock) -> Result<(), ValidationError> {
        let mut next = block.clone();
        if let Some(title) = &self.title {
            next.title = title.trim().to_string();
        }
        if let Some(duration) = self.duration {
            next.duration = duration;
        }
        if let Some(start_time) = self.start_time {
            next.start_time = start_time;
        }
        if let Some(date) = self.date {
            next.date = date;
        }
        if let Some(tag_ids) = &self.tag_ids {
            next.tag_ids = tag_ids.clone();
        }
        if let Some(color) = &self.color {
            next.color = color.clone();
        }
        if let Some(locked) = self.locked {
            next.locked = locked;
        }
        next.validate()?;
        *block = next;
        Ok(())
    }
}
