//! Daily habit records.
//!
//! A habit is a standing activity at a fixed time of day. Completing it
//! materializes a time block for today and links it through `time_block_id`.

use super::clock::ClockTime;
use super::tag::TagId;
use super::time_block::TimeBlockId;
use super::{new_id, validate_duration, validate_title, ValidationError};
use serde::{Deserialize, Serialize};

pub type HabitId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    pub time: ClockTime,
    /// Minutes.
    pub duration: u32,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    /// Daily completion flag, cleared by reset.
    #[serde(default)]
    pub completed: bool,
    /// Block created by the current completion, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_block_id: Option<TimeBlockId>,
}

impl Habit {
    pub fn from_draft(draft: HabitDraft) -> Result<Self, ValidationError> {
        draft.validate()?;
        Ok(Self {
            id: new_id(),
            name: draft.name.trim().to_string(),
            time: draft.time,
            duration: draft.duration,
            tag_ids: draft.tag_ids,
            completed: false,
            time_block_id: None,
        })
    }

    /// Overwrites the editable fields, keeping identity and completion state.
    pub fn apply_draft(&mut self, draft: HabitDraft) -> Result<(), ValidationError> {
        draft.validate()?;
        self.name = draft.name.trim().to_string();
        self.time = draft.time;
        self.duration = draft.duration;
        self.tag_ids = draft.tag_ids;
        Ok(())
    }
}

/// Form input for creating or editing a habit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitDraft {
    pub name: String,
    pub time: ClockTime,
    pub duration: u32,
    pub tag_ids: Vec<TagId>,
}

impl HabitDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_title(&self.name)?;
        validate_duration(self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::{Habit, HabitDraft};
    use crate::model::clock::ClockTime;
    use crate::model::ValidationError;

    fn draft(name: &str, duration: u32) -> HabitDraft {
        HabitDraft {
            name: name.to_string(),
            time: ClockTime::new(8, 0).expect("valid time"),
            duration,
            tag_ids: vec!["3".to_string()],
        }
    }

    #[test]
    fn from_draft_starts_uncompleted() {
        let habit = Habit::from_draft(draft(" Stretch ", 20)).expect("valid");
        assert_eq!(habit.name, "Stretch");
        assert!(!habit.completed);
        assert_eq!(habit.time_block_id, None);
    }

    #[test]
    fn apply_draft_validates_before_writing() {
        let mut habit = Habit::from_draft(draft("Read", 30)).expect("valid");
        let err = habit.apply_draft(draft("", 30)).expect_err("empty name");
        assert_eq!(err, ValidationError::EmptyTitle);
        assert_eq!(habit.name, "Read");
    }

    #[test]
    fn reads_records_without_link_field() {
        let habit: Habit = serde_json::from_str(
            r#"{"id":"h1","name":"Run","time":"06:30","duration":40,"tagIds":["3"],"completed":true}"#,
        )
        .expect("deserialize");
        assert!(habit.completed);
        assert_eq!(habit.time.to_string(), "06:30");
        assert_eq!(habit.time_block_id, None);
    }
}
