//! Time block use-case service.
//!
//! # Responsibility
//! - Create blocks from drafts and from the manual form.
//! - Apply edits, user deletes and drag-to-schedule drops.
//! - Provide the day view for the timeline page.
//!
//! # Invariants
//! - Invalid input (empty title, zero duration) never reaches the store.
//! - Locked blocks reject user deletes and drags; owners remove them through
//!   the crate-internal cascade path.
//! - Out-of-range drops are no-ops, not errors.

use crate::model::clock::ClockTime;
use crate::model::tag::TagId;
use crate::model::time_block::{NewTimeBlock, TimeBlock, TimeBlockPatch};
use crate::model::ValidationError;
use crate::repo::kv_repo::KvRepository;
use crate::service::error::{PlannerError, PlannerResult};
use crate::store::keys::{TagsKey, TimeBlocksKey};
use crate::store::PlannerStore;
use crate::timeline::{build_day_view, snap_start_time, DayView, HourRange};
use chrono::NaiveDate;
use log::{debug, info};

/// Manual "Add Time Block" form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBlockForm {
    pub title: String,
    pub hours: u32,
    /// Must be within `0..60`.
    pub minutes: u32,
    pub tag_ids: Vec<TagId>,
}

impl TimeBlockForm {
    /// Total duration in minutes, validating the minute field.
    pub fn total_minutes(&self) -> Result<u32, ValidationError> {
        if self.minutes >= 60 {
            return Err(ValidationError::MinutesOutOfRange(self.minutes));
        }
        Ok(self.hours.saturating_mul(60).saturating_add(self.minutes))
    }
}

/// Pointer drop on the timeline surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineDrop {
    /// Pixels from the top of the timeline surface.
    pub offset_y: f64,
    /// Rendered surface height in pixels.
    pub surface_height: f64,
    pub range: HourRange,
    /// Day currently shown; written onto the dropped block.
    pub viewed_date: NaiveDate,
}

/// Time block service over an injected planner store.
pub struct TimeBlockService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> TimeBlockService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> &[TimeBlock] {
        self.store.get::<TimeBlocksKey>()
    }

    pub fn get(&self, id: &str) -> Option<&TimeBlock> {
        self.list().iter().find(|block| block.id == id)
    }

    /// Adds a block. A block with a start time but no date is dated `today`.
    pub fn add(&mut self, mut draft: NewTimeBlock, today: NaiveDate) -> PlannerResult<TimeBlock> {
        if draft.start_time.is_some() && draft.date.is_none() {
            draft.date = Some(today);
        }
        let block = TimeBlock::from_draft(draft)?;
        let created = block.clone();
        self.store
            .update::<TimeBlocksKey, _>(|blocks| blocks.push(block))?;

        info!(
            "event=time_block_create module=service status=ok block_id={} duration={} assigned={} locked={}",
            created.id,
            created.duration,
            created.is_assigned(),
            created.locked
        );
        Ok(created)
    }

    /// Adds an unassigned block dated `today` from the manual form.
    pub fn add_from_form(
        &mut self,
        form: &TimeBlockForm,
        today: NaiveDate,
    ) -> PlannerResult<TimeBlock> {
        let duration = form.total_minutes()?;
        self.add(
            NewTimeBlock {
                title: form.title.clone(),
                duration,
                date: Some(today),
                tag_ids: form.tag_ids.clone(),
                ..NewTimeBlock::default()
            },
            today,
        )
    }

    pub fn update(&mut self, id: &str, patch: &TimeBlockPatch) -> PlannerResult<TimeBlock> {
        let updated = self
            .store
            .try_update::<TimeBlocksKey, _, PlannerError>(|blocks| {
                let block = find_mut(blocks, id)?;
                patch.apply(block)?;
                Ok(block.clone())
            })?;
        debug!("event=time_block_update module=service status=ok block_id={id}");
        Ok(updated)
    }

    /// User-initiated delete. Locked blocks are rejected.
    pub fn delete(&mut self, id: &str) -> PlannerResult<()> {
        self.store
            .try_update::<TimeBlocksKey, _, PlannerError>(|blocks| {
                let index = position(blocks, id)?;
                if blocks[index].locked {
                    return Err(PlannerError::Locked(id.to_string()));
                }
                blocks.remove(index);
                Ok(())
            })?;
        info!("event=time_block_delete module=service status=ok block_id={id}");
        Ok(())
    }

    /// Owner-initiated delete that ignores the lock. Returns whether a block
    /// was removed; a missing block is not an error.
    pub(crate) fn remove_owned(&mut self, id: &str) -> PlannerResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        self.store
            .update::<TimeBlocksKey, _>(|blocks| blocks.retain(|block| block.id != id))?;
        info!("event=time_block_delete module=service status=ok block_id={id} cascade=true");
        Ok(true)
    }

    /// Schedules a block at the snapped drop position.
    ///
    /// Returns the new start time, or `Ok(None)` when the position falls
    /// outside the range and nothing changed.
    pub fn drop_at(&mut self, id: &str, drop: TimelineDrop) -> PlannerResult<Option<ClockTime>> {
        let block = self
            .get(id)
            .ok_or_else(|| PlannerError::TimeBlockNotFound(id.to_string()))?;
        if block.locked {
            return Err(PlannerError::Locked(id.to_string()));
        }

        let Some(start_time) = snap_start_time(drop.offset_y, drop.surface_height, drop.range)
        else {
            debug!("event=time_block_drop module=service status=rejected block_id={id} reason=out_of_range");
            return Ok(None);
        };

        self.store
            .try_update::<TimeBlocksKey, _, PlannerError>(|blocks| {
                let block = find_mut(blocks, id)?;
                block.start_time = Some(start_time);
                block.date = Some(drop.viewed_date);
                Ok(())
            })?;
        debug!(
            "event=time_block_drop module=service status=ok block_id={} start_time={}",
            id, start_time
        );
        Ok(Some(start_time))
    }

    pub fn day_view(&self, date: NaiveDate, range: HourRange) -> DayView {
        build_day_view(self.list(), self.store.get::<TagsKey>(), date, range)
    }
}

fn position(blocks: &[TimeBlock], id: &str) -> PlannerResult<usize> {
    blocks
        .iter()
        .position(|block| block.id == id)
        .ok_or_else(|| PlannerError::TimeBlockNotFound(id.to_string()))
}

fn find_mut<'a>(blocks: &'a mut [TimeBlock], id: &str) -> PlannerResult<&'a mut TimeBlock> {
    let index = position(blocks, id)?;
    Ok(&mut blocks[index])
}

#[cfg(test)]
mod tests {
    use super::{TimeBlockForm, TimeBlockService, TimelineDrop};
    use crate::model::clock::ClockTime;
    use crate::model::time_block::NewTimeBlock;
    use crate::model::ValidationError;
    use crate::repo::kv_repo::InMemoryKvRepository;
    use crate::service::error::PlannerError;
    use crate::store::PlannerStore;
    use crate::timeline::HourRange;
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).expect("valid date")
    }

    fn store() -> PlannerStore<InMemoryKvRepository> {
        PlannerStore::load(InMemoryKvRepository::new()).expect("load store")
    }

    fn full_day_drop(offset_y: f64) -> TimelineDrop {
        TimelineDrop {
            offset_y,
            surface_height: 1440.0,
            range: HourRange::FULL_DAY,
            viewed_date: today(),
        }
    }

    #[test]
    fn form_rejects_empty_title_and_zero_total() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);

        let empty_title = TimeBlockForm {
            title: "  ".to_string(),
            hours: 1,
            ..TimeBlockForm::default()
        };
        assert!(matches!(
            service.add_from_form(&empty_title, today()),
            Err(PlannerError::Validation(ValidationError::EmptyTitle))
        ));

        let zero_total = TimeBlockForm {
            title: "Nap".to_string(),
            ..TimeBlockForm::default()
        };
        assert!(matches!(
            service.add_from_form(&zero_total, today()),
            Err(PlannerError::Validation(ValidationError::NonPositiveDuration))
        ));

        let bad_minutes = TimeBlockForm {
            title: "Nap".to_string(),
            minutes: 75,
            ..TimeBlockForm::default()
        };
        assert!(matches!(
            service.add_from_form(&bad_minutes, today()),
            Err(PlannerError::Validation(ValidationError::MinutesOutOfRange(75)))
        ));

        assert!(service.list().is_empty());
    }

    #[test]
    fn form_creates_unassigned_block_dated_today() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add_from_form(
                &TimeBlockForm {
                    title: "Write report".to_string(),
                    hours: 1,
                    minutes: 30,
                    tag_ids: vec!["1".to_string()],
                },
                today(),
            )
            .expect("valid form");
        assert_eq!(block.duration, 90);
        assert_eq!(block.start_time, None);
        assert_eq!(block.date, Some(today()));
        assert_eq!(service.list().len(), 1);
    }

    #[test]
    fn add_with_start_time_defaults_date_to_today() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add(
                NewTimeBlock {
                    start_time: Some(ClockTime::new(7, 0).expect("valid time")),
                    ..NewTimeBlock::new("Breakfast", 20)
                },
                today(),
            )
            .expect("valid block");
        assert_eq!(block.date, Some(today()));
    }

    #[test]
    fn drop_snaps_and_writes_viewed_date() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add(NewTimeBlock::new("Focus", 60), today())
            .expect("valid block");

        let start = service
            .drop_at(&block.id, full_day_drop(608.0))
            .expect("drop succeeds");
        assert_eq!(start, Some(ClockTime::new(10, 15).expect("valid time")));

        let stored = service.get(&block.id).expect("block exists");
        assert_eq!(stored.start_time, start);
        assert_eq!(stored.date, Some(today()));
    }

    #[test]
    fn out_of_range_drop_is_a_no_op() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add(NewTimeBlock::new("Focus", 60), today())
            .expect("valid block");

        assert_eq!(service.drop_at(&block.id, full_day_drop(-20.0)).expect("no-op"), None);
        assert_eq!(service.get(&block.id).expect("exists").start_time, None);
    }

    #[test]
    fn locked_blocks_reject_drag_and_user_delete() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add(
                NewTimeBlock {
                    locked: true,
                    ..NewTimeBlock::new("Owned", 30)
                },
                today(),
            )
            .expect("valid block");

        assert!(matches!(
            service.drop_at(&block.id, full_day_drop(100.0)),
            Err(PlannerError::Locked(_))
        ));
        assert!(matches!(service.delete(&block.id), Err(PlannerError::Locked(_))));
        assert!(service.remove_owned(&block.id).expect("cascade delete"));
        assert!(service.list().is_empty());
        assert!(!service.remove_owned(&block.id).expect("missing is fine"));
    }

    #[test]
    fn unknown_ids_surface_not_found() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        assert!(matches!(
            service.delete("nope"),
            Err(PlannerError::TimeBlockNotFound(_))
        ));
        assert!(matches!(
            service.drop_at("nope", full_day_drop(10.0)),
            Err(PlannerError::TimeBlockNotFound(_))
        ));
    }

    #[test]
    fn huge_form_duration_still_renders_after_drop() {
        let mut store = store();
        let mut service = TimeBlockService::new(&mut store);
        let block = service
            .add_from_form(
                &TimeBlockForm {
                    title: "Sabbatical".to_string(),
                    hours: u32::MAX,
                    ..TimeBlockForm::default()
                },
                today(),
            )
            .expect("valid form");
        assert_eq!(block.duration, u32::MAX);

        service
            .drop_at(&block.id, full_day_drop(600.0))
            .expect("drop succeeds");
        let view = service.day_view(today(), HourRange::FULL_DAY);
        assert_eq!(view.placed.len(), 1);
        assert_eq!(view.placed[0].block.id, block.id);
    }
}
