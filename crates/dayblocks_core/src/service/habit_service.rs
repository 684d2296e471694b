//! Habit tracker use-cases.
//!
//! # Responsibility
//! - Habit CRUD.
//! - Promote a completed habit into a time block for today.
//!
//! # Invariants
//! - A completed habit links the block its completion created.
//! - `reset_all` clears flags and links but keeps the blocks on the timeline.

use crate::model::habit::{Habit, HabitDraft};
use crate::model::time_block::{NewTimeBlock, TimeBlock};
use crate::repo::kv_repo::KvRepository;
use crate::service::error::{PlannerError, PlannerResult};
use crate::service::time_block_service::TimeBlockService;
use crate::store::keys::HabitsKey;
use crate::store::PlannerStore;
use chrono::NaiveDate;
use log::info;

pub struct HabitService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> HabitService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> &[Habit] {
        self.store.get::<HabitsKey>()
    }

    pub fn get(&self, id: &str) -> Option<&Habit> {
        self.list().iter().find(|habit| habit.id == id)
    }

    pub fn add(&mut self, draft: HabitDraft) -> PlannerResult<Habit> {
        let habit = Habit::from_draft(draft)?;
        let created = habit.clone();
        self.store.update::<HabitsKey, _>(|habits| habits.push(habit))?;
        info!(
            "event=habit_create module=service status=ok habit_id={} duration={}",
            created.id, created.duration
        );
        Ok(created)
    }

    pub fn edit(&mut self, id: &str, draft: HabitDraft) -> PlannerResult<Habit> {
        self.store.try_update::<HabitsKey, _, PlannerError>(|habits| {
            let habit = find_mut(habits, id)?;
            habit.apply_draft(draft)?;
            Ok(habit.clone())
        })
    }

    /// Removes the habit. Blocks created by earlier completions stay.
    pub fn delete(&mut self, id: &str) -> PlannerResult<()> {
        self.store.try_update::<HabitsKey, _, PlannerError>(|habits| {
            let index = position(habits, id)?;
            habits.remove(index);
            Ok(())
        })?;
        info!("event=habit_delete module=service status=ok habit_id={id}");
        Ok(())
    }

    /// Marks the habit done and schedules it at its time on `today`.
    pub fn complete(&mut self, id: &str, today: NaiveDate) -> PlannerResult<TimeBlock> {
        let habit = self
            .get(id)
            .cloned()
            .ok_or_else(|| PlannerError::HabitNotFound(id.to_string()))?;
        if habit.completed {
            return Err(PlannerError::HabitAlreadyCompleted(id.to_string()));
        }

        let block = TimeBlockService::new(&mut *self.store).add(
            NewTimeBlock {
                start_time: Some(habit.time),
                date: Some(today),
                tag_ids: habit.tag_ids.clone(),
                ..NewTimeBlock::new(habit.name.clone(), habit.duration)
            },
            today,
        )?;

        let block_id = block.id.clone();
        self.store.try_update::<HabitsKey, _, PlannerError>(|habits| {
            let habit = find_mut(habits, id)?;
            habit.completed = true;
            habit.time_block_id = Some(block_id);
            Ok(())
        })?;
        info!(
            "event=habit_complete module=service status=ok habit_id={} block_id={}",
            id, block.id
        );
        Ok(block)
    }

    /// Reverts a completion and deletes the block it created.
    pub fn uncomplete(&mut self, id: &str) -> PlannerResult<()> {
        let habit = self
            .get(id)
            .ok_or_else(|| PlannerError::HabitNotFound(id.to_string()))?;
        if !habit.completed {
            return Err(PlannerError::HabitNotCompleted(id.to_string()));
        }
        if let Some(block_id) = habit.time_block_id.clone() {
            TimeBlockService::new(&mut *self.store).remove_owned(&block_id)?;
        }

        self.store.try_update::<HabitsKey, _, PlannerError>(|habits| {
            let habit = find_mut(habits, id)?;
            habit.completed = false;
            habit.time_block_id = None;
            Ok(())
        })?;
        info!("event=habit_uncomplete module=service status=ok habit_id={id}");
        Ok(())
    }

    /// Starts a new day: every habit becomes uncompleted. Returns how many
    /// habits were reset.
    pub fn reset_all(&mut self) -> PlannerResult<usize> {
        let reset = self.store.update::<HabitsKey, _>(|habits| {
            let mut reset = 0;
            for habit in habits.iter_mut().filter(|habit| habit.completed) {
                habit.completed = false;
                habit.time_block_id = None;
                reset += 1;
            }
            reset
        })?;
        info!("event=habit_reset module=service status=ok reset={reset}");
        Ok(reset)
    }
}

fn position(habits: &[Habit], id: &str) -> PlannerResult<usize> {
    habits
        .iter()
        .position(|habit| habit.id == id)
        .ok_or_else(|| PlannerError::HabitNotFound(id.to_string()))
}

fn find_mut<'a>(habits: &'a mut [Habit], id: &str) -> PlannerResult<&'a mut Habit> {
    let index = position(habits, id)?;
    Ok(&mut habits[index])
}
