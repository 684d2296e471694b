//! To-do list use-cases.
//!
//! # Responsibility
//! - Todo CRUD.
//! - Schedule a todo as a locked time block and keep the link consistent.
//!
//! # Invariants
//! - `added_to_timeline` is true exactly when the linked block exists.
//! - The block is written before the todo links it, and unlinked only after
//!   it is gone.

use crate::model::time_block::{NewTimeBlock, TimeBlock, TimeBlockPatch};
use crate::model::todo::{Todo, TodoDraft};
use crate::repo::kv_repo::KvRepository;
use crate::service::error::{PlannerError, PlannerResult};
use crate::service::time_block_service::TimeBlockService;
use crate::store::keys::{TimeBlocksKey, TodosKey};
use crate::store::PlannerStore;
use chrono::NaiveDate;
use log::{info, warn};

pub struct TodoService<'s, R: KvRepository> {
    store: &'s mut PlannerStore<R>,
}

impl<'s, R: KvRepository> TodoService<'s, R> {
    pub fn new(store: &'s mut PlannerStore<R>) -> Self {
        Self { store }
    }

    pub fn list(&self) -> &[Todo] {
        self.store.get::<TodosKey>()
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.list().iter().find(|todo| todo.id == id)
    }

    pub fn add(&mut self, draft: TodoDraft) -> PlannerResult<Todo> {
        let todo = Todo::from_draft(draft)?;
        let created = todo.clone();
        self.store.update::<TodosKey, _>(|todos| todos.push(todo))?;
        info!(
            "event=todo_create module=service status=ok todo_id={} duration={}",
            created.id, created.duration
        );
        Ok(created)
    }

    /// Edits the todo. A scheduled todo pushes title, duration and tags onto
    /// its block; the block keeps its position.
    pub fn edit(&mut self, id: &str, draft: TodoDraft) -> PlannerResult<Todo> {
        let updated = self.store.try_update::<TodosKey, _, PlannerError>(|todos| {
            let todo = find_mut(todos, id)?;
            todo.apply_draft(draft)?;
            Ok(todo.clone())
        })?;

        if let Some(block_id) = updated.time_block_id.as_deref() {
            let patch = TimeBlockPatch {
                title: Some(updated.title.clone()),
                duration: Some(updated.duration),
                tag_ids: Some(updated.tag_ids.clone()),
                ..TimeBlockPatch::default()
            };
            match TimeBlockService::new(&mut *self.store).update(block_id, &patch) {
                Ok(_) => {}
                Err(PlannerError::TimeBlockNotFound(_)) => {
                    warn!(
                        "event=todo_edit module=service status=degraded todo_id={} block_id={} reason=missing_block",
                        id, block_id
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Ok(updated)
    }

    /// Deletes the todo together with its scheduled block.
    pub fn delete(&mut self, id: &str) -> PlannerResult<()> {
        let todo = self
            .get(id)
            .ok_or_else(|| PlannerError::TodoNotFound(id.to_string()))?;
        if let Some(block_id) = todo.time_block_id.clone() {
            TimeBlockService::new(&mut *self.store).remove_owned(&block_id)?;
        }
        self.store.try_update::<TodosKey, _, PlannerError>(|todos| {
            let index = position(todos, id)?;
            todos.remove(index);
            Ok(())
        })?;
        info!("event=todo_delete module=service status=ok todo_id={id}");
        Ok(())
    }

    /// Puts the todo on the timeline as a locked block at its due time, on its
    /// due date or `today`.
    pub fn add_to_timeline(&mut self, id: &str, today: NaiveDate) -> PlannerResult<TimeBlock> {
        let todo = self
            .get(id)
            .cloned()
            .ok_or_else(|| PlannerError::TodoNotFound(id.to_string()))?;
        if todo.added_to_timeline {
            return Err(PlannerError::TodoAlreadyScheduled(id.to_string()));
        }

        let block = TimeBlockService::new(&mut *self.store).add(
            NewTimeBlock {
                start_time: todo.due_time,
                date: Some(todo.due_date.unwrap_or(today)),
                tag_ids: todo.tag_ids.clone(),
                locked: true,
                ..NewTimeBlock::new(todo.title.clone(), todo.duration)
            },
            today,
        )?;

        let block_id = block.id.clone();
        self.store.try_update::<TodosKey, _, PlannerError>(|todos| {
            find_mut(todos, id)?.link_block(block_id);
            Ok(())
        })?;
        info!(
            "event=todo_schedule module=service status=ok todo_id={} block_id={}",
            id, block.id
        );
        Ok(block)
    }

    pub fn remove_from_timeline(&mut self, id: &str) -> PlannerResult<()> {
        let todo = self
            .get(id)
            .ok_or_else(|| PlannerError::TodoNotFound(id.to_string()))?;
        let Some(block_id) = todo.time_block_id.clone() else {
            return Err(PlannerError::TodoNotScheduled(id.to_string()));
        };

        TimeBlockService::new(&mut *self.store).remove_owned(&block_id)?;
        self.store.try_update::<TodosKey, _, PlannerError>(|todos| {
            find_mut(todos, id)?.unlink_block();
            Ok(())
        })?;
        info!(
            "event=todo_unschedule module=service status=ok todo_id={} block_id={}",
            id, block_id
        );
        Ok(())
    }

    /// Sets the completion flag. The scheduled block, if any, stays.
    pub fn set_completed(&mut self, id: &str, completed: bool) -> PlannerResult<Todo> {
        self.store.try_update::<TodosKey, _, PlannerError>(|todos| {
            let todo = find_mut(todos, id)?;
            todo.completed = completed;
            Ok(todo.clone())
        })
    }

    /// Clears links whose block no longer exists. Returns the number of todos
    /// repaired; nothing is written when every link is live.
    pub fn reconcile_links(&mut self) -> PlannerResult<usize> {
        let blocks = self.store.get::<TimeBlocksKey>();
        let is_dangling = |todo: &Todo| {
            todo.added_to_timeline != todo.time_block_id.is_some()
                || todo
                    .time_block_id
                    .as_deref()
                    .is_some_and(|block_id| !blocks.iter().any(|block| block.id == block_id))
        };
        let dangling: Vec<String> = self
            .list()
            .iter()
            .filter(|todo| is_dangling(todo))
            .map(|todo| todo.id.clone())
            .collect();
        if dangling.is_empty() {
            return Ok(0);
        }

        self.store.update::<TodosKey, _>(|todos| {
            for todo in todos.iter_mut().filter(|todo| dangling.contains(&todo.id)) {
                todo.unlink_block();
            }
        })?;
        warn!(
            "event=todo_reconcile module=service status=ok repaired={}",
            dangling.len()
        );
        Ok(dangling.len())
    }
}

fn position(todos: &[Todo], id: &str) -> PlannerResult<usize> {
    todos
        .iter()
        .position(|todo| todo.id == id)
        .ok_or_else(|| PlannerError::TodoNotFound(id.to_string()))
}

fn find_mut<'a>(todos: &'a mut [Todo], id: &str) -> PlannerResult<&'a mut Todo> {
    let index = position(todos, id)?;
    Ok(&mut todos[index])
}
