//! Timer session owner.
//!
//! # Responsibility
//! - Hold the active [`TimerEngine`] and its one-second interval.
//! - Record every finished session as a time block.
//!
//! # Invariants
//! - An interval exists only while the engine is running.
//! - Pausing, resetting, completing, cancelling or dropping the controller
//!   releases the interval.

use super::engine::{
    CompletedSession, PomodoroPhase, TimerConfig, TimerEngine, TimerError, TimerMode, TimerStatus,
};
use super::ticker::{IntervalGuard, TickScheduler};
use crate::model::time_block::TimeBlock;
use crate::repo::kv_repo::KvRepository;
use crate::service::error::PlannerResult;
use crate::service::time_block_service::TimeBlockService;
use crate::store::PlannerStore;
use chrono::{Duration, NaiveDateTime};
use log::info;

/// Read-only view of the active session for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub status: TimerStatus,
    pub title: String,
    pub phase: Option<PomodoroPhase>,
    pub completed_pomodoros: u32,
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    /// `MM:SS` label.
    pub display: String,
}

#[derive(Debug, Default)]
pub struct TimerController {
    scheduler: TickScheduler,
    engine: Option<TimerEngine>,
    interval: Option<IntervalGuard>,
}

impl TimerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn status(&self) -> Option<TimerStatus> {
        self.engine.as_ref().map(TimerEngine::status)
    }

    /// Starts a new session, replacing any previous one.
    pub fn start(&mut self, config: TimerConfig, now: NaiveDateTime) -> Result<(), TimerError> {
        let mut engine = TimerEngine::new(config)?;
        self.interval = None;
        engine.start(now)?;
        info!(
            "event=timer_start module=timer status=ok mode={}",
            engine.mode().as_str()
        );
        self.engine = Some(engine);
        self.start_interval(now);
        Ok(())
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Result<(), TimerError> {
        self.engine_mut()?.pause(now)?;
        self.interval = None;
        Ok(())
    }

    pub fn resume(&mut self, now: NaiveDateTime) -> Result<(), TimerError> {
        self.engine_mut()?.resume(now)?;
        self.start_interval(now);
        Ok(())
    }

    pub fn reset(&mut self) -> Result<(), TimerError> {
        self.engine_mut()?.reset();
        self.interval = None;
        Ok(())
    }

    /// Drops the session without recording anything.
    pub fn cancel(&mut self) {
        self.interval = None;
        if self.engine.take().is_some() {
            info!("event=timer_cancel module=timer status=ok");
        }
    }

    /// Feeds due ticks into the engine and records finished sessions.
    pub fn poll<R: KvRepository>(
        &mut self,
        store: &mut PlannerStore<R>,
        now: NaiveDateTime,
    ) -> PlannerResult<Vec<TimeBlock>> {
        let (Some(engine), Some(interval)) = (self.engine.as_mut(), self.interval.as_ref()) else {
            return Ok(Vec::new());
        };

        let mut finished = Vec::new();
        for due in interval.take_due(now) {
            if let Some(session) = engine.tick(due) {
                finished.push(session);
            }
            if !engine.is_running() {
                break;
            }
        }
        if !engine.is_running() {
            self.interval = None;
        }
        record_all(store, finished)
    }

    /// Ends the session early; only a stopwatch produces a block.
    pub fn finish<R: KvRepository>(
        &mut self,
        store: &mut PlannerStore<R>,
        now: NaiveDateTime,
    ) -> PlannerResult<Option<TimeBlock>> {
        let session = self.engine_mut()?.finish(now)?;
        self.interval = None;
        let mut recorded = record_all(store, session.into_iter().collect())?;
        Ok(recorded.pop())
    }

    pub fn snapshot(&self, now: NaiveDateTime) -> Option<TimerSnapshot> {
        let engine = self.engine.as_ref()?;
        Some(TimerSnapshot {
            mode: engine.mode(),
            status: engine.status(),
            title: engine.config().title.clone(),
            phase: (engine.mode() == TimerMode::Pomodoro).then(|| engine.phase()),
            completed_pomodoros: engine.completed_pomodoros(),
            remaining_seconds: engine.remaining_seconds(),
            elapsed_seconds: engine.elapsed_seconds(now),
            display: engine.display(now),
        })
    }

    fn engine_mut(&mut self) -> Result<&mut TimerEngine, TimerError> {
        self.engine.as_mut().ok_or(TimerError::NoSession)
    }

    fn start_interval(&mut self, now: NaiveDateTime) {
        self.interval = Some(self.scheduler.start_interval(Duration::seconds(1), now));
    }
}

fn record_all<R: KvRepository>(
    store: &mut PlannerStore<R>,
    sessions: Vec<CompletedSession>,
) -> PlannerResult<Vec<TimeBlock>> {
    let mut blocks = TimeBlockService::new(store);
    let mut recorded = Vec::with_capacity(sessions.len());
    for session in sessions {
        let block = blocks.add(session.to_draft(), session.start.date())?;
        info!(
            "event=timer_record module=timer status=ok block_id={} duration={} phase={}",
            block.id,
            block.duration,
            session.phase.map_or("none", PomodoroPhase::as_str)
        );
        recorded.push(block);
    }
    Ok(recorded)
}
