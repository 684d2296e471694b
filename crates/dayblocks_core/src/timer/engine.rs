//! Timer session state machine.
//!
//! `Idle -> Running <-> Paused -> Completed`, with `reset` returning to `Idle`
//! from any state. Countdown and pomodoro phases count down one second per
//! tick; the stopwatch measures wall-clock time so missed ticks cannot make
//! it drift.

use crate::format::format_countdown;
use crate::model::clock::ClockTime;
use crate::model::tag::TagId;
use crate::model::time_block::NewTimeBlock;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const DEFAULT_LONG_BREAK_EVERY: u32 = 4;
pub const DEFAULT_COUNTDOWN_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMode {
    Countdown,
    Stopwatch,
    Pomodoro,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Countdown => "countdown",
            Self::Stopwatch => "stopwatch",
            Self::Pomodoro => "pomodoro",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "countdown" | "timer" => Some(Self::Countdown),
            "stopwatch" => Some(Self::Stopwatch),
            "pomodoro" => Some(Self::Pomodoro),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
    Completed,
}

impl TimerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl Display for TimerStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PomodoroPhase {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl PomodoroPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::ShortBreak => "shortBreak",
            Self::LongBreak => "longBreak",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Self::Work)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroSettings {
    pub work_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
    /// A long break follows every n-th completed work phase.
    pub long_break_every: u32,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
            long_break_every: DEFAULT_LONG_BREAK_EVERY,
        }
    }
}

impl PomodoroSettings {
    pub fn minutes_for(&self, phase: PomodoroPhase) -> u32 {
        match phase {
            PomodoroPhase::Work => self.work_minutes,
            PomodoroPhase::ShortBreak => self.short_break_minutes,
            PomodoroPhase::LongBreak => self.long_break_minutes,
        }
    }

    /// Phase following a completed work phase.
    pub fn break_after(&self, completed_pomodoros: u32) -> PomodoroPhase {
        if self.long_break_every > 0 && completed_pomodoros % self.long_break_every == 0 {
            PomodoroPhase::LongBreak
        } else {
            PomodoroPhase::ShortBreak
        }
    }
}

/// Session setup chosen in the timer widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    pub mode: TimerMode,
    pub title: String,
    pub tag_ids: Vec<TagId>,
    pub countdown_minutes: u32,
    pub pomodoro: PomodoroSettings,
}

impl TimerConfig {
    pub fn new(mode: TimerMode, title: impl Into<String>) -> Self {
        Self {
            mode,
            title: title.into(),
            tag_ids: Vec::new(),
            countdown_minutes: DEFAULT_COUNTDOWN_MINUTES,
            pomodoro: PomodoroSettings::default(),
        }
    }

    pub fn validate(&self) -> Result<(), TimerError> {
        if self.title.trim().is_empty() {
            return Err(TimerError::EmptyTitle);
        }
        let durations_ok = match self.mode {
            TimerMode::Stopwatch => true,
            TimerMode::Countdown => self.countdown_minutes > 0,
            TimerMode::Pomodoro => {
                self.pomodoro.work_minutes > 0
                    && self.pomodoro.short_break_minutes > 0
                    && self.pomodoro.long_break_minutes > 0
            }
        };
        if !durations_ok {
            return Err(TimerError::NonPositiveDuration);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    EmptyTitle,
    NonPositiveDuration,
    /// No session has been started.
    NoSession,
    InvalidTransition {
        from: TimerStatus,
        action: &'static str,
    },
}

impl Display for TimerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "timer title must not be empty"),
            Self::NonPositiveDuration => write!(f, "timer durations must be greater than zero"),
            Self::NoSession => write!(f, "no timer session is active"),
            Self::InvalidTransition { from, action } => {
                write!(f, "cannot {action} a timer that is {from}")
            }
        }
    }
}

impl Error for TimerError {}

/// A finished session ready to be recorded on the timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub title: String,
    pub duration_minutes: u32,
    /// Wall-clock start of the (last resumed) run.
    pub start: NaiveDateTime,
    pub tag_ids: Vec<TagId>,
    /// Pomodoro phase that finished; `None` for countdown and stopwatch.
    pub phase: Option<PomodoroPhase>,
}

impl CompletedSession {
    pub fn to_draft(&self) -> NewTimeBlock {
        NewTimeBlock {
            start_time: Some(ClockTime::from_naive_time(self.start.time())),
            date: Some(self.start.date()),
            tag_ids: self.tag_ids.clone(),
            ..NewTimeBlock::new(self.title.clone(), self.duration_minutes)
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: TimerConfig,
    status: TimerStatus,
    phase: PomodoroPhase,
    completed_pomodoros: u32,
    remaining_seconds: u64,
    /// Stopwatch time banked by earlier runs.
    accumulated_seconds: u64,
    run_started_at: Option<NaiveDateTime>,
    session_started_at: Option<NaiveDateTime>,
}

impl TimerEngine {
    pub fn new(config: TimerConfig) -> Result<Self, TimerError> {
        config.validate()?;
        let mut engine = Self {
            config,
            status: TimerStatus::Idle,
            phase: PomodoroPhase::Work,
            completed_pomodoros: 0,
            remaining_seconds: 0,
            accumulated_seconds: 0,
            run_started_at: None,
            session_started_at: None,
        };
        engine.remaining_seconds = engine.phase_seconds();
        Ok(engine)
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn mode(&self) -> TimerMode {
        self.config.mode
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn phase(&self) -> PomodoroPhase {
        self.phase
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn start(&mut self, now: NaiveDateTime) -> Result<(), TimerError> {
        self.expect_status(TimerStatus::Idle, "start")?;
        self.status = TimerStatus::Running;
        self.run_started_at = Some(now);
        self.session_started_at = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: NaiveDateTime) -> Result<(), TimerError> {
        self.expect_status(TimerStatus::Running, "pause")?;
        self.accumulated_seconds = self.stopwatch_seconds(now);
        self.run_started_at = None;
        self.status = TimerStatus::Paused;
        Ok(())
    }

    /// Continues a paused session. The recorded start moves to `now`.
    pub fn resume(&mut self, now: NaiveDateTime) -> Result<(), TimerError> {
        self.expect_status(TimerStatus::Paused, "resume")?;
        self.status = TimerStatus::Running;
        self.run_started_at = Some(now);
        self.session_started_at = Some(now);
        Ok(())
    }

    /// Back to `Idle` with the full duration of the current mode and phase.
    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.accumulated_seconds = 0;
        self.run_started_at = None;
        self.session_started_at = None;
        self.remaining_seconds = self.phase_seconds();
    }

    /// Advances one second. Returns the session that finished on this tick.
    pub fn tick(&mut self, now: NaiveDateTime) -> Option<CompletedSession> {
        if self.status != TimerStatus::Running || self.config.mode == TimerMode::Stopwatch {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return None;
        }

        match self.config.mode {
            TimerMode::Countdown => {
                let title = self.config.title.clone();
                let session = self.session(title, self.config.countdown_minutes, None, now);
                self.status = TimerStatus::Completed;
                self.run_started_at = None;
                Some(session)
            }
            TimerMode::Pomodoro => Some(self.advance_phase(now)),
            TimerMode::Stopwatch => None,
        }
    }

    /// Ends the session early.
    ///
    /// A stopwatch is recorded rounded up to whole minutes (at least one).
    /// Countdown and pomodoro sessions stop without recording anything.
    pub fn finish(&mut self, now: NaiveDateTime) -> Result<Option<CompletedSession>, TimerError> {
        if !matches!(self.status, TimerStatus::Running | TimerStatus::Paused) {
            return Err(TimerError::InvalidTransition {
                from: self.status,
                action: "finish",
            });
        }
        if self.config.mode != TimerMode::Stopwatch {
            self.reset();
            return Ok(None);
        }

        let elapsed = self.stopwatch_seconds(now);
        let minutes = u32::try_from(elapsed.div_ceil(60)).unwrap_or(u32::MAX).max(1);
        let session = self.session(self.config.title.clone(), minutes, None, now);
        self.accumulated_seconds = elapsed;
        self.run_started_at = None;
        self.status = TimerStatus::Completed;
        Ok(Some(session))
    }

    /// Seconds elapsed in the current session or phase.
    pub fn elapsed_seconds(&self, now: NaiveDateTime) -> u64 {
        match self.config.mode {
            TimerMode::Stopwatch => self.stopwatch_seconds(now),
            _ => self.phase_seconds().saturating_sub(self.remaining_seconds),
        }
    }

    /// `MM:SS` label: elapsed for the stopwatch, remaining otherwise.
    pub fn display(&self, now: NaiveDateTime) -> String {
        match self.config.mode {
            TimerMode::Stopwatch => format_countdown(self.stopwatch_seconds(now)),
            _ => format_countdown(self.remaining_seconds),
        }
    }

    fn advance_phase(&mut self, now: NaiveDateTime) -> CompletedSession {
        let finished = self.phase;
        let minutes = self.config.pomodoro.minutes_for(finished);
        let title = if finished.is_break() {
            format!("{} (Break)", self.config.title)
        } else {
            format!("{} (Work)", self.config.title)
        };
        let session = self.session(title, minutes, Some(finished), now);

        self.phase = if finished.is_break() {
            PomodoroPhase::Work
        } else {
            self.completed_pomodoros += 1;
            self.config.pomodoro.break_after(self.completed_pomodoros)
        };
        self.remaining_seconds = self.phase_seconds();
        self.run_started_at = Some(now);
        self.session_started_at = Some(now);
        session
    }

    fn session(
        &self,
        title: String,
        duration_minutes: u32,
        phase: Option<PomodoroPhase>,
        now: NaiveDateTime,
    ) -> CompletedSession {
        CompletedSession {
            title,
            duration_minutes,
            start: self.session_started_at.unwrap_or(now),
            tag_ids: self.config.tag_ids.clone(),
            phase,
        }
    }

    fn stopwatch_seconds(&self, now: NaiveDateTime) -> u64 {
        let running = self
            .run_started_at
            .map(|started| (now - started).num_seconds().max(0) as u64)
            .unwrap_or(0);
        self.accumulated_seconds + running
    }

    fn phase_seconds(&self) -> u64 {
        let minutes = match self.config.mode {
            TimerMode::Stopwatch => 0,
            TimerMode::Countdown => self.config.countdown_minutes,
            TimerMode::Pomodoro => self.config.pomodoro.minutes_for(self.phase),
        };
        u64::from(minutes) * 60
    }

    fn expect_status(&self, expected: TimerStatus, action: &'static str) -> Result<(), TimerError> {
        if self.status == expected {
            return Ok(());
        }
        Err(TimerError::InvalidTransition {
            from: self.status,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{PomodoroPhase, TimerConfig, TimerEngine, TimerError, TimerMode, TimerStatus};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 3)
            .expect("valid date")
            .and_hms_opt(hour, minute, second)
            .expect("valid time")
    }

    fn tick_for(engine: &mut TimerEngine, start: NaiveDateTime, seconds: i64) -> Vec<super::CompletedSession> {
        (1..=seconds)
            .filter_map(|offset| engine.tick(start + Duration::seconds(offset)))
            .collect()
    }

    #[test]
    fn rejects_empty_title_and_zero_countdown() {
        assert_eq!(
            TimerEngine::new(TimerConfig::new(TimerMode::Stopwatch, "  ")).expect_err("empty"),
            TimerError::EmptyTitle
        );
        let mut config = TimerConfig::new(TimerMode::Countdown, "Tea");
        config.countdown_minutes = 0;
        assert_eq!(
            TimerEngine::new(config).expect_err("zero"),
            TimerError::NonPositiveDuration
        );
    }

    #[test]
    fn countdown_completes_after_configured_ticks() {
        let mut config = TimerConfig::new(TimerMode::Countdown, "Tea");
        config.countdown_minutes = 2;
        let mut engine = TimerEngine::new(config).expect("valid");
        let start = at(9, 0, 0);
        engine.start(start).expect("start");

        assert!(tick_for(&mut engine, start, 119).is_empty());
        assert_eq!(engine.display(start), "00:01");
        let session = engine
            .tick(start + Duration::seconds(120))
            .expect("completes on last tick");
        assert_eq!(session.duration_minutes, 2);
        assert_eq!(session.start, start);
        assert_eq!(engine.status(), TimerStatus::Completed);
        assert_eq!(engine.tick(start + Duration::seconds(121)), None);
    }

    #[test]
    fn pause_freezes_countdown_and_resume_moves_session_start() {
        let mut config = TimerConfig::new(TimerMode::Countdown, "Read");
        config.countdown_minutes = 1;
        let mut engine = TimerEngine::new(config).expect("valid");
        let start = at(9, 0, 0);
        engine.start(start).expect("start");
        tick_for(&mut engine, start, 20);
        engine.pause(at(9, 0, 20)).expect("pause");
        assert_eq!(engine.tick(at(9, 0, 21)), None);
        assert_eq!(engine.remaining_seconds(), 40);

        let resumed = at(9, 5, 0);
        engine.resume(resumed).expect("resume");
        let sessions = tick_for(&mut engine, resumed, 40);
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].start, resumed);
    }

    #[test]
    fn stopwatch_uses_wall_clock_and_rounds_up() {
        let mut engine =
            TimerEngine::new(TimerConfig::new(TimerMode::Stopwatch, "Deep work")).expect("valid");
        engine.start(at(10, 0, 0)).expect("start");
        engine.pause(at(10, 1, 30)).expect("pause");
        assert_eq!(engine.elapsed_seconds(at(10, 30, 0)), 90);

        engine.resume(at(11, 0, 0)).expect("resume");
        assert_eq!(engine.display(at(11, 0, 45)), "02:15");
        let session = engine
            .finish(at(11, 0, 45))
            .expect("finish")
            .expect("stopwatch records");
        assert_eq!(session.duration_minutes, 3);
        assert_eq!(session.start, at(11, 0, 0));
        assert_eq!(engine.status(), TimerStatus::Completed);
    }

    #[test]
    fn stopwatch_records_at_least_one_minute() {
        let mut engine =
            TimerEngine::new(TimerConfig::new(TimerMode::Stopwatch, "Blink")).expect("valid");
        engine.start(at(8, 0, 0)).expect("start");
        let session = engine
            .finish(at(8, 0, 0))
            .expect("finish")
            .expect("stopwatch records");
        assert_eq!(session.duration_minutes, 1);
    }

    #[test]
    fn finishing_countdown_early_records_nothing() {
        let mut engine =
            TimerEngine::new(TimerConfig::new(TimerMode::Countdown, "Tea")).expect("valid");
        engine.start(at(8, 0, 0)).expect("start");
        assert_eq!(engine.finish(at(8, 3, 0)).expect("finish"), None);
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.remaining_seconds(), 25 * 60);
    }

    #[test]
    fn pomodoro_alternates_phases_with_long_break_every_fourth() {
        let mut config = TimerConfig::new(TimerMode::Pomodoro, "Essay");
        config.pomodoro.work_minutes = 1;
        config.pomodoro.short_break_minutes = 1;
        config.pomodoro.long_break_minutes = 2;
        let mut engine = TimerEngine::new(config).expect("valid");
        let mut now = at(13, 0, 0);
        engine.start(now).expect("start");

        let mut phases = Vec::new();
        let mut titles = Vec::new();
        while phases.len() < 8 {
            now += Duration::seconds(1);
            if let Some(session) = engine.tick(now) {
                phases.push(session.phase.expect("pomodoro phase"));
                titles.push(session.title);
            }
        }

        assert_eq!(
            phases,
            vec![
                PomodoroPhase::Work,
                PomodoroPhase::ShortBreak,
                PomodoroPhase::Work,
                PomodoroPhase::ShortBreak,
                PomodoroPhase::Work,
                PomodoroPhase::ShortBreak,
                PomodoroPhase::Work,
                PomodoroPhase::LongBreak,
            ]
        );
        assert_eq!(titles[0], "Essay (Work)");
        assert_eq!(titles[1], "Essay (Break)");
        assert_eq!(engine.completed_pomodoros(), 4);
        assert_eq!(engine.phase(), PomodoroPhase::Work);
        assert!(engine.is_running());
    }

    #[test]
    fn reset_restores_current_phase_duration() {
        let mut config = TimerConfig::new(TimerMode::Pomodoro, "Code");
        config.pomodoro.work_minutes = 1;
        let mut engine = TimerEngine::new(config).expect("valid");
        let start = at(7, 0, 0);
        engine.start(start).expect("start");
        tick_for(&mut engine, start, 61);
        assert_eq!(engine.phase(), PomodoroPhase::ShortBreak);

        engine.reset();
        assert_eq!(engine.status(), TimerStatus::Idle);
        assert_eq!(engine.remaining_seconds(), 5 * 60);
        assert!(matches!(
            engine.pause(start),
            Err(TimerError::InvalidTransition { from: TimerStatus::Idle, .. })
        ));
    }
}
