//! Timer widget: countdown, stopwatch and pomodoro sessions.
//!
//! # Responsibility
//! - Model the session state machine (`engine`).
//! - Drive it with scoped, cooperative intervals (`ticker`).
//! - Record finished sessions as time blocks (`controller`).
//!
//! # Invariants
//! - The engine is pure: it reads time only from the `now` it is given.
//! - No interval outlives the session that started it.

pub mod controller;
pub mod engine;
pub mod ticker;

pub use controller::{TimerController, TimerSnapshot};
pub use engine::{
    CompletedSession, PomodoroPhase, PomodoroSettings, TimerConfig, TimerEngine, TimerError,
    TimerMode, TimerStatus,
};
pub use ticker::{IntervalGuard, TickScheduler};
