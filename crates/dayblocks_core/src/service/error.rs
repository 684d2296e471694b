//! Service-level error shared by planner use-cases.

use crate::model::module::ModuleKind;
use crate::model::ValidationError;
use crate::store::StoreError;
use crate::timer::TimerError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Debug)]
pub enum PlannerError {
    /// Form input rejected; nothing was written.
    Validation(ValidationError),
    /// Persistence failure.
    Store(StoreError),
    TimeBlockNotFound(String),
    TagNotFound(String),
    HabitNotFound(String),
    TodoNotFound(String),
    ModuleNotFound(String),
    /// User tried to drag or delete a block owned by a todo.
    Locked(String),
    /// Widget operation requested while its module is uninstalled.
    ModuleNotInstalled(ModuleKind),
    HabitAlreadyCompleted(String),
    HabitNotCompleted(String),
    TodoAlreadyScheduled(String),
    TodoNotScheduled(String),
    /// Timer transition rejected.
    Timer(TimerError),
}

impl Display for PlannerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::TimeBlockNotFound(id) => write!(f, "time block not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::HabitNotFound(id) => write!(f, "habit not found: {id}"),
            Self::TodoNotFound(id) => write!(f, "todo not found: {id}"),
            Self::ModuleNotFound(id) => write!(f, "module not found: {id}"),
            Self::Locked(id) => write!(f, "time block {id} is locked"),
            Self::ModuleNotInstalled(kind) => write!(f, "module `{kind}` is not installed"),
            Self::HabitAlreadyCompleted(id) => write!(f, "habit {id} is already completed"),
            Self::HabitNotCompleted(id) => write!(f, "habit {id} is not completed"),
            Self::TodoAlreadyScheduled(id) => write!(f, "todo {id} is already on the timeline"),
            Self::TodoNotScheduled(id) => write!(f, "todo {id} is not on the timeline"),
            Self::Timer(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlannerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Timer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for PlannerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for PlannerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<TimerError> for PlannerError {
    fn from(value: TimerError) -> Self {
        Self::Timer(value)
    }
}
