//! Planner use-case services.
//!
//! # Responsibility
//! - Orchestrate store updates into user-level operations.
//! - Keep UI/FFI layers decoupled from storage details.
//!
//! # Invariants
//! - Services receive the store explicitly and mutate it only through
//!   `PlannerStore::update`/`try_update`.
//! - Rejected input never reaches the store.

pub mod error;
pub mod habit_service;
pub mod heatmap_service;
pub mod module_service;
pub mod tag_service;
pub mod time_block_service;
pub mod todo_service;
