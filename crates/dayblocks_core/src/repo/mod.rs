//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the raw key-value storage contract the planner store builds on.
//! - Isolate SQLite query details from the store and services.
//!
//! # Invariants
//! - Repositories never interpret stored values.

pub mod kv_repo;
