//! Flutter-facing bindings for the DayBlocks planner core.

pub mod api;
