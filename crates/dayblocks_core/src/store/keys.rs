//! Typed keys for the planner key-value layout.
//!
//! Each key names one JSON-serialized value in the store, its default and the
//! slot it occupies in the in-memory [`PlannerState`] cache.

use super::PlannerState;
use crate::heatmap::HeatmapView;
use crate::model::habit::Habit;
use crate::model::module::{default_modules, Module};
use crate::model::tag::{default_tags, Tag};
use crate::model::time_block::TimeBlock;
use crate::model::todo::Todo;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Compile-time description of one persisted store entry.
pub trait StoreKey: 'static {
    /// Storage key, e.g. `timeBlocks`.
    const KEY: &'static str;
    type Value: Clone + Serialize + DeserializeOwned;

    /// Value used when the entry is absent or unreadable.
    fn default_value() -> Self::Value;
    fn slot(state: &PlannerState) -> &Self::Value;
    fn slot_mut(state: &mut PlannerState) -> &mut Self::Value;
}

macro_rules! store_key {
    ($name:ident, $key:literal, $value:ty, $field:ident, $default:expr) => {
        #[doc = concat!("Store entry `", $key, "`.")]
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl StoreKey for $name {
            const KEY: &'static str = $key;
            type Value = $value;

            fn default_value() -> Self::Value {
                $default
            }

            fn slot(state: &PlannerState) -> &Self::Value {
                &state.$field
            }

            fn slot_mut(state: &mut PlannerState) -> &mut Self::Value {
                &mut state.$field
            }
        }
    };
}

store_key!(TimeBlocksKey, "timeBlocks", Vec<TimeBlock>, time_blocks, Vec::new());
store_key!(TagsKey, "tags", Vec<Tag>, tags, default_tags());
store_key!(ModulesKey, "modules", Vec<Module>, modules, default_modules());
store_key!(HabitsKey, "habits", Vec<Habit>, habits, Vec::new());
store_key!(TodosKey, "todos", Vec<Todo>, todos, Vec::new());
store_key!(
    HeatmapViewKey,
    "heatmapView",
    HeatmapView,
    heatmap_view,
    HeatmapView::default()
);

/// Every key the planner persists, in load order.
pub const ALL_KEYS: [&str; 6] = [
    TimeBlocksKey::KEY,
    TagsKey::KEY,
    ModulesKey::KEY,
    HabitsKey::KEY,
    TodosKey::KEY,
    HeatmapViewKey::KEY,
];
