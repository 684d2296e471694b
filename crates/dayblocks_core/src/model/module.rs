//! Feature modules that gate optional planner widgets.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Persisted install state of one widget module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon key understood by the UI shell.
    pub icon: String,
    pub installed: bool,
}

/// Built-in widget modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleKind {
    Timer,
    Heatmap,
    Habits,
    Todos,
}

impl ModuleKind {
    pub const ALL: [Self; 4] = [Self::Timer, Self::Heatmap, Self::Habits, Self::Todos];

    /// Stable id stored in `Module::id`.
    pub fn id(self) -> &'static str {
        match self {
            Self::Timer => "timer",
            Self::Heatmap => "heatmap",
            Self::Habits => "habits",
            Self::Todos => "todos",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == value.trim())
    }

    fn catalog_entry(self) -> Module {
        let (name, description, icon) = match self {
            Self::Timer => (
                "Timer",
                "Track time with countdown and pomodoro timers",
                "timer",
            ),
            Self::Heatmap => (
                "Time Heatmap",
                "Visualize your daily activity intensity",
                "activity",
            ),
            Self::Habits => (
                "Daily Habits",
                "Automate recurring activities in your timeline",
                "repeat",
            ),
            Self::Todos => (
                "To-Do List",
                "Manage tasks with timeline integration",
                "check-square",
            ),
        };
        Module {
            id: self.id().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            installed: false,
        }
    }
}

impl Display for ModuleKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Modules seeded when the store has no `modules` entry. All start uninstalled.
pub fn default_modules() -> Vec<Module> {
    ModuleKind::ALL
        .into_iter()
        .map(ModuleKind::catalog_entry)
        .collect()
}
