//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose page-level planner operations to Dart via FRB.
//! - Translate typed core errors into `{ok, id, message}` envelopes.
//!
//! # Invariants
//! - Exported functions never panic across the FFI boundary.
//! - Widget functions fail with `ok: false` while their module is uninstalled.
//! - Each call opens the database, runs one use-case and drops the connection.

use chrono::{Local, NaiveDate, NaiveDateTime};
use dayblocks_core::db::open_db;
use dayblocks_core::timeline::PlacedBlock;
use dayblocks_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ClockTime, HabitDraft, HabitService, HeatmapService, HeatmapView, ModuleKind, ModuleService,
    PlannerConfig, PlannerResult, PlannerStore, SqliteKvRepository, TagPatch, TagService,
    TimeBlock, TimeBlockForm, TimeBlockPatch, TimeBlockService, TimelineDrop, TimerConfig, TimerController,
    TimerMode, TimerSnapshot, TodoDraft, TodoService,
};
use log::warn;
use std::cell::RefCell;
use std::sync::OnceLock;

static CONFIG: OnceLock<PlannerConfig> = OnceLock::new();

thread_local! {
    static TIMER: RefCell<TimerController> = RefCell::new(TimerController::new());
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op. Blank
/// arguments fall back to `DAYBLOCKS_LOG_LEVEL` / `DAYBLOCKS_LOG_DIR`.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let (level, log_dir) = logging_args(config(), &level, &log_dir);
    match init_logging_inner(&level, &log_dir) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

fn logging_args(config: &PlannerConfig, level: &str, log_dir: &str) -> (String, String) {
    let level = match level.trim() {
        "" => config.log_level.clone(),
        given => given.to_string(),
    };
    let log_dir = match log_dir.trim() {
        "" => config
            .log_dir
            .as_ref()
            .map(|dir| dir.to_string_lossy().into_owned())
            .unwrap_or_default(),
        given => given.to_string(),
    };
    (level, log_dir)
}

/// Generic action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// Id of the created or affected record.
    pub id: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: Option<String>) -> Self {
        Self {
            ok: true,
            id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }

    fn from_result(operation: &str, message: &str, result: Result<Option<String>, String>) -> Self {
        match result {
            Ok(id) => Self::success(message, id),
            Err(err) => Self::failure(format!("{operation} failed: {err}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBlockItem {
    pub id: String,
    pub title: String,
    pub duration: u32,
    /// `"1h 30m"` style label.
    pub duration_label: String,
    /// `HH:MM`, absent for unassigned blocks.
    pub start_time: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    pub tag_ids: Vec<String>,
    pub color: String,
    pub locked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlockItem {
    pub block: TimeBlockItem,
    pub top_percent: f64,
    pub height_percent: f64,
    pub lane: u32,
    pub lane_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourMarkerItem {
    pub hour: u32,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayViewResponse {
    pub ok: bool,
    pub message: String,
    pub date: String,
    pub markers: Vec<HourMarkerItem>,
    pub placed: Vec<PlacedBlockItem>,
    pub unassigned: Vec<TimeBlockItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagItem {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitItem {
    pub id: String,
    pub name: String,
    pub time: String,
    pub duration: u32,
    pub tag_ids: Vec<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    pub duration: u32,
    pub tag_ids: Vec<String>,
    pub due_date: Option<String>,
    pub due_time: Option<String>,
    pub completed: bool,
    pub added_to_timeline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub installed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: String,
    pub count: u32,
    pub intensity: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeatmapResponse {
    pub ok: bool,
    pub message: String,
    pub view: String,
    pub max_count: u32,
    /// Rows of seven cells, oldest first.
    pub weeks: Vec<Vec<HeatmapCell>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerStateResponse {
    pub ok: bool,
    pub message: String,
    /// `idle|running|paused|completed`, or `none` without a session.
    pub status: String,
    pub mode: Option<String>,
    pub phase: Option<String>,
    pub display: String,
    pub completed_pomodoros: u32,
    /// Ids of blocks recorded by this call.
    pub recorded_block_ids: Vec<String>,
}

// ---- Timeline page ----

/// Day view for `date` (`YYYY-MM-DD`, today when absent).
#[flutter_rust_bridge::frb(sync)]
pub fn timeline_day_view(date: Option<String>) -> DayViewResponse {
    let result = parse_date_or_today(date).and_then(|date| {
        let range = config().timeline_range;
        with_store(|store| Ok(TimeBlockService::new(store).day_view(date, range)))
    });
    match result {
        Ok(view) => DayViewResponse {
            ok: true,
            message: format!("{} block(s) scheduled.", view.placed.len()),
            date: view.date.to_string(),
            markers: view
                .markers
                .into_iter()
                .map(|marker| HourMarkerItem {
                    hour: marker.hour,
                    label: marker.label,
                })
                .collect(),
            placed: view.placed.into_iter().map(to_placed_item).collect(),
            unassigned: view
                .unassigned
                .iter()
                .map(|block| to_block_item(block, None))
                .collect(),
        },
        Err(err) => DayViewResponse {
            ok: false,
            message: format!("timeline_day_view failed: {err}"),
            date: String::new(),
            markers: Vec::new(),
            placed: Vec::new(),
            unassigned: Vec::new(),
        },
    }
}

/// Manual "Add Time Block" form.
#[flutter_rust_bridge::frb(sync)]
pub fn time_block_add(title: String, hours: u32, minutes: u32, tag_ids: Vec<String>) -> ActionResponse {
    let form = TimeBlockForm {
        title,
        hours,
        minutes,
        tag_ids,
    };
    let result = with_store(|store| {
        TimeBlockService::new(store)
            .add_from_form(&form, today())
            .map(|block| Some(block.id))
    });
    ActionResponse::from_result("time_block_add", "Time block created.", result)
}

/// Drops block `id` at `offset_y` on a surface `surface_height` pixels tall.
///
/// An out-of-range position succeeds without moving the block.
#[flutter_rust_bridge::frb(sync)]
pub fn time_block_drop(
    id: String,
    offset_y: f64,
    surface_height: f64,
    date: Option<String>,
) -> ActionResponse {
    let result = parse_date_or_today(date).and_then(|viewed_date| {
        let drop = TimelineDrop {
            offset_y,
            surface_height,
            range: config().timeline_range,
            viewed_date,
        };
        with_store(|store| TimeBlockService::new(store).drop_at(&id, drop))
    });
    match result {
        Ok(Some(start)) => ActionResponse::success(format!("Scheduled at {start}."), Some(id)),
        Ok(None) => ActionResponse::success("Position outside timeline; unchanged.", Some(id)),
        Err(err) => ActionResponse::failure(format!("time_block_drop failed: {err}")),
    }
}

/// Edits title, duration and tags; placement is kept.
#[flutter_rust_bridge::frb(sync)]
pub fn time_block_edit(id: String, title: String, duration: u32, tag_ids: Vec<String>) -> ActionResponse {
    let patch = TimeBlockPatch {
        title: Some(title),
        duration: Some(duration),
        tag_ids: Some(tag_ids),
        ..TimeBlockPatch::default()
    };
    let result = with_store(|store| {
        TimeBlockService::new(store)
            .update(&id, &patch)
            .map(|block| Some(block.id))
    });
    ActionResponse::from_result("time_block_edit", "Time block updated.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn time_block_delete(id: String) -> ActionResponse {
    let result = with_store(|store| TimeBlockService::new(store).delete(&id).map(|()| Some(id.clone())));
    ActionResponse::from_result("time_block_delete", "Time block deleted.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn tag_list() -> Vec<TagItem> {
    with_store(|store| {
        Ok(TagService::new(store)
            .list()
            .iter()
            .map(|tag| TagItem {
                id: tag.id.clone(),
                name: tag.name.clone(),
                color: tag.color.clone(),
            })
            .collect())
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn tag_add(name: String, color: String) -> ActionResponse {
    let result = with_store(|store| TagService::new(store).add(&name, &color).map(|tag| Some(tag.id)));
    ActionResponse::from_result("tag_add", "Tag created.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn tag_edit(id: String, name: String, color: String) -> ActionResponse {
    let patch = TagPatch {
        name: Some(name),
        color: Some(color),
    };
    let result = with_store(|store| TagService::new(store).update(&id, &patch).map(|tag| Some(tag.id)));
    ActionResponse::from_result("tag_edit", "Tag updated.", result)
}

/// Deletes a tag. Blocks keep the dangling id and fall back to other colors.
#[flutter_rust_bridge::frb(sync)]
pub fn tag_delete(id: String) -> ActionResponse {
    let result = with_store(|store| TagService::new(store).delete(&id).map(|()| Some(id.clone())));
    ActionResponse::from_result("tag_delete", "Tag deleted.", result)
}

// ---- Habit widget ----

#[flutter_rust_bridge::frb(sync)]
pub fn habit_list() -> Vec<HabitItem> {
    with_module(ModuleKind::Habits, |store| {
        Ok(HabitService::new(store)
            .list()
            .iter()
            .map(|habit| HabitItem {
                id: habit.id.clone(),
                name: habit.name.clone(),
                time: habit.time.to_string(),
                duration: habit.duration,
                tag_ids: habit.tag_ids.clone(),
                completed: habit.completed,
            })
            .collect())
    })
    .unwrap_or_default()
}

/// Adds a habit at `time` (`HH:MM`).
#[flutter_rust_bridge::frb(sync)]
pub fn habit_add(name: String, time: String, duration: u32, tag_ids: Vec<String>) -> ActionResponse {
    let result = parse_clock(&time).and_then(|time| {
        let draft = HabitDraft {
            name,
            time,
            duration,
            tag_ids,
        };
        with_module(ModuleKind::Habits, |store| {
            HabitService::new(store).add(draft).map(|habit| Some(habit.id))
        })
    });
    ActionResponse::from_result("habit_add", "Habit created.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_edit(
    id: String,
    name: String,
    time: String,
    duration: u32,
    tag_ids: Vec<String>,
) -> ActionResponse {
    let result = parse_clock(&time).and_then(|time| {
        let draft = HabitDraft {
            name,
            time,
            duration,
            tag_ids,
        };
        with_module(ModuleKind::Habits, |store| {
            HabitService::new(store).edit(&id, draft).map(|habit| Some(habit.id))
        })
    });
    ActionResponse::from_result("habit_edit", "Habit updated.", result)
}

/// Completes a habit and returns the id of the block placed on today.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_complete(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Habits, |store| {
        HabitService::new(store)
            .complete(&id, today())
            .map(|block| Some(block.id))
    });
    ActionResponse::from_result("habit_complete", "Habit completed.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_uncomplete(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Habits, |store| {
        HabitService::new(store).uncomplete(&id).map(|()| Some(id.clone()))
    });
    ActionResponse::from_result("habit_uncomplete", "Habit reopened.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_reset_all() -> ActionResponse {
    match with_module(ModuleKind::Habits, |store| HabitService::new(store).reset_all()) {
        Ok(count) => ActionResponse::success(format!("Reset {count} habit(s)."), None),
        Err(err) => ActionResponse::failure(format!("habit_reset_all failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn habit_delete(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Habits, |store| {
        HabitService::new(store).delete(&id).map(|()| Some(id.clone()))
    });
    ActionResponse::from_result("habit_delete", "Habit deleted.", result)
}

// ---- To-do widget ----

#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> Vec<TodoItem> {
    with_module(ModuleKind::Todos, |store| {
        Ok(TodoService::new(store)
            .list()
            .iter()
            .map(|todo| TodoItem {
                id: todo.id.clone(),
                title: todo.title.clone(),
                duration: todo.duration,
                tag_ids: todo.tag_ids.clone(),
                due_date: todo.due_date.map(|date| date.to_string()),
                due_time: todo.due_time.map(|time| time.to_string()),
                completed: todo.completed,
                added_to_timeline: todo.added_to_timeline,
            })
            .collect())
    })
    .unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(
    title: String,
    duration: u32,
    tag_ids: Vec<String>,
    due_date: Option<String>,
    due_time: Option<String>,
) -> ActionResponse {
    let parsed = parse_optional_date(due_date)
        .and_then(|date| parse_optional_clock(due_time).map(|time| (date, time)));
    let result = parsed.and_then(|(due_date, due_time)| {
        let draft = TodoDraft {
            title,
            duration,
            tag_ids,
            due_date,
            due_time,
        };
        with_module(ModuleKind::Todos, |store| {
            TodoService::new(store).add(draft).map(|todo| Some(todo.id))
        })
    });
    ActionResponse::from_result("todo_add", "Todo created.", result)
}

/// Edits a todo; a scheduled todo's block follows the new title, duration
/// and tags.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_edit(
    id: String,
    title: String,
    duration: u32,
    tag_ids: Vec<String>,
    due_date: Option<String>,
    due_time: Option<String>,
) -> ActionResponse {
    let parsed = parse_optional_date(due_date)
        .and_then(|date| parse_optional_clock(due_time).map(|time| (date, time)));
    let result = parsed.and_then(|(due_date, due_time)| {
        let draft = TodoDraft {
            title,
            duration,
            tag_ids,
            due_date,
            due_time,
        };
        with_module(ModuleKind::Todos, |store| {
            TodoService::new(store).edit(&id, draft).map(|todo| Some(todo.id))
        })
    });
    ActionResponse::from_result("todo_edit", "Todo updated.", result)
}

/// Puts the todo on the timeline; returns the locked block id.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_schedule(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Todos, |store| {
        TodoService::new(store)
            .add_to_timeline(&id, today())
            .map(|block| Some(block.id))
    });
    ActionResponse::from_result("todo_schedule", "Todo added to timeline.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_unschedule(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Todos, |store| {
        TodoService::new(store)
            .remove_from_timeline(&id)
            .map(|()| Some(id.clone()))
    });
    ActionResponse::from_result("todo_unschedule", "Todo removed from timeline.", result)
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_set_completed(id: String, completed: bool) -> ActionResponse {
    let result = with_module(ModuleKind::Todos, |store| {
        TodoService::new(store)
            .set_completed(&id, completed)
            .map(|todo| Some(todo.id))
    });
    ActionResponse::from_result("todo_set_completed", "Todo updated.", result)
}

/// Deletes a todo together with its timeline block.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: String) -> ActionResponse {
    let result = with_module(ModuleKind::Todos, |store| {
        TodoService::new(store).delete(&id).map(|()| Some(id.clone()))
    });
    ActionResponse::from_result("todo_delete", "Todo deleted.", result)
}

// ---- Timer widget ----

/// Starts a session. `mode` is `countdown|stopwatch|pomodoro`; pomodoro uses
/// the 25/5/15 defaults.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_start(
    mode: String,
    title: String,
    tag_ids: Vec<String>,
    countdown_minutes: Option<u32>,
) -> TimerStateResponse {
    let Some(mode) = TimerMode::parse(&mode) else {
        return timer_failure(format!("timer_start failed: unsupported mode `{mode}`"));
    };
    if let Err(err) = require_module(ModuleKind::Timer) {
        return timer_failure(format!("timer_start failed: {err}"));
    }

    let mut config = TimerConfig::new(mode, title);
    config.tag_ids = tag_ids;
    if let Some(minutes) = countdown_minutes {
        config.countdown_minutes = minutes;
    }
    let now = now();
    let result = TIMER.with(|timer| timer.borrow_mut().start(config, now));
    match result {
        Ok(()) => timer_state("Timer started.", now, Vec::new()),
        Err(err) => timer_failure(format!("timer_start failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_pause() -> TimerStateResponse {
    let now = now();
    match TIMER.with(|timer| timer.borrow_mut().pause(now)) {
        Ok(()) => timer_state("Timer paused.", now, Vec::new()),
        Err(err) => timer_failure(format!("timer_pause failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_resume() -> TimerStateResponse {
    let now = now();
    match TIMER.with(|timer| timer.borrow_mut().resume(now)) {
        Ok(()) => timer_state("Timer resumed.", now, Vec::new()),
        Err(err) => timer_failure(format!("timer_resume failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_reset() -> TimerStateResponse {
    match TIMER.with(|timer| timer.borrow_mut().reset()) {
        Ok(()) => timer_state("Timer reset.", now(), Vec::new()),
        Err(err) => timer_failure(format!("timer_reset failed: {err}")),
    }
}

/// Advances the session to the current time and records finished phases.
/// The UI calls this from its one-second refresh.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_poll() -> TimerStateResponse {
    let now = now();
    let result = with_module(ModuleKind::Timer, |store| {
        TIMER.with(|timer| timer.borrow_mut().poll(store, now))
    });
    match result {
        Ok(blocks) => timer_state("Timer updated.", now, block_ids(&blocks)),
        Err(err) => timer_failure(format!("timer_poll failed: {err}")),
    }
}

/// Ends the session; a stopwatch is recorded on the timeline.
#[flutter_rust_bridge::frb(sync)]
pub fn timer_finish() -> TimerStateResponse {
    let now = now();
    let result = with_module(ModuleKind::Timer, |store| {
        TIMER.with(|timer| timer.borrow_mut().finish(store, now))
    });
    match result {
        Ok(block) => timer_state(
            "Timer finished.",
            now,
            block.into_iter().map(|block| block.id).collect(),
        ),
        Err(err) => timer_failure(format!("timer_finish failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn timer_state_now() -> TimerStateResponse {
    timer_state("", now(), Vec::new())
}

// ---- Heatmap widget ----

/// Builds the heatmap. A `view` (`week|month|year`) is persisted first.
#[flutter_rust_bridge::frb(sync)]
pub fn heatmap_build(view: Option<String>) -> HeatmapResponse {
    let view = match view {
        None => None,
        Some(raw) => match HeatmapView::parse(&raw) {
            Some(view) => Some(view),
            None => {
                return heatmap_failure(format!(
                    "heatmap_build failed: unsupported view `{raw}`"
                ))
            }
        },
    };
    let result = with_module(ModuleKind::Heatmap, |store| {
        let mut heatmap = HeatmapService::new(store);
        if let Some(view) = view {
            heatmap.set_view(view)?;
        }
        Ok(heatmap.build(today()))
    });
    match result {
        Ok(map) => HeatmapResponse {
            ok: true,
            message: format!("{} block(s) in window.", map.total_count()),
            view: map.view.to_string(),
            max_count: map.max_count,
            weeks: map
                .weeks()
                .into_iter()
                .map(|week| {
                    week.iter()
                        .map(|day| HeatmapCell {
                            date: day.date.to_string(),
                            count: day.count,
                            intensity: day.intensity,
                        })
                        .collect()
                })
                .collect(),
        },
        Err(err) => heatmap_failure(format!("heatmap_build failed: {err}")),
    }
}

// ---- Modules page ----

#[flutter_rust_bridge::frb(sync)]
pub fn module_list() -> Vec<ModuleItem> {
    with_store(|store| {
        Ok(ModuleService::new(store)
            .list()
            .iter()
            .map(|module| ModuleItem {
                id: module.id.clone(),
                name: module.name.clone(),
                description: module.description.clone(),
                icon: module.icon.clone(),
                installed: module.installed,
            })
            .collect())
    })
    .unwrap_or_default()
}

/// Installs or uninstalls module `id`. Uninstalling the timer drops the
/// running session without recording it.
#[flutter_rust_bridge::frb(sync)]
pub fn module_toggle(id: String) -> ActionResponse {
    match with_store(|store| ModuleService::new(store).toggle(&id)) {
        Ok(module) => {
            if !module.installed && ModuleKind::parse(&module.id) == Some(ModuleKind::Timer) {
                TIMER.with(|timer| timer.borrow_mut().cancel());
            }
            let verb = if module.installed { "installed" } else { "uninstalled" };
            ActionResponse::success(format!("Module {verb}."), Some(module.id))
        }
        Err(err) => ActionResponse::failure(format!("module_toggle failed: {err}")),
    }
}

fn config() -> &'static PlannerConfig {
    CONFIG.get_or_init(|| {
        let config = PlannerConfig::from_env().unwrap_or_else(|err| {
            warn!("event=config_load module=ffi status=fallback error={err}");
            PlannerConfig::default()
        });
        if let Some(dir) = &config.log_dir {
            if let Err(err) = init_logging_inner(&config.log_level, &dir.to_string_lossy()) {
                warn!("event=logging_init module=ffi status=error error={err}");
            }
        }
        config
    })
}

fn with_store<T>(
    f: impl FnOnce(&mut PlannerStore<SqliteKvRepository<'_>>) -> PlannerResult<T>,
) -> Result<T, String> {
    let conn = open_db(&config().db_path).map_err(|err| format!("planner DB open failed: {err}"))?;
    let repo = SqliteKvRepository::try_new(&conn)
        .map_err(|err| format!("planner repo init failed: {err}"))?;
    let mut store = PlannerStore::load(repo).map_err(|err| err.to_string())?;
    f(&mut store).map_err(|err| err.to_string())
}

fn with_module<T>(
    kind: ModuleKind,
    f: impl FnOnce(&mut PlannerStore<SqliteKvRepository<'_>>) -> PlannerResult<T>,
) -> Result<T, String> {
    with_store(|store| {
        ModuleService::new(store).ensure_installed(kind)?;
        f(store)
    })
}

fn require_module(kind: ModuleKind) -> Result<(), String> {
    with_module(kind, |_| Ok(()))
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn today() -> NaiveDate {
    now().date()
}

fn parse_date_or_today(date: Option<String>) -> Result<NaiveDate, String> {
    Ok(parse_optional_date(date)?.unwrap_or_else(today))
}

fn parse_optional_date(date: Option<String>) -> Result<Option<NaiveDate>, String> {
    match date.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|err| format!("invalid date `{raw}`: {err}")),
    }
}

fn parse_clock(raw: &str) -> Result<ClockTime, String> {
    raw.parse::<ClockTime>().map_err(|err| err.to_string())
}

fn parse_optional_clock(time: Option<String>) -> Result<Option<ClockTime>, String> {
    match time.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        None => Ok(None),
        Some(raw) => parse_clock(raw).map(Some),
    }
}

fn to_block_item(block: &TimeBlock, color: Option<String>) -> TimeBlockItem {
    TimeBlockItem {
        id: block.id.clone(),
        title: block.title.clone(),
        duration: block.duration,
        duration_label: dayblocks_core::format::format_duration(block.duration),
        start_time: block.start_time.map(|time| time.to_string()),
        date: block.date.map(|date| date.to_string()),
        tag_ids: block.tag_ids.clone(),
        color: color
            .or_else(|| block.color.clone())
            .unwrap_or_else(|| dayblocks_core::timeline::DEFAULT_BLOCK_COLOR.to_string()),
        locked: block.locked,
    }
}

fn to_placed_item(placed: PlacedBlock) -> PlacedBlockItem {
    PlacedBlockItem {
        block: to_block_item(&placed.block, Some(placed.color)),
        top_percent: placed.layout.top_percent,
        height_percent: placed.layout.height_percent,
        lane: u32::try_from(placed.lane).unwrap_or(u32::MAX),
        lane_count: u32::try_from(placed.lane_count).unwrap_or(u32::MAX),
    }
}

fn block_ids(blocks: &[TimeBlock]) -> Vec<String> {
    blocks.iter().map(|block| block.id.clone()).collect()
}

fn timer_state(message: &str, now: NaiveDateTime, recorded_block_ids: Vec<String>) -> TimerStateResponse {
    let snapshot: Option<TimerSnapshot> = TIMER.with(|timer| timer.borrow().snapshot(now));
    match snapshot {
        Some(snapshot) => TimerStateResponse {
            ok: true,
            message: message.to_string(),
            status: snapshot.status.as_str().to_string(),
            mode: Some(snapshot.mode.as_str().to_string()),
            phase: snapshot.phase.map(|phase| phase.as_str().to_string()),
            display: snapshot.display,
            completed_pomodoros: snapshot.completed_pomodoros,
            recorded_block_ids,
        },
        None => TimerStateResponse {
            ok: true,
            message: message.to_string(),
            status: "none".to_string(),
            mode: None,
            phase: None,
            display: String::new(),
            completed_pomodoros: 0,
            recorded_block_ids,
        },
    }
}

fn timer_failure(message: String) -> TimerStateResponse {
    TimerStateResponse {
        ok: false,
        message,
        status: "none".to_string(),
        mode: None,
        phase: None,
        display: String::new(),
        completed_pomodoros: 0,
        recorded_block_ids: Vec::new(),
    }
}

fn heatmap_failure(message: String) -> HeatmapResponse {
    HeatmapResponse {
        ok: false,
        message,
        view: String::new(),
        max_count: 0,
        weeks: Vec::new(),
    }
}
