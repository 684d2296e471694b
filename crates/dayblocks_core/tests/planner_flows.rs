use chrono::{Duration, NaiveDate, NaiveDateTime};
use dayblocks_core::format::{format_duration, format_time};
use dayblocks_core::heatmap::{intensity, MAX_INTENSITY};
use dayblocks_core::store::keys::TimeBlocksKey;
use dayblocks_core::timer::PomodoroPhase;
use dayblocks_core::{
    ClockTime, HabitDraft, HabitService, HeatmapService, HeatmapView, HourRange,
    InMemoryKvRepository, ModuleKind, ModuleService, NewTimeBlock, PlannerError, PlannerStore,
    TimeBlockForm, TimeBlockService, TimelineDrop, TimerConfig, TimerController, TimerMode,
    TodoDraft, TodoService,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    today().and_hms_opt(hour, minute, 0).unwrap()
}

fn store() -> PlannerStore<InMemoryKvRepository> {
    PlannerStore::load(InMemoryKvRepository::new()).unwrap()
}

#[test]
fn formatting_matches_timeline_labels() {
    assert_eq!(format_duration(90), "1h 30m");
    assert_eq!(format_duration(60), "1h");
    assert_eq!(format_duration(45), "45m");
    for minutes in 1..=600 {
        let hours = minutes / 60;
        let rest = minutes % 60;
        let expected = match (hours, rest) {
            (0, m) => format!("{m}m"),
            (h, 0) => format!("{h}h"),
            (h, m) => format!("{h}h {m}m"),
        };
        assert_eq!(format_duration(minutes), expected);
    }
    assert_eq!(format_time(0), "12 AM");
    assert_eq!(format_time(12), "12 PM");
    assert_eq!(format_time(13), "1 PM");
}

#[test]
fn dragging_to_ten_oh_seven_snaps_to_nearest_quarter() {
    let mut store = store();
    let mut blocks = TimeBlockService::new(&mut store);
    let block = blocks.add(NewTimeBlock::new("Review", 30), today()).unwrap();
    let drop = |offset_y: f64| TimelineDrop {
        offset_y,
        surface_height: 1440.0,
        range: HourRange::FULL_DAY,
        viewed_date: today(),
    };

    let start = blocks.drop_at(&block.id, drop(607.0)).unwrap();
    assert_eq!(start, Some(ClockTime::new(10, 0).unwrap()));
    let start = blocks.drop_at(&block.id, drop(608.0)).unwrap();
    assert_eq!(start, Some(ClockTime::new(10, 15).unwrap()));

    let view = blocks.day_view(today(), HourRange::FULL_DAY);
    assert_eq!(view.placed.len(), 1);
    assert!(view.unassigned.is_empty());
}

#[test]
fn invalid_forms_never_reach_the_collection() {
    let mut store = store();
    let mut blocks = TimeBlockService::new(&mut store);
    let empty = TimeBlockForm {
        title: String::new(),
        hours: 1,
        minutes: 0,
        tag_ids: Vec::new(),
    };
    let zero = TimeBlockForm {
        title: "Nothing".to_string(),
        hours: 0,
        minutes: 0,
        tag_ids: Vec::new(),
    };
    assert!(matches!(
        blocks.add_from_form(&empty, today()),
        Err(PlannerError::Validation(_))
    ));
    assert!(matches!(
        blocks.add_from_form(&zero, today()),
        Err(PlannerError::Validation(_))
    ));
    assert!(store.get::<TimeBlocksKey>().is_empty());
}

#[test]
fn pomodoro_work_phase_appends_single_work_block() {
    let mut store = store();
    let mut controller = TimerController::new();
    let start = at(9, 0);
    controller
        .start(TimerConfig::new(TimerMode::Pomodoro, "Write"), start)
        .unwrap();

    let mut now = start;
    let mut recorded = Vec::new();
    while recorded.len() < 8 {
        now += Duration::seconds(30);
        recorded.extend(controller.poll(&mut store, now).unwrap());
    }

    let titles: Vec<&str> = recorded.iter().map(|block| block.title.as_str()).collect();
    assert_eq!(titles[0], "Write (Work)");
    assert_eq!(recorded[0].duration, 25);
    assert_eq!(recorded[1].duration, 5);
    assert_eq!(recorded[7].duration, 15);
    assert_eq!(recorded[7].start_time, Some(ClockTime::new(10, 55).unwrap()));
    assert_eq!(titles.iter().filter(|title| title.ends_with("(Work)")).count(), 4);
    assert_eq!(store.get::<TimeBlocksKey>().len(), 8);

    let snapshot = controller.snapshot(now).unwrap();
    assert_eq!(snapshot.completed_pomodoros, 4);
    assert_eq!(snapshot.phase, Some(PomodoroPhase::Work));
}

#[test]
fn deleting_scheduled_todo_leaves_no_orphan_block() {
    let mut store = store();
    let mut todos = TodoService::new(&mut store);
    let todo = todos
        .add(TodoDraft {
            title: "Book flights".to_string(),
            duration: 30,
            tag_ids: vec!["2".to_string()],
            due_date: None,
            due_time: Some(ClockTime::new(18, 0).unwrap()),
        })
        .unwrap();
    let block = todos.add_to_timeline(&todo.id, today()).unwrap();

    let mut blocks = TimeBlockService::new(&mut store);
    assert!(matches!(blocks.delete(&block.id), Err(PlannerError::Locked(_))));

    TodoService::new(&mut store).delete(&todo.id).unwrap();
    assert!(store.get::<TimeBlocksKey>().is_empty());
}

#[test]
fn habit_completion_shows_up_on_todays_timeline() {
    let mut store = store();
    let mut habits = HabitService::new(&mut store);
    let habit = habits
        .add(HabitDraft {
            name: "Journal".to_string(),
            time: ClockTime::new(21, 30).unwrap(),
            duration: 15,
            tag_ids: vec!["2".to_string()],
        })
        .unwrap();
    habits.complete(&habit.id, today()).unwrap();

    let view = TimeBlockService::new(&mut store).day_view(today(), HourRange::FULL_DAY);
    assert_eq!(view.placed.len(), 1);
    assert_eq!(view.placed[0].block.title, "Journal");
    assert_eq!(view.placed[0].color, "#8338ec");
}

#[test]
fn heatmap_intensity_peaks_at_window_maximum() {
    assert_eq!(intensity(7, 7), MAX_INTENSITY);
    assert_eq!(intensity(0, 7), 0);
    assert_eq!(intensity(0, 0), 0);

    let mut store = store();
    let mut blocks = TimeBlockService::new(&mut store);
    let dated = |title: &str, date: NaiveDate| NewTimeBlock {
        date: Some(date),
        ..NewTimeBlock::new(title, 30)
    };
    for _ in 0..3 {
        blocks.add(dated("Run", today()), today()).unwrap();
    }
    let yesterday = today().pred_opt().unwrap();
    blocks.add(dated("Walk", yesterday), today()).unwrap();
    blocks.add(NewTimeBlock::new("Someday", 30), today()).unwrap();

    let mut heatmap = HeatmapService::new(&mut store);
    heatmap.set_view(HeatmapView::Week).unwrap();
    let map = heatmap.build(today());
    assert_eq!(map.days.len(), 28);
    assert_eq!(map.max_count, 3);
    let last = map.days.last().unwrap();
    assert_eq!(last.date, today());
    assert_eq!(last.intensity, MAX_INTENSITY);
    assert_eq!(map.days[26].intensity, 2);
    assert_eq!(map.days[0].intensity, 0);
    assert!(map.weeks().iter().all(|week| week.len() == 7));
}

#[test]
fn widgets_are_gated_by_module_install_state() {
    let mut store = store();
    let mut modules = ModuleService::new(&mut store);
    assert!(matches!(
        modules.ensure_installed(ModuleKind::Habits),
        Err(PlannerError::ModuleNotInstalled(ModuleKind::Habits))
    ));
    modules.toggle(ModuleKind::Habits.id()).unwrap();
    modules.ensure_installed(ModuleKind::Habits).unwrap();
}
