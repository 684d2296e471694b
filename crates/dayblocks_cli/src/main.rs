//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `dayblocks_core` linkage without the Flutter shell.
//! - Exercise one in-memory drag-to-schedule round trip.

use chrono::Local;
use dayblocks_core::format::format_duration;
use dayblocks_core::{
    HourRange, InMemoryKvRepository, PlannerStore, TimeBlockForm, TimeBlockService, TimelineDrop,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("dayblocks_core ping={}", dayblocks_core::ping());
    println!("dayblocks_core version={}", dayblocks_core::core_version());

    match probe_timeline() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("timeline probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn probe_timeline() -> dayblocks_core::PlannerResult<String> {
    let today = Local::now().date_naive();
    let mut store = PlannerStore::load(InMemoryKvRepository::new())?;
    let mut blocks = TimeBlockService::new(&mut store);

    let block = blocks.add_from_form(
        &TimeBlockForm {
            title: "Smoke probe".to_string(),
            hours: 0,
            minutes: 45,
            tag_ids: vec!["1".to_string()],
        },
        today,
    )?;
    let drop = TimelineDrop {
        offset_y: 540.0,
        surface_height: 1440.0,
        range: HourRange::FULL_DAY,
        viewed_date: today,
    };
    let start = blocks.drop_at(&block.id, drop)?;

    let view = blocks.day_view(today, HourRange::FULL_DAY);
    Ok(format!(
        "timeline date={} placed={} unassigned={} start={} duration={}",
        view.date,
        view.placed.len(),
        view.unassigned.len(),
        start.map_or_else(|| "none".to_string(), |time| time.to_string()),
        format_duration(block.duration)
    ))
}
