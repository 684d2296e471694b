//! Activity heatmap aggregation.
//!
//! # Responsibility
//! - Bucket time blocks by their `date` into per-day counts over a window.
//! - Normalize counts to a 0..=4 intensity relative to the window maximum.
//! - Lay the window out into rows of seven days for rendering.
//!
//! # Invariants
//! - Pure read-side transform: no mutation, no logging, no I/O.
//! - A day with the window's maximum count has intensity 4; an empty day 0.
//! - Blocks without a date never contribute.

use crate::model::time_block::TimeBlock;
use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Highest intensity level.
pub const MAX_INTENSITY: u8 = 4;
const DAYS_PER_ROW: usize = 7;
const WEEK_VIEW_DAYS: u64 = 28;

/// Heatmap window preference, persisted under `heatmapView`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapView {
    /// Last four weeks.
    #[default]
    Week,
    /// Last three calendar months.
    Month,
    /// Last twelve calendar months.
    Year,
}

impl HeatmapView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    /// First day (inclusive) of the window ending on `today`.
    pub fn window_start(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Week => today.checked_sub_days(Days::new(WEEK_VIEW_DAYS - 1)),
            Self::Month => months_back_exclusive(today, 3),
            Self::Year => months_back_exclusive(today, 12),
        };
        start.unwrap_or(today)
    }
}

impl Display for HeatmapView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn months_back_exclusive(today: NaiveDate, months: u32) -> Option<NaiveDate> {
    today
        .checked_sub_months(Months::new(months))?
        .checked_add_days(Days::new(1))
}

/// One heatmap cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub count: u32,
    pub intensity: u8,
}

/// Aggregated heatmap for one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heatmap {
    pub view: HeatmapView,
    pub max_count: u32,
    /// Chronological, oldest first.
    pub days: Vec<HeatmapDay>,
}

impl Heatmap {
    /// Consecutive rows of seven days; the last row may be shorter.
    pub fn weeks(&self) -> Vec<&[HeatmapDay]> {
        self.days.chunks(DAYS_PER_ROW).collect()
    }

    pub fn total_count(&self) -> u32 {
        self.days.iter().map(|day| day.count).sum()
    }
}

/// Normalizes `count` against `max_count` onto `0..=MAX_INTENSITY`.
pub fn intensity(count: u32, max_count: u32) -> u8 {
    if max_count == 0 || count == 0 {
        return 0;
    }
    let scaled = (u64::from(count) * u64::from(MAX_INTENSITY)).div_ceil(u64::from(max_count));
    scaled.min(u64::from(MAX_INTENSITY)) as u8
}

/// Builds the heatmap for `view` ending on `today` (inclusive).
pub fn build_heatmap(blocks: &[TimeBlock], view: HeatmapView, today: NaiveDate) -> Heatmap {
    let start = view.window_start(today);

    let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for date in blocks.iter().filter_map(|block| block.date) {
        if date >= start && date <= today {
            *counts.entry(date).or_default() += 1;
        }
    }
    let max_count = counts.values().copied().max().unwrap_or(0);

    let days = start
        .iter_days()
        .take_while(|date| *date <= today)
        .map(|date| {
            let count = counts.get(&date).copied().unwrap_or(0);
            HeatmapDay {
                date,
                count,
                intensity: intensity(count, max_count),
            }
        })
        .collect();

    Heatmap {
        view,
        max_count,
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_heatmap, intensity, HeatmapView, MAX_INTENSITY};
    use crate::model::time_block::{NewTimeBlock, TimeBlock};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn block_on(day: NaiveDate) -> TimeBlock {
        TimeBlock::from_draft(NewTimeBlock {
            date: Some(day),
            ..NewTimeBlock::new("Work", 30)
        })
        .expect("valid block")
    }

    #[test]
    fn intensity_is_zero_for_empty_and_max_for_peak() {
        assert_eq!(intensity(0, 5), 0);
        assert_eq!(intensity(0, 0), 0);
        assert_eq!(intensity(5, 5), MAX_INTENSITY);
        assert_eq!(intensity(1, 5), 1);
        assert_eq!(intensity(3, 5), 3);
        assert_eq!(intensity(4, 5), 4);
    }

    #[test]
    fn week_view_covers_28_days_in_rows_of_seven() {
        let today = date(2024, 5, 31);
        let heatmap = build_heatmap(&[], HeatmapView::Week, today);
        assert_eq!(heatmap.days.len(), 28);
        assert_eq!(heatmap.days[0].date, date(2024, 5, 4));
        assert_eq!(heatmap.days[27].date, today);
        assert_eq!(heatmap.weeks().len(), 4);
        assert!(heatmap.weeks().iter().all(|row| row.len() == 7));
    }

    #[test]
    fn month_and_year_windows_follow_calendar_months() {
        let today = date(2024, 10, 19);
        assert_eq!(HeatmapView::Month.window_start(today), date(2024, 7, 20));
        assert_eq!(HeatmapView::Year.window_start(today), date(2023, 10, 20));
        let heatmap = build_heatmap(&[], HeatmapView::Month, today);
        assert_eq!(heatmap.days.len(), 92);
    }

    #[test]
    fn counts_only_dated_blocks_inside_window() {
        let today = date(2024, 5, 31);
        let mut undated = block_on(today);
        undated.date = None;
        let blocks = vec![
            block_on(today),
            block_on(today),
            block_on(date(2024, 5, 30)),
            block_on(date(2024, 1, 1)),
            undated,
        ];

        let heatmap = build_heatmap(&blocks, HeatmapView::Week, today);
        assert_eq!(heatmap.max_count, 2);
        assert_eq!(heatmap.total_count(), 3);

        let last = heatmap.days.last().expect("today cell");
        assert_eq!((last.count, last.intensity), (2, 4));
        let yesterday = heatmap.days[26];
        assert_eq!((yesterday.count, yesterday.intensity), (1, 2));
        assert_eq!(heatmap.days[0].intensity, 0);
    }

    #[test]
    fn view_preference_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&HeatmapView::Month).expect("serialize"),
            "\"month\""
        );
        assert_eq!(HeatmapView::parse("year"), Some(HeatmapView::Year));
        assert_eq!(HeatmapView::default(), HeatmapView::Week);
    }
}
