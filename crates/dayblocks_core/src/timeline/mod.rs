//! Timeline geometry: pointer snapping, block layout and day views.
//!
//! # Responsibility
//! - Map a pointer offset on the timeline surface to a snapped start time.
//! - Map `(start_time, duration)` onto percentages of the visible span.
//! - Split a day's blocks into placed (laid out) and unassigned lists.
//!
//! # Invariants
//! - Snapped start times are multiples of [`SNAP_MINUTES`] past the range
//!   start and always fall inside the range; anything else is rejected.
//! - Overlapping placed blocks never share a lane.
//! - Blocks without a start time are never laid out.

use crate::format::format_time;
use crate::model::clock::ClockTime;
use crate::model::tag::{resolve_tags, Tag};
use crate::model::time_block::TimeBlock;
use chrono::NaiveDate;
use std::fmt::{Display, Formatter};

/// Granularity of drag-computed start times.
pub const SNAP_MINUTES: u32 = 15;
/// Color for blocks with neither an override nor a resolvable tag.
pub const DEFAULT_BLOCK_COLOR: &str = "#adb5bd";

/// Visible hour span of a timeline surface, `start_hour..end_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HourRange {
    start_hour: u32,
    end_hour: u32,
}

impl HourRange {
    pub const FULL_DAY: Self = Self {
        start_hour: 0,
        end_hour: 24,
    };
    pub const BUSINESS_HOURS: Self = Self {
        start_hour: 8,
        end_hour: 18,
    };

    /// Returns `None` unless `start_hour < end_hour <= 24`.
    pub fn new(start_hour: u32, end_hour: u32) -> Option<Self> {
        (start_hour < end_hour && end_hour <= 24).then_some(Self {
            start_hour,
            end_hour,
        })
    }

    /// Parses `full` / `business`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "full_day" => Some(Self::FULL_DAY),
            "business" | "business_hours" => Some(Self::BUSINESS_HOURS),
            _ => None,
        }
    }

    pub fn start_hour(self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(self) -> u32 {
        self.end_hour
    }

    pub fn start_minutes(self) -> u32 {
        self.start_hour * 60
    }

    pub fn end_minutes(self) -> u32 {
        self.end_hour * 60
    }

    pub fn span_minutes(self) -> u32 {
        self.end_minutes() - self.start_minutes()
    }

    pub fn hours(self) -> impl Iterator<Item = u32> {
        self.start_hour..self.end_hour
    }
}

impl Default for HourRange {
    fn default() -> Self {
        Self::FULL_DAY
    }
}

impl Display for HourRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.start_hour, self.end_hour)
    }
}

/// Computes the snapped start time for a pointer `offset_y` pixels below the
/// top of a surface `surface_height` pixels tall.
///
/// Returns `None` when the position maps outside `range`.
pub fn snap_start_time(offset_y: f64, surface_height: f64, range: HourRange) -> Option<ClockTime> {
    if !offset_y.is_finite() || !surface_height.is_finite() {
        return None;
    }
    if surface_height <= 0.0 || offset_y < 0.0 {
        return None;
    }

    let span = f64::from(range.span_minutes());
    let snap = f64::from(SNAP_MINUTES);
    let raw_minutes = (offset_y / surface_height * span).floor();
    let snapped = (raw_minutes / snap).round() * snap;
    let absolute = f64::from(range.start_minutes()) + snapped;

    let hour = (absolute / 60.0).floor();
    if hour < f64::from(range.start_hour) || hour >= f64::from(range.end_hour) {
        return None;
    }
    ClockTime::from_minutes_since_midnight(absolute as u32).ok()
}

/// Vertical placement as percentages of the visible span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockLayout {
    pub top_percent: f64,
    pub height_percent: f64,
}

/// Linear map of `(start, duration)` onto the range.
///
/// Values may fall outside `0..=100` for blocks crossing the range edges;
/// the renderer clips them.
pub fn layout_block(start: ClockTime, duration: u32, range: HourRange) -> BlockLayout {
    let span = f64::from(range.span_minutes());
    let offset = f64::from(start.minutes_since_midnight()) - f64::from(range.start_minutes());
    BlockLayout {
        top_percent: offset / span * 100.0,
        height_percent: f64::from(duration) / span * 100.0,
    }
}

/// Hour gridline with its 12-hour label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourMarker {
    pub hour: u32,
    pub label: String,
}

pub fn hour_markers(range: HourRange) -> Vec<HourMarker> {
    range
        .hours()
        .map(|hour| HourMarker {
            hour,
            label: format_time(hour),
        })
        .collect()
}

/// Display color: override, else first resolvable tag color, else default.
pub fn display_color(block: &TimeBlock, tags: &[Tag]) -> String {
    if let Some(color) = &block.color {
        return color.clone();
    }
    resolve_tags(&block.tag_ids, tags)
        .first()
        .map_or_else(|| DEFAULT_BLOCK_COLOR.to_string(), |tag| tag.color.clone())
}

/// A block laid out on the day view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBlock {
    pub block: TimeBlock,
    pub layout: BlockLayout,
    /// Zero-based column inside its overlap group.
    pub lane: usize,
    /// Number of columns in its overlap group.
    pub lane_count: usize,
    pub color: String,
}

/// Everything needed to render one day of the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DayView {
    pub date: NaiveDate,
    pub range: HourRange,
    pub markers: Vec<HourMarker>,
    /// Sorted by start time.
    pub placed: Vec<PlacedBlock>,
    pub unassigned: Vec<TimeBlock>,
}

/// Builds the view of `date` for `range`.
///
/// Placed blocks are those with a start time overlapping the range whose date
/// is `date`, or unset (records written before blocks carried dates).
pub fn build_day_view(
    blocks: &[TimeBlock],
    tags: &[Tag],
    date: NaiveDate,
    range: HourRange,
) -> DayView {
    let mut on_day: Vec<(&TimeBlock, u32, u32)> = blocks
        .iter()
        .filter(|block| block.date.map_or(true, |block_date| block_date == date))
        .filter_map(|block| {
            let start = block.start_time?.minutes_since_midnight();
            let end = start.saturating_add(block.duration);
            (start < range.end_minutes() && end > range.start_minutes())
                .then_some((block, start, end))
        })
        .collect();
    on_day.sort_by(|a, b| a.1.cmp(&b.1).then(a.2.cmp(&b.2)));

    let intervals: Vec<(u32, u32)> = on_day.iter().map(|(_, start, end)| (*start, *end)).collect();
    let lanes = assign_lanes(&intervals);

    let placed = on_day
        .into_iter()
        .zip(lanes)
        .filter_map(|((block, _, _), (lane, lane_count))| {
            let start = block.start_time?;
            Some(PlacedBlock {
                layout: layout_block(start, block.duration, range),
                lane,
                lane_count,
                color: display_color(block, tags),
                block: block.clone(),
            })
        })
        .collect();

    let unassigned = blocks
        .iter()
        .filter(|block| !block.is_assigned())
        .cloned()
        .collect();

    DayView {
        date,
        range,
        markers: hour_markers(range),
        placed,
        unassigned,
    }
}

/// Greedy interval partitioning over `(start, end)` pairs sorted by start.
///
/// Returns `(lane, lane_count)` per interval; `lane_count` is shared by every
/// member of a transitively overlapping group.
fn assign_lanes(intervals: &[(u32, u32)]) -> Vec<(usize, usize)> {
    let mut result = vec![(0, 1); intervals.len()];
    let mut group_start = 0;
    let mut group_end = 0;
    let mut lane_ends: Vec<u32> = Vec::new();

    for (index, &(start, end)) in intervals.iter().enumerate() {
        if index > 0 && start >= group_end {
            close_group(&mut result[group_start..index], lane_ends.len());
            lane_ends.clear();
            group_start = index;
        }

        let lane = match lane_ends.iter().position(|&lane_end| lane_end <= start) {
            Some(free) => {
                lane_ends[free] = end;
                free
            }
            None => {
                lane_ends.push(end);
                lane_ends.len() - 1
            }
        };
        result[index].0 = lane;
        group_end = if index == group_start { end } else { group_end.max(end) };
    }
    close_group(&mut result[group_start..], lane_ends.len());
    result
}

fn close_group(members: &mut [(usize, usize)], lane_count: usize) {
    for member in members {
        member.1 = lane_count.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        assign_lanes, build_day_view, display_color, hour_markers, layout_block,
        snap_start_time, HourRange, DEFAULT_BLOCK_COLOR,
    };
    use crate::model::clock::ClockTime;
    use crate::model::tag::default_tags;
    use crate::model::time_block::{NewTimeBlock, TimeBlock};
    use chrono::NaiveDate;

    const FULL_DAY_PX: f64 = 1440.0;

    fn at(hour: u32, minute: u32) -> ClockTime {
        ClockTime::new(hour, minute).expect("valid time")
    }

    fn placed_block(title: &str, start: ClockTime, duration: u32, date: Option<NaiveDate>) -> TimeBlock {
        TimeBlock::from_draft(NewTimeBlock {
            start_time: Some(start),
            date,
            ..NewTimeBlock::new(title, duration)
        })
        .expect("valid block")
    }

    #[test]
    fn snaps_to_nearest_quarter_hour() {
        let range = HourRange::FULL_DAY;
        assert_eq!(snap_start_time(607.0, FULL_DAY_PX, range), Some(at(10, 0)));
        assert_eq!(snap_start_time(608.0, FULL_DAY_PX, range), Some(at(10, 15)));
        assert_eq!(snap_start_time(0.0, FULL_DAY_PX, range), Some(at(0, 0)));
    }

    #[test]
    fn snapped_minutes_are_always_quarter_hours() {
        for offset in 0..1432 {
            let time = snap_start_time(f64::from(offset), FULL_DAY_PX, HourRange::FULL_DAY)
                .expect("inside range");
            assert_eq!(time.minute() % 15, 0, "offset={offset}");
        }
    }

    #[test]
    fn rejects_positions_outside_range() {
        let range = HourRange::FULL_DAY;
        assert_eq!(snap_start_time(-1.0, FULL_DAY_PX, range), None);
        assert_eq!(snap_start_time(1500.0, FULL_DAY_PX, range), None);
        assert_eq!(snap_start_time(1435.0, FULL_DAY_PX, range), None);
        assert_eq!(snap_start_time(10.0, 0.0, range), None);
        assert_eq!(snap_start_time(f64::NAN, FULL_DAY_PX, range), None);
    }

    #[test]
    fn business_hours_offsets_from_range_start() {
        let range = HourRange::BUSINESS_HOURS;
        assert_eq!(snap_start_time(0.0, 600.0, range), Some(at(8, 0)));
        assert_eq!(snap_start_time(127.0, 600.0, range), Some(at(10, 0)));
        assert_eq!(snap_start_time(600.0, 600.0, range), None);
    }

    #[test]
    fn hour_range_rejects_inverted_or_oversized_spans() {
        assert!(HourRange::new(9, 9).is_none());
        assert!(HourRange::new(20, 25).is_none());
        assert_eq!(HourRange::new(8, 18), Some(HourRange::BUSINESS_HOURS));
        assert_eq!(HourRange::parse("business"), Some(HourRange::BUSINESS_HOURS));
    }

    #[test]
    fn layout_is_linear_in_start_and_duration() {
        let layout = layout_block(at(6, 0), 90, HourRange::FULL_DAY);
        assert!((layout.top_percent - 25.0).abs() < 1e-9);
        assert!((layout.height_percent - 6.25).abs() < 1e-9);

        let business = layout_block(at(13, 0), 60, HourRange::BUSINESS_HOURS);
        assert!((business.top_percent - 50.0).abs() < 1e-9);
        assert!((business.height_percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn markers_carry_twelve_hour_labels() {
        let markers = hour_markers(HourRange::FULL_DAY);
        assert_eq!(markers.len(), 24);
        assert_eq!(markers[0].label, "12 AM");
        assert_eq!(markers[13].label, "1 PM");
    }

    #[test]
    fn color_prefers_override_then_first_live_tag() {
        let tags = default_tags();
        let mut block = placed_block("Read", at(9, 0), 30, None);
        assert_eq!(display_color(&block, &tags), DEFAULT_BLOCK_COLOR);

        block.tag_ids = vec!["deleted".to_string(), "4".to_string()];
        assert_eq!(display_color(&block, &tags), "#ffbe0b");

        block.color = Some("#000000".to_string());
        assert_eq!(display_color(&block, &tags), "#000000");
    }

    #[test]
    fn lanes_separate_overlapping_blocks() {
        let lanes = assign_lanes(&[(0, 60), (30, 90), (60, 120), (200, 230)]);
        assert_eq!(lanes, vec![(0, 2), (1, 2), (0, 2), (0, 1)]);
    }

    #[test]
    fn day_view_splits_placed_and_unassigned() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date");
        let other_day = day.succ_opt().expect("next day");
        let unassigned = TimeBlock::from_draft(NewTimeBlock::new("Backlog", 20)).expect("valid");
        let blocks = vec![
            placed_block("Late", at(14, 0), 30, Some(day)),
            placed_block("Early", at(9, 0), 60, Some(day)),
            placed_block("Tomorrow", at(9, 0), 60, Some(other_day)),
            placed_block("Legacy", at(11, 0), 15, None),
            unassigned.clone(),
        ];

        let view = build_day_view(&blocks, &default_tags(), day, HourRange::FULL_DAY);
        let titles: Vec<_> = view
            .placed
            .iter()
            .map(|placed| placed.block.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Early", "Legacy", "Late"]);
        assert_eq!(view.unassigned, vec![unassigned]);
        assert_eq!(view.markers.len(), 24);
    }

    #[test]
    fn business_view_drops_blocks_entirely_outside_range() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date");
        let blocks = vec![
            placed_block("Night", at(22, 0), 60, Some(day)),
            placed_block("Commute", at(7, 30), 60, Some(day)),
        ];
        let view = build_day_view(&blocks, &[], day, HourRange::BUSINESS_HOURS);
        assert_eq!(view.placed.len(), 1);
        assert_eq!(view.placed[0].block.title, "Commute");
        assert!(view.placed[0].layout.top_percent < 0.0);
    }

    #[test]
    fn oversized_duration_clamps_instead_of_overflowing() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).expect("valid date");
        let blocks = vec![
            placed_block("Marathon", at(10, 0), u32::MAX, Some(day)),
            placed_block("Lunch", at(12, 0), 30, Some(day)),
        ];
        let view = build_day_view(&blocks, &[], day, HourRange::FULL_DAY);
        assert_eq!(view.placed.len(), 2);
        assert_eq!(view.placed[0].lane_count, 2);
        assert!(view.placed[0].layout.height_percent > 100.0);
    }
}
