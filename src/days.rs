// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Groups frames by the local calendar day they start on.

use crate::frame::Frame;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// Frames that started on one calendar day.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGroup {
    pub day: NaiveDate,
    pub frames: Vec<Frame>,
    pub total_duration: Duration,
}

/// Groups `frames` by local start day, newest day first. Frames keep their input order inside
/// a group. An empty input gives an empty result.
pub fn group_by_day(frames: &[Frame]) -> Vec<DayGroup> {
    let mut by_day: BTreeMap<NaiveDate, Vec<Frame>> = BTreeMap::new();
    for frame in frames {
        by_day
            .entry(frame.start.date_naive())
            .or_default()
            .push(frame.clone());
    }
    by_day
        .into_iter()
        .rev()
        .map(|(day, frames)| {
            let total_duration = frames
                .iter()
                .fold(Duration::zero(), |acc, f| acc + f.duration());
            DayGroup {
                day,
                frames,
                total_duration,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Local, TimeZone};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn frame(project: &str, start: DateTime<Local>, stop: DateTime<Local>) -> Frame {
        Frame {
            id: format!("{}-0000000000", project),
            project: project.to_string(),
            start,
            stop,
            tags: vec![],
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_day(&[]).is_empty());
    }

    #[test]
    fn test_same_day_scenario() {
        let frames = vec![
            frame("A", at(5, 9, 0), at(5, 10, 0)),
            frame("B", at(5, 10, 0), at(5, 10, 30)),
        ];
        let groups = group_by_day(&frames);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].day, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(groups[0].total_duration, Duration::minutes(90));
        let names: Vec<&str> = groups[0].frames.iter().map(|f| f.project.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_days_strictly_descending() {
        let frames = vec![
            frame("a", at(3, 9, 0), at(3, 10, 0)),
            frame("b", at(7, 9, 0), at(7, 10, 0)),
            frame("c", at(3, 11, 0), at(3, 12, 0)),
            frame("d", at(5, 9, 0), at(5, 9, 15)),
            frame("e", at(7, 8, 0), at(7, 8, 5)),
        ];
        let groups = group_by_day(&frames);
        let days: Vec<u32> = groups.iter().map(|g| chrono::Datelike::day(&g.day)).collect();
        assert_eq!(days, vec![7, 5, 3]);
        assert!(groups.windows(2).all(|w| w[0].day > w[1].day));
    }

    #[test]
    fn test_source_order_kept_within_day() {
        let frames = vec![
            frame("late", at(5, 15, 0), at(5, 16, 0)),
            frame("early", at(5, 8, 0), at(5, 9, 0)),
        ];
        let groups = group_by_day(&frames);
        assert_eq!(groups[0].frames[0].project, "late");
        assert_eq!(groups[0].frames[1].project, "early");
    }

    #[test]
    fn test_total_is_sum_regardless_of_order() {
        let mut frames = vec![
            frame("a", at(5, 9, 0), at(5, 9, 20)),
            frame("b", at(5, 10, 0), at(5, 11, 45)),
            frame("c", at(5, 13, 0), at(5, 13, 1)),
        ];
        let expected: Duration = frames.iter().fold(Duration::zero(), |a, f| a + f.duration());
        assert_eq!(group_by_day(&frames)[0].total_duration, expected);
        frames.reverse();
        assert_eq!(group_by_day(&frames)[0].total_duration, expected);
    }

    #[test]
    fn test_frame_crossing_midnight_counts_on_start_day() {
        let frames = vec![frame("night", at(5, 23, 0), at(6, 1, 0))];
        let groups = group_by_day(&frames);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].day, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(groups[0].total_duration, Duration::hours(2));
    }
}
