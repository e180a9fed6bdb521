// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Frames and the contract of the source that owns them.

use crate::datetime::local_midnight;
use crate::error::PersistenceError;
use chrono::{DateTime, Duration, Local};
use std::collections::BTreeSet;

/// Longest span shown, in days.
pub const MAX_SPAN_DAYS: u32 = 3650;

/// One recorded interval of tracked work.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub id: String,
    pub project: String,
    pub start: DateTime<Local>,
    pub stop: DateTime<Local>,
    pub tags: Vec<String>,
}

impl Frame {
    pub fn duration(&self) -> Duration {
        self.stop - self.start
    }
}

/// The frame being tracked right now; it has no stop time and no id yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Current {
    pub project: String,
    pub tags: Vec<String>,
    pub start: DateTime<Local>,
}

/// Inclusive time window used to filter frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
}

impl Span {
    /// The last `days` calendar days including today: local midnight `days - 1` days ago up to
    /// the end of today. `days` is clamped to `1..=MAX_SPAN_DAYS`.
    pub fn last_days(days: u32, now: DateTime<Local>) -> Span {
        let today = now.date_naive();
        let days = days.clamp(1, MAX_SPAN_DAYS);
        let first = today - Duration::days(i64::from(days) - 1);
        let tomorrow = today + Duration::days(1);
        Span {
            from: local_midnight(first),
            to: local_midnight(tomorrow) - Duration::seconds(1),
        }
    }

    /// A frame belongs to the span when it starts and stops inside it.
    pub fn contains(&self, frame: &Frame) -> bool {
        frame.start >= self.from && frame.stop <= self.to
    }
}

/// Removes empty and repeated tags, keeping first occurrences in order.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .map(str::to_string)
        .collect()
}

/// An opened view of the frame store. Mutations are applied in memory and only reach disk on
/// [`FrameStore::save`].
pub trait FrameStore {
    fn projects(&self) -> BTreeSet<String>;

    fn tags(&self) -> BTreeSet<String>;

    /// Frames inside `span`, ordered by start time.
    fn frames(&self, span: &Span) -> Vec<Frame>;

    fn frame(&self, id: &str) -> Option<Frame>;

    fn current(&self) -> Option<Current>;

    fn is_started(&self) -> bool {
        self.current().is_some()
    }

    fn start(&mut self, project: &str, tags: &[String]) -> Result<Current, PersistenceError>;

    /// Closes the current frame at the present time.
    fn stop(&mut self) -> Result<Frame, PersistenceError>;

    fn add(
        &mut self,
        project: &str,
        tags: &[String],
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<Frame, PersistenceError>;

    fn delete(&mut self, id: &str) -> Result<(), PersistenceError>;

    fn update(
        &mut self,
        id: &str,
        project: &str,
        start: DateTime<Local>,
        stop: DateTime<Local>,
        tags: &[String],
    ) -> Result<Frame, PersistenceError>;

    fn save(&mut self) -> Result<(), PersistenceError>;
}

/// Opens a fresh [`FrameStore`] for every access, so changes made by other programs are seen.
pub trait FrameSource {
    type Store: FrameStore;

    fn open(&self) -> Result<Self::Store, PersistenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Timelike};

    fn frame(start: DateTime<Local>, stop: DateTime<Local>) -> Frame {
        Frame {
            id: "0123456789abcdef".into(),
            project: "p".into(),
            start,
            stop,
            tags: vec![],
        }
    }

    #[test]
    fn test_span_last_days_bounds() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        let span = Span::last_days(7, now);
        assert_eq!(span.from.date_naive(), NaiveDate::from_ymd_opt(2024, 2, 28).unwrap());
        assert_eq!((span.from.hour(), span.from.minute()), (0, 0));
        assert_eq!(span.to.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!((span.to.hour(), span.to.minute(), span.to.second()), (23, 59, 59));
    }

    #[test]
    fn test_span_zero_days_is_today() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        assert_eq!(Span::last_days(0, now), Span::last_days(1, now));
        assert_eq!(Span::last_days(1, now).from.date_naive(), now.date_naive());
    }

    #[test]
    fn test_span_huge_day_count_is_clamped() {
        let now = Local::now();
        assert_eq!(Span::last_days(u32::MAX, now), Span::last_days(MAX_SPAN_DAYS, now));
        assert_eq!(
            Span::last_days(200_000_000, now).from.date_naive(),
            now.date_naive() - Duration::days(i64::from(MAX_SPAN_DAYS) - 1)
        );
    }

    #[test]
    fn test_span_contains_requires_whole_frame() {
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        let span = Span::last_days(1, now);
        let inside = frame(
            Local.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
        );
        let straddles = frame(
            Local.with_ymd_and_hms(2024, 3, 4, 23, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 3, 5, 1, 0, 0).unwrap(),
        );
        assert!(span.contains(&inside));
        assert!(!span.contains(&straddles));
    }

    #[test]
    fn test_normalize_tags() {
        let tags: Vec<String> = ["b", " a ", "", "b", "c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(normalize_tags(&tags), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_frame_duration() {
        let f = frame(
            Local.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap(),
        );
        assert_eq!(f.duration(), Duration::minutes(90));
    }
}
