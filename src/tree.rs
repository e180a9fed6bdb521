// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Two-level selection tree (day → frame) with cascading checkboxes.
//!
//! A day is selected iff all of its frames are. The tree is rebuilt on every reload; [`toggle`]
//! is the only mutation.
//!
//! [`toggle`]: SelectionTree::toggle

use crate::days::DayGroup;
use crate::frame::Frame;
use chrono::{Duration, NaiveDate};

/// Number of id characters shown in the tree.
pub const SHORT_ID_LEN: usize = 7;

#[derive(Clone, Debug)]
pub struct FrameNode {
    pub frame: Frame,
    pub short_id: String,
    pub selected: bool,
}

#[derive(Clone, Debug)]
pub struct DayNode {
    pub day: NaiveDate,
    pub total: Duration,
    pub selected: bool,
    pub frames: Vec<FrameNode>,
}

/// Position of a node: a day, or a frame within a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRef {
    Day(usize),
    Frame(usize, usize),
}

#[derive(Clone, Debug, Default)]
pub struct SelectionTree {
    days: Vec<DayNode>,
}

fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

impl SelectionTree {
    /// One unselected day node per group, one unselected frame node per frame.
    pub fn build(groups: Vec<DayGroup>) -> Self {
        let days = groups
            .into_iter()
            .map(|g| DayNode {
                day: g.day,
                total: g.total_duration,
                selected: false,
                frames: g
                    .frames
                    .into_iter()
                    .map(|frame| FrameNode {
                        short_id: short_id(&frame.id),
                        frame,
                        selected: false,
                    })
                    .collect(),
            })
            .collect();
        SelectionTree { days }
    }

    pub fn days(&self) -> &[DayNode] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Flips the node. A day pushes its new value to every frame; a frame makes its day the
    /// conjunction of its siblings. Returns false when `node` does not exist.
    pub fn toggle(&mut self, node: NodeRef) -> bool {
        match node {
            NodeRef::Day(d) => {
                let Some(day) = self.days.get_mut(d) else {
                    return false;
                };
                day.selected = !day.selected;
                let value = day.selected;
                for f in &mut day.frames {
                    f.selected = value;
                }
                true
            }
            NodeRef::Frame(d, i) => {
                let Some(day) = self.days.get_mut(d) else {
                    return false;
                };
                let Some(f) = day.frames.get_mut(i) else {
                    return false;
                };
                f.selected = !f.selected;
                day.selected = day.frames.iter().all(|f| f.selected);
                true
            }
        }
    }

    #[cfg(test)]
    pub fn is_selected(&self, node: NodeRef) -> Option<bool> {
        match node {
            NodeRef::Day(d) => self.days.get(d).map(|day| day.selected),
            NodeRef::Frame(d, i) => self.days.get(d)?.frames.get(i).map(|f| f.selected),
        }
    }

    /// The frame at `node`, if it is a frame node.
    pub fn frame(&self, node: NodeRef) -> Option<&Frame> {
        match node {
            NodeRef::Day(_) => None,
            NodeRef::Frame(d, i) => self.days.get(d)?.frames.get(i).map(|f| &f.frame),
        }
    }

    /// Ids of selected frames in tree order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.days
            .iter()
            .flat_map(|d| d.frames.iter())
            .filter(|f| f.selected)
            .map(|f| f.frame.id.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.frames.iter())
            .filter(|f| f.selected)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::group_by_day;
    use chrono::{DateTime, Local, TimeZone};

    fn at(d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap()
    }

    fn frame(id: &str, d: u32, h: u32) -> Frame {
        Frame {
            id: id.to_string(),
            project: "p".into(),
            start: at(d, h),
            stop: at(d, h + 1),
            tags: vec![],
        }
    }

    /// Day 0 (the 6th) holds three frames, day 1 (the 5th) holds one.
    fn sample() -> SelectionTree {
        SelectionTree::build(group_by_day(&[
            frame("5aaaaaaaaaa", 5, 9),
            frame("6aaaaaaaaaa", 6, 9),
            frame("6bbbbbbbbbb", 6, 11),
            frame("6cccccccccc", 6, 13),
        ]))
    }

    #[test]
    fn test_build_empty() {
        let tree = SelectionTree::build(vec![]);
        assert!(tree.is_empty());
        assert!(tree.selected_ids().is_empty());
    }

    #[test]
    fn test_build_unselected_with_short_ids() {
        let tree = sample();
        assert_eq!(tree.days().len(), 2);
        assert_eq!(tree.days()[0].frames.len(), 3);
        assert!(tree.days().iter().all(|d| !d.selected && d.frames.iter().all(|f| !f.selected)));
        assert_eq!(tree.days()[0].frames[0].short_id, "6aaaaaa");
        assert_eq!(tree.days()[1].frames[0].short_id, "5aaaaaa");
    }

    #[test]
    fn test_short_id_of_short_id() {
        let tree = SelectionTree::build(group_by_day(&[frame("abc", 5, 9)]));
        assert_eq!(tree.days()[0].frames[0].short_id, "abc");
    }

    #[test]
    fn test_toggle_day_cascades() {
        let mut tree = sample();
        assert!(tree.toggle(NodeRef::Day(0)));
        assert!(tree.days()[0].frames.iter().all(|f| f.selected));
        assert!(!tree.days()[1].selected);
        assert!(tree.toggle(NodeRef::Day(0)));
        assert!(tree.days()[0].frames.iter().all(|f| !f.selected));
    }

    #[test]
    fn test_toggle_day_overrides_mixed_children() {
        let mut tree = sample();
        tree.toggle(NodeRef::Frame(0, 1));
        tree.toggle(NodeRef::Day(0));
        assert_eq!(tree.is_selected(NodeRef::Day(0)), Some(true));
        assert!(tree.days()[0].frames.iter().all(|f| f.selected));
    }

    #[test]
    fn test_frame_toggle_recomputes_day() {
        let mut tree = sample();
        tree.toggle(NodeRef::Frame(0, 0));
        tree.toggle(NodeRef::Frame(0, 1));
        assert_eq!(tree.is_selected(NodeRef::Day(0)), Some(false));
        tree.toggle(NodeRef::Frame(0, 2));
        assert_eq!(tree.is_selected(NodeRef::Day(0)), Some(true));
        tree.toggle(NodeRef::Frame(0, 1));
        assert_eq!(tree.is_selected(NodeRef::Day(0)), Some(false));
        assert_eq!(tree.is_selected(NodeRef::Frame(0, 0)), Some(true));
    }

    #[test]
    fn test_single_child_day_follows_child() {
        let mut tree = sample();
        tree.toggle(NodeRef::Frame(1, 0));
        assert_eq!(tree.is_selected(NodeRef::Day(1)), Some(true));
        tree.toggle(NodeRef::Frame(1, 0));
        assert_eq!(tree.is_selected(NodeRef::Day(1)), Some(false));
    }

    #[test]
    fn test_toggle_out_of_range() {
        let mut tree = sample();
        assert!(!tree.toggle(NodeRef::Day(9)));
        assert!(!tree.toggle(NodeRef::Frame(0, 9)));
        assert_eq!(tree.is_selected(NodeRef::Frame(9, 0)), None);
        assert_eq!(tree.selected_count(), 0);
    }

    #[test]
    fn test_selected_ids_in_tree_order() {
        let mut tree = sample();
        tree.toggle(NodeRef::Frame(1, 0));
        tree.toggle(NodeRef::Frame(0, 2));
        assert_eq!(tree.selected_ids(), vec!["6cccccccccc", "5aaaaaaaaaa"]);
        assert_eq!(tree.selected_count(), 2);
        assert_eq!(tree.frame(NodeRef::Frame(0, 2)).map(|f| f.id.as_str()), Some("6cccccccccc"));
        assert!(tree.frame(NodeRef::Day(0)).is_none());
    }
}
