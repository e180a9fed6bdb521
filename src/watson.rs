// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Frame source backed by a Watson data directory.
//!
//! ## Files
//!
//! - `frames`: JSON array of `[start, stop, project, id, tags, updated_at]` rows, unix seconds.
//!   Rows written by old Watson versions may lack `tags` and `updated_at`.
//! - `state`: `{}` when idle, otherwise `{"project": ..., "start": ..., "tags": [...]}`.
//!
//! Both files are replaced atomically (sibling temp file, then rename) and only when changed.

use crate::datetime::from_epoch;
use crate::error::PersistenceError;
use crate::frame::{normalize_tags, Current, Frame, FrameSource, FrameStore, Span};
use chrono::{DateTime, Local, SubsecRound};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const FRAMES_FILE: &str = "frames";
const STATE_FILE: &str = "state";

/// One row of the `frames` file.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct FrameRow(
    i64,
    i64,
    String,
    String,
    #[serde(default)] Vec<String>,
    #[serde(default)] Option<i64>,
);

impl FrameRow {
    fn id(&self) -> &str {
        &self.3
    }

    fn to_frame(&self) -> Option<Frame> {
        Some(Frame {
            id: self.3.clone(),
            project: self.2.clone(),
            start: from_epoch(self.0)?,
            stop: from_epoch(self.1)?,
            tags: self.4.clone(),
        })
    }
}

/// Contents of the `state` file; every field absent means idle.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
}

/// A Watson data directory. Every [`FrameSource::open`] re-reads it from disk.
#[derive(Clone, Debug)]
pub struct WatsonDir {
    dir: PathBuf,
}

impl WatsonDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        WatsonDir { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl FrameSource for WatsonDir {
    type Store = WatsonStore;

    fn open(&self) -> Result<WatsonStore, PersistenceError> {
        WatsonStore::load(&self.dir)
    }
}

/// In-memory copy of a Watson directory; see [`FrameStore`].
#[derive(Debug)]
pub struct WatsonStore {
    dir: PathBuf,
    rows: Vec<FrameRow>,
    current: Option<Current>,
    frames_dirty: bool,
    state_dirty: bool,
}

/// Reads a JSON file; a missing or blank file yields `T::default()`.
fn load_json<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> Result<T, PersistenceError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&content).map_err(|source| PersistenceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `bytes` to a sibling temp file and renames it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    let write_err = |source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}

fn now() -> DateTime<Local> {
    Local::now().trunc_subsecs(0)
}

fn check_project(project: &str) -> Result<&str, PersistenceError> {
    let project = project.trim();
    if project.is_empty() {
        return Err(PersistenceError::Rejected("No project given.".to_string()));
    }
    Ok(project)
}

fn check_interval(start: &DateTime<Local>, stop: &DateTime<Local>) -> Result<(), PersistenceError> {
    if stop < start {
        return Err(PersistenceError::Rejected(
            "Task cannot end before it starts.".to_string(),
        ));
    }
    if *start > now() {
        return Err(PersistenceError::Rejected(
            "Task cannot start in the future.".to_string(),
        ));
    }
    Ok(())
}

impl WatsonStore {
    /// Loads `frames` and `state` from `dir`. A directory that does not exist yet is empty.
    pub fn load(dir: &Path) -> Result<Self, PersistenceError> {
        let frames_path = dir.join(FRAMES_FILE);
        let state_path = dir.join(STATE_FILE);
        let rows: Vec<FrameRow> = load_json(&frames_path)?;
        let state: StateFile = load_json(&state_path)?;
        let current = match (state.project, state.start) {
            (Some(project), Some(start)) => {
                let start = from_epoch(start).ok_or_else(|| {
                    PersistenceError::Rejected(format!(
                        "{} has an invalid start time: {}",
                        state_path.display(),
                        start
                    ))
                })?;
                Some(Current {
                    project,
                    tags: state.tags.unwrap_or_default(),
                    start,
                })
            }
            _ => None,
        };
        debug!(dir = %dir.display(), frames = rows.len(), started = current.is_some(), "loaded watson data");
        Ok(WatsonStore {
            dir: dir.to_path_buf(),
            rows,
            current,
            frames_dirty: false,
            state_dirty: false,
        })
    }

    fn position(&self, id: &str) -> Result<usize, PersistenceError> {
        self.rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| PersistenceError::UnknownFrame(id.to_string()))
    }

    fn push_frame(
        &mut self,
        project: &str,
        tags: &[String],
        start: DateTime<Local>,
        stop: DateTime<Local>,
    ) -> Frame {
        let frame = Frame {
            id: Uuid::new_v4().simple().to_string(),
            project: project.to_string(),
            start,
            stop,
            tags: normalize_tags(tags),
        };
        self.rows.push(FrameRow(
            start.timestamp(),
            stop.timestamp(),
            frame.project.clone(),
            frame.id.clone(),
            frame.tags.clone(),
            Some(now().timestamp()),
        ));
        self.frames_dirty = true;
        frame
    }
}

impl FrameStore for WatsonStore {
    fn projects(&self) -> BTreeSet<String> {
        self.rows.iter().map(|r| r.2.clone()).collect()
    }

    fn tags(&self) -> BTreeSet<String> {
        self.rows.iter().flat_map(|r| r.4.iter().cloned()).collect()
    }

    fn frames(&self, span: &Span) -> Vec<Frame> {
        let mut frames: Vec<Frame> = self
            .rows
            .iter()
            .filter_map(FrameRow::to_frame)
            .filter(|f| span.contains(f))
            .collect();
        frames.sort_by_key(|f| f.start);
        frames
    }

    fn frame(&self, id: &str) -> Option<Frame> {
        self.rows.iter().find(|r| r.id() == id).and_then(FrameRow::to_frame)
    }

    fn current(&self) -> Option<Current> {
        self.current.clone()
    }

    fn start(&mut self, project: &str, tags: &[String]) -> Result<Current, PersistenceError> {
        let project = check_project(project)?;
        if let Some(current) = &self.current {
            return Err(PersistenceError::Rejected(format!(
                "Project {} is already started.",
                current.project
            )));
        }
        let current = Current {
            project: project.to_string(),
            tags: normalize_tags(tags),
            start: now(),
        };
        self.current = Some(current.clone());
        self.state_dirty = true;
        Ok(current)
    }

    fn stop(&mut self) -> Result<Frame, PersistenceError> {
        let current = self
            .current
            .take()
            .ok_or_else(|| PersistenceError::Rejected("No project started.".to_string()))?;
        let stop = now().max(current.start);
        self.state_dirty = true;
        Ok(self.push_frame(&current.project, &current.tags, current.start, stop))
    }

    fn add(
        &mut self,
        project: &str,
        tags: &[String],
        from: DateTime<Local>,
        to: DateTime<Local>,
    ) -> Result<Frame, PersistenceError> {
        let project = check_project(project)?;
        check_interval(&from, &to)?;
        Ok(self.push_frame(project, tags, from.trunc_subsecs(0), to.trunc_subsecs(0)))
    }

    fn delete(&mut self, id: &str) -> Result<(), PersistenceError> {
        let pos = self.position(id)?;
        self.rows.remove(pos);
        self.frames_dirty = true;
        Ok(())
    }

    fn update(
        &mut self,
        id: &str,
        project: &str,
        start: DateTime<Local>,
        stop: DateTime<Local>,
        tags: &[String],
    ) -> Result<Frame, PersistenceError> {
        let project = check_project(project)?;
        check_interval(&start, &stop)?;
        let pos = self.position(id)?;
        let row = FrameRow(
            start.timestamp(),
            stop.timestamp(),
            project.to_string(),
            id.to_string(),
            normalize_tags(tags),
            Some(now().timestamp()),
        );
        let frame = row
            .to_frame()
            .ok_or_else(|| PersistenceError::Rejected(format!("frame {} is out of range", id)))?;
        self.rows[pos] = row;
        self.frames_dirty = true;
        Ok(frame)
    }

    fn save(&mut self) -> Result<(), PersistenceError> {
        if self.frames_dirty {
            let path = self.dir.join(FRAMES_FILE);
            let bytes = serde_json::to_vec_pretty(&self.rows).map_err(|source| {
                PersistenceError::Json {
                    path: path.clone(),
                    source,
                }
            })?;
            write_atomic(&path, &bytes)?;
            self.frames_dirty = false;
        }
        if self.state_dirty {
            let path = self.dir.join(STATE_FILE);
            let state = match &self.current {
                Some(c) => StateFile {
                    project: Some(c.project.clone()),
                    start: Some(c.start.timestamp()),
                    tags: Some(c.tags.clone()),
                },
                None => StateFile::default(),
            };
            let bytes = serde_json::to_vec_pretty(&state).map_err(|source| {
                PersistenceError::Json {
                    path: path.clone(),
                    source,
                }
            })?;
            write_atomic(&path, &bytes)?;
            self.state_dirty = false;
        }
        debug!(dir = %self.dir.display(), "saved watson data");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn everything() -> Span {
        Span {
            from: Local.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap(),
            to: Local::now() + Duration::days(1),
        }
    }

    #[test]
    fn test_open_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = WatsonDir::new(dir.path().join("nope")).open().unwrap();
        assert!(store.frames(&everything()).is_empty());
        assert!(!store.is_started());
        assert!(store.projects().is_empty());
    }

    #[test]
    fn test_reads_legacy_rows() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("frames"),
            r#"[[1700000000, 1700003600, "old", "aaaaaaaaaaaa"],
                [1700007200, 1700010800, "new", "bbbbbbbbbbbb", ["x", "y"], 1700010900]]"#,
        )
        .unwrap();
        let store = WatsonDir::new(dir.path()).open().unwrap();
        let frames = store.frames(&everything());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].project, "old");
        assert!(frames[0].tags.is_empty());
        assert_eq!(frames[1].tags, tags(&["x", "y"]));
        assert_eq!(store.projects().into_iter().collect::<Vec<_>>(), vec!["new", "old"]);
        assert_eq!(store.tags().into_iter().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_invalid_json_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("frames"), "[[1, 2").unwrap();
        let err = WatsonDir::new(dir.path()).open().unwrap_err();
        assert!(matches!(err, PersistenceError::Json { .. }));
    }

    #[test]
    fn test_start_stop_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = WatsonDir::new(dir.path());
        let mut store = source.open().unwrap();
        let current = store.start("writing", &tags(&["x", "x", "y"])).unwrap();
        assert_eq!(current.tags, tags(&["x", "y"]));
        store.save().unwrap();

        let state = fs::read_to_string(dir.path().join("state")).unwrap();
        assert!(state.contains("\"project\": \"writing\""));

        let mut store = source.open().unwrap();
        assert_eq!(store.current().map(|c| c.project), Some("writing".to_string()));
        let frame = store.stop().unwrap();
        assert_eq!(frame.id.len(), 32);
        assert!(frame.stop >= frame.start);
        store.save().unwrap();

        let store = source.open().unwrap();
        assert!(!store.is_started());
        assert_eq!(store.frame(&frame.id).map(|f| f.project), Some("writing".to_string()));
        let state: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("state")).unwrap()).unwrap();
        assert_eq!(state, serde_json::json!({}));
        assert!(!dir.path().join("frames.tmp").exists());
    }

    #[test]
    fn test_start_twice_and_stop_idle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatsonDir::new(dir.path()).open().unwrap();
        assert!(matches!(store.stop(), Err(PersistenceError::Rejected(_))));
        store.start("a", &[]).unwrap();
        assert!(matches!(store.start("b", &[]), Err(PersistenceError::Rejected(_))));
        assert!(matches!(store.start("  ", &[]), Err(PersistenceError::Rejected(_))));
    }

    #[test]
    fn test_add_validates_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatsonDir::new(dir.path()).open().unwrap();
        let from = Local.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap();
        let to = Local.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        assert!(matches!(store.add("a", &[], from, to), Err(PersistenceError::Rejected(_))));
        let future = Local::now() + Duration::days(2);
        assert!(matches!(
            store.add("a", &[], future, future + Duration::hours(1)),
            Err(PersistenceError::Rejected(_))
        ));
        let frame = store.add("a", &tags(&["t"]), to, from).unwrap();
        assert_eq!(frame.duration(), Duration::hours(1));
    }

    #[test]
    fn test_delete_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let source = WatsonDir::new(dir.path());
        let mut store = source.open().unwrap();
        let start = Local.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let a = store.add("a", &[], start, start + Duration::hours(1)).unwrap();
        let b = store.add("b", &[], start + Duration::hours(2), start + Duration::hours(3)).unwrap();
        store.save().unwrap();

        let mut store = source.open().unwrap();
        store.delete(&a.id).unwrap();
        assert!(matches!(store.delete(&a.id), Err(PersistenceError::UnknownFrame(_))));
        let edited = store
            .update(&b.id, "c", start, start + Duration::minutes(30), &tags(&["z"]))
            .unwrap();
        assert_eq!(edited.id, b.id);
        store.save().unwrap();

        let store = source.open().unwrap();
        let frames = store.frames(&everything());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].project, "c");
        assert_eq!(frames[0].tags, tags(&["z"]));
        assert_eq!(frames[0].duration(), Duration::minutes(30));
    }

    #[test]
    fn test_update_unknown_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatsonDir::new(dir.path()).open().unwrap();
        let start = Local.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let err = store.update("missing", "a", start, start, &[]).unwrap_err();
        assert!(matches!(err, PersistenceError::UnknownFrame(id) if id == "missing"));
    }

    #[test]
    fn test_frames_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatsonDir::new(dir.path()).open().unwrap();
        let day = Local.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        store.add("late", &[], day, day + Duration::hours(1)).unwrap();
        store.add("early", &[], day - Duration::hours(3), day - Duration::hours(2)).unwrap();
        store.add("old", &[], day - Duration::days(30), day - Duration::days(30) + Duration::hours(1)).unwrap();
        let span = Span::last_days(7, day);
        let names: Vec<String> = store.frames(&span).into_iter().map(|f| f.project).collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[test]
    fn test_save_without_changes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = WatsonDir::new(dir.path()).open().unwrap();
        store.save().unwrap();
        assert!(!dir.path().join("frames").exists());
        assert!(!dir.path().join("state").exists());
    }
}
