// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Main view state: tracking status, the selection tree, pending notices, and the dispatch of
//! UI actions to frame-source operations.
//!
//! Every mutating action opens the frame source, applies the change, saves once, and then
//! reloads everything whether or not it succeeded. Failures become [`Notice`]s; none is fatal.

use crate::days::group_by_day;
use crate::dialog::{DialogKind, DialogResult, FrameDraft, FrameForm};
use crate::error::{ActionError, PersistenceError, StateMismatchError};
use crate::frame::{Current, FrameSource, FrameStore, Span};
use crate::tree::{NodeRef, SelectionTree};
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use tracing::{debug, error, info, warn};

/// Span shown when nothing else is configured.
pub const DEFAULT_SPAN_DAYS: u32 = 7;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking(Current),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// A message box waiting to be shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notice {
            kind: NoticeKind::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Everything the UI can ask the main view to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Reload,
    /// Periodic check for changes made outside this program.
    Poll,
    Start {
        project: String,
        tags: Vec<String>,
    },
    Stop,
    Add {
        project: String,
        tags: Vec<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    Edit {
        id: String,
        project: String,
        tags: Vec<String>,
        start: DateTime<Local>,
        end: DateTime<Local>,
    },
    DeleteSelected,
    Toggle(NodeRef),
    SetSpanDays(u32),
}

impl Action {
    /// The action a closed dialog asks for; `None` when it was cancelled.
    pub fn from_dialog(kind: &DialogKind, result: DialogResult) -> Option<Action> {
        let DialogResult::Confirmed(FrameDraft {
            project,
            tags,
            interval,
        }) = result
        else {
            return None;
        };
        match (kind, interval) {
            (DialogKind::Start, _) => Some(Action::Start { project, tags }),
            (DialogKind::Add, Some((start, end))) => Some(Action::Add {
                project,
                tags,
                start,
                end,
            }),
            (DialogKind::Edit(id), Some((start, end))) => Some(Action::Edit {
                id: id.clone(),
                project,
                tags,
                start,
                end,
            }),
            _ => None,
        }
    }
}

pub struct MainView<S: FrameSource> {
    source: S,
    span_days: u32,
    state: TrackingState,
    tree: SelectionTree,
    projects: Vec<String>,
    tags: Vec<String>,
    notices: VecDeque<Notice>,
}

impl<S: FrameSource> MainView<S> {
    /// Creates the view and performs the first reload.
    pub fn new(source: S, span_days: u32) -> Self {
        let mut view = MainView {
            source,
            span_days: span_days.max(1),
            state: TrackingState::Idle,
            tree: SelectionTree::default(),
            projects: Vec::new(),
            tags: Vec::new(),
            notices: VecDeque::new(),
        };
        view.reload();
        view
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackingState::Tracking(_))
    }

    pub fn tree(&self) -> &SelectionTree {
        &self.tree
    }

    pub fn span_days(&self) -> u32 {
        self.span_days
    }

    #[cfg(test)]
    pub fn projects(&self) -> &[String] {
        &self.projects
    }

    #[cfg(test)]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// The oldest notice not yet dismissed.
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) {
        self.notices.pop_front();
    }

    /// Queues a notice behind any already waiting.
    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn start_form(&self) -> FrameForm {
        FrameForm::for_start(self.projects.clone(), self.tags.clone())
    }

    pub fn add_form(&self, now: DateTime<Local>) -> FrameForm {
        FrameForm::for_add(self.projects.clone(), self.tags.clone(), now)
    }

    /// Edit form for the frame at `node`; `None` for day nodes.
    pub fn edit_form(&self, node: NodeRef) -> Option<FrameForm> {
        let frame = self.tree.frame(node)?;
        Some(FrameForm::for_edit(frame, self.projects.clone(), self.tags.clone()))
    }

    /// Runs one action. On failure the error has already been queued as a notice and the view
    /// reloaded; it is returned for callers that want to react further.
    pub fn dispatch(&mut self, action: Action) -> Result<(), ActionError> {
        debug!(?action, "dispatch");
        let result = match action {
            Action::Reload => {
                self.reload();
                Ok(())
            }
            Action::Poll => {
                self.poll();
                Ok(())
            }
            Action::Start { project, tags } => self.start(&project, &tags),
            Action::Stop => self.stop(),
            Action::Add {
                project,
                tags,
                start,
                end,
            } => self.mutate(|store| {
                let frame = store.add(&project, &tags, start, end)?;
                info!(id = %frame.id, project = %frame.project, "added frame");
                Ok(())
            }),
            Action::Edit {
                id,
                project,
                tags,
                start,
                end,
            } => self.mutate(|store| {
                let before = store
                    .frame(&id)
                    .ok_or_else(|| PersistenceError::UnknownFrame(id.clone()))?;
                store.update(&id, &project, start, end, &tags)?;
                info!(id = %id, from = %before.project, to = %project, "edited frame");
                Ok(())
            }),
            Action::DeleteSelected => self.delete_selected(),
            Action::Toggle(node) => {
                self.tree.toggle(node);
                Ok(())
            }
            Action::SetSpanDays(days) => {
                self.span_days = days.max(1);
                self.reload();
                Ok(())
            }
        };
        if let Err(e) = &result {
            warn!(error = %e, "action failed");
            self.notices.push_back(Notice::error(e.title(), e.to_string()));
        }
        result
    }

    /// Rebuilds the tree and tracking state from the frame source. A source that cannot be
    /// opened leaves an empty tree and an error notice.
    pub fn reload(&mut self) {
        match self.source.open() {
            Ok(store) => {
                let span = Span::last_days(self.span_days, Local::now());
                let frames = store.frames(&span);
                debug!(frames = frames.len(), days = self.span_days, "reload");
                self.tree = SelectionTree::build(group_by_day(&frames));
                self.state = match store.current() {
                    Some(current) => TrackingState::Tracking(current),
                    None => TrackingState::Idle,
                };
                self.projects = store.projects().into_iter().collect();
                self.tags = store.tags().into_iter().collect();
            }
            Err(e) => {
                error!(error = %e, "reload failed");
                self.tree = SelectionTree::default();
                self.state = TrackingState::Idle;
                self.notices
                    .push_back(Notice::error("Could not load frames", e.to_string()));
            }
        }
    }

    /// Compares the source's tracking status with the displayed one and reloads on any
    /// difference. Returns true when it reloaded. Open failures are only logged.
    pub fn poll(&mut self) -> bool {
        let current = match self.source.open() {
            Ok(store) => store.current(),
            Err(e) => {
                warn!(error = %e, "poll failed");
                return false;
            }
        };
        let changed = match (&self.state, &current) {
            (TrackingState::Idle, None) => false,
            (TrackingState::Tracking(shown), Some(actual)) => shown != actual,
            _ => true,
        };
        if changed {
            info!(tracking = current.is_some(), "tracking status changed outside; reloading");
            self.reload();
        }
        changed
    }

    /// Opens the source, applies `f`, saves, then reloads regardless of the outcome.
    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut S::Store) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let result = self
            .source
            .open()
            .map_err(ActionError::from)
            .and_then(|mut store| {
                let value = f(&mut store)?;
                store.save()?;
                Ok(value)
            });
        self.reload();
        result
    }

    fn start(&mut self, project: &str, tags: &[String]) -> Result<(), ActionError> {
        self.mutate(|store| {
            if let Some(current) = store.current() {
                return Err(StateMismatchError::AlreadyTracking(current.project).into());
            }
            let current = store.start(project, tags)?;
            info!(project = %current.project, "started tracking");
            Ok(())
        })
    }

    fn stop(&mut self) -> Result<(), ActionError> {
        self.mutate(|store| {
            if !store.is_started() {
                return Err(StateMismatchError::NotTracking.into());
            }
            let frame = store.stop()?;
            info!(id = %frame.id, project = %frame.project, "stopped tracking");
            Ok(())
        })
    }

    /// Deletes every selected frame and saves once. Nothing is saved if any delete fails.
    fn delete_selected(&mut self) -> Result<(), ActionError> {
        let ids = self.tree.selected_ids();
        if ids.is_empty() {
            return Ok(());
        }
        self.mutate(|store| {
            for id in &ids {
                store.delete(id)?;
            }
            info!(count = ids.len(), "deleted frames");
            Ok(())
        })
    }
}
