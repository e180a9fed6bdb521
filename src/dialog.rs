// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Form state behind the start, add and edit dialogs.
//!
//! Each [`FrameForm`] owns its validation state; the OK button is enabled only while
//! [`FrameForm::can_confirm`] holds. Tags are optional. Rendering lives in `gui.rs`.

use crate::datetime::{format_datetime, parse_local};
use crate::error::{ParseError, ValidationError};
use crate::frame::Frame;
use chrono::{DateTime, Duration, Local};
use thiserror::Error;

/// Which dialog a form belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogKind {
    /// Project and tags only; the frame starts now.
    Start,
    /// A past frame with explicit start and end.
    Add,
    /// Changes to the frame with this id.
    Edit(String),
}

impl DialogKind {
    pub fn title(&self) -> &'static str {
        match self {
            DialogKind::Start => "Start frame",
            DialogKind::Add => "Add frame",
            DialogKind::Edit(_) => "Edit frame",
        }
    }

    pub fn has_times(&self) -> bool {
        !matches!(self, DialogKind::Start)
    }
}

/// Why a date field is not accepted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What a confirmed dialog hands to the main view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameDraft {
    pub project: String,
    pub tags: Vec<String>,
    /// Start and end; `None` for the start dialog.
    pub interval: Option<(DateTime<Local>, DateTime<Local>)>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialogResult {
    Confirmed(FrameDraft),
    Cancelled,
}

#[derive(Clone, Debug)]
pub struct FrameForm {
    kind: DialogKind,
    known_projects: Vec<String>,
    known_tags: Vec<String>,
    project: String,
    /// Text of the tag entry; added to the list by [`FrameForm::add_tag`].
    pub tag_input: String,
    tags: Vec<String>,
    tag_error: Option<ValidationError>,
    start_text: String,
    end_text: String,
    start: Result<DateTime<Local>, FieldError>,
    end: Result<DateTime<Local>, FieldError>,
}

fn matching<'a>(candidates: &'a [String], prefix: &str, exclude: &[String]) -> Vec<&'a str> {
    let prefix = prefix.trim().to_lowercase();
    candidates
        .iter()
        .filter(|c| c.to_lowercase().starts_with(&prefix))
        .filter(|c| !exclude.contains(c))
        .map(String::as_str)
        .collect()
}

impl FrameForm {
    fn new(kind: DialogKind, known_projects: Vec<String>, known_tags: Vec<String>) -> Self {
        let mut form = FrameForm {
            kind,
            known_projects,
            known_tags,
            project: String::new(),
            tag_input: String::new(),
            tags: Vec::new(),
            tag_error: None,
            start_text: String::new(),
            end_text: String::new(),
            start: Err(ParseError { input: String::new() }.into()),
            end: Err(ParseError { input: String::new() }.into()),
        };
        form.revalidate_times();
        form
    }

    /// Empty form for starting a frame now.
    pub fn for_start(known_projects: Vec<String>, known_tags: Vec<String>) -> Self {
        Self::new(DialogKind::Start, known_projects, known_tags)
    }

    /// Form for a past frame, prefilled with the hour before `now`.
    pub fn for_add(known_projects: Vec<String>, known_tags: Vec<String>, now: DateTime<Local>) -> Self {
        let mut form = Self::new(DialogKind::Add, known_projects, known_tags);
        form.start_text = format_datetime(&(now - Duration::hours(1)));
        form.end_text = format_datetime(&now);
        form.revalidate_times();
        form
    }

    /// Form prefilled from an existing frame.
    pub fn for_edit(frame: &Frame, known_projects: Vec<String>, known_tags: Vec<String>) -> Self {
        let mut form = Self::new(DialogKind::Edit(frame.id.clone()), known_projects, known_tags);
        form.project = frame.project.clone();
        form.tags = frame.tags.clone();
        form.start_text = format_datetime(&frame.start);
        form.end_text = format_datetime(&frame.stop);
        form.revalidate_times();
        form
    }

    pub fn kind(&self) -> &DialogKind {
        &self.kind
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn set_project(&mut self, text: &str) {
        self.project = text.to_string();
    }

    pub fn project_error(&self) -> Option<ValidationError> {
        if self.project.trim().is_empty() {
            Some(ValidationError::EmptyProject)
        } else {
            None
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Error from the last [`FrameForm::add_tag`], shown next to the tag entry.
    pub fn tag_error(&self) -> Option<&ValidationError> {
        self.tag_error.as_ref()
    }

    /// Moves the tag entry into the tag list. Empty and duplicate tags are refused and leave the
    /// list unchanged.
    pub fn add_tag(&mut self) -> Result<(), ValidationError> {
        let tag = self.tag_input.trim().to_string();
        let result = if tag.is_empty() {
            Err(ValidationError::EmptyTag)
        } else if self.tags.contains(&tag) {
            Err(ValidationError::DuplicateTag(tag))
        } else {
            self.tags.push(tag);
            self.tag_input.clear();
            Ok(())
        };
        self.tag_error = result.clone().err();
        result
    }

    pub fn remove_tag(&mut self, index: usize) -> Option<String> {
        if index < self.tags.len() {
            self.tag_error = None;
            Some(self.tags.remove(index))
        } else {
            None
        }
    }

    pub fn start_text(&self) -> &str {
        &self.start_text
    }

    pub fn end_text(&self) -> &str {
        &self.end_text
    }

    pub fn set_start_text(&mut self, text: &str) {
        self.start_text = text.to_string();
        self.revalidate_times();
    }

    pub fn set_end_text(&mut self, text: &str) {
        self.end_text = text.to_string();
        self.revalidate_times();
    }

    pub fn start_error(&self) -> Option<&FieldError> {
        self.start.as_ref().err()
    }

    pub fn end_error(&self) -> Option<&FieldError> {
        self.end.as_ref().err()
    }

    fn revalidate_times(&mut self) {
        self.start = parse_local(&self.start_text).map_err(FieldError::from);
        self.end = match (parse_local(&self.end_text), &self.start) {
            (Err(e), _) => Err(e.into()),
            (Ok(end), Ok(start)) if end < *start => Err(ValidationError::EndBeforeStart.into()),
            (Ok(end), _) => Ok(end),
        };
    }

    pub fn can_confirm(&self) -> bool {
        if self.project_error().is_some() {
            return false;
        }
        !self.kind.has_times() || (self.start.is_ok() && self.end.is_ok())
    }

    /// The collected values, or `None` while the form is invalid.
    pub fn confirm(&self) -> Option<FrameDraft> {
        if !self.can_confirm() {
            return None;
        }
        let interval = if self.kind.has_times() {
            Some((self.start.clone().ok()?, self.end.clone().ok()?))
        } else {
            None
        };
        Some(FrameDraft {
            project: self.project.trim().to_string(),
            tags: self.tags.clone(),
            interval,
        })
    }

    /// Known projects starting with the typed project text (case-insensitive).
    pub fn project_suggestions(&self) -> Vec<&str> {
        matching(&self.known_projects, &self.project, std::slice::from_ref(&self.project))
    }

    /// Known tags starting with the tag entry text, minus tags already chosen.
    pub fn tag_suggestions(&self) -> Vec<&str> {
        matching(&self.known_tags, &self.tag_input, &self.tags)
    }
}
