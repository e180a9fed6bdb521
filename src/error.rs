// Copyright (c) 2025 Robert August Vincent II <pillarsdotnet@gmail.com>
// Co-author: Cursor-AI.

//! Error types.
//!
//! Dialog-local failures ([`ValidationError`], [`ParseError`]) never leave the dialog; they only
//! disable its OK button. Failures that reach the main view are wrapped in [`ActionError`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Input rejected by a dialog before it can be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Project name is required.")]
    EmptyProject,

    #[error("Adding an empty tag is not allowed.")]
    EmptyTag,

    #[error("Adding a duplicate tag '{0}' is not allowed.")]
    DuplicateTag(String),

    #[error("Start time has to occur before end time.")]
    EndBeforeStart,
}

/// Date text that does not match `YYYY-MM-DD HH:mm[:ss]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse \"{input}\" (expected YYYY-MM-DD HH:mm:ss)")]
pub struct ParseError {
    pub input: String,
}

/// The frame source could not load, apply, or save a change.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not valid Watson data: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The source refused the operation (e.g. a frame that ends before it starts).
    #[error("{0}")]
    Rejected(String),

    #[error("no frame with id {0}")]
    UnknownFrame(String),
}

/// The displayed tracking state disagrees with the frame source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateMismatchError {
    #[error("No project started.")]
    NotTracking,

    #[error("Project {0} is already started.")]
    AlreadyTracking(String),
}

/// Failure of a main-view action; always followed by a reload.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    StateMismatch(#[from] StateMismatchError),
}

impl ActionError {
    /// Title for the message box that reports this error.
    pub fn title(&self) -> &'static str {
        match self {
            ActionError::Persistence(PersistenceError::Rejected(_))
            | ActionError::Persistence(PersistenceError::UnknownFrame(_)) => "Watson refused the change",
            ActionError::Persistence(_) => "Could not save frames",
            ActionError::StateMismatch(_) => "Tracking state changed",
        }
    }
}
