//! # Lifecycle State Machine
//!
//! ```text
//!            toggle_pin
//!   Active <-----------> Pinned
//!     |  ^                 |
//!     |  |  restore        |
//!     |  +---------+       |
//!     v            |       |  trash
//!   Trashed <------+-------+
//!     |
//!     | purge / empty_trash
//!     v
//!     ⊥
//! ```
//!
//! Trashing drops pin information: a restored note always comes back Active.
//! Nothing leaves ⊥. This module only answers "where does a note go"; moving
//! its keys is the repository's job.

use crate::model::LifecycleState;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    TogglePin,
    Trash,
    Restore,
    Purge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Moved(LifecycleState),
    Removed,
}

impl LifecycleState {
    /// Where `transition` takes a note in this state, or `None` when the
    /// transition is not defined here.
    pub fn apply(self, transition: Transition) -> Option<Outcome> {
        use LifecycleState::*;
        match (self, transition) {
            (Active, Transition::TogglePin) => Some(Outcome::Moved(Pinned)),
            (Pinned, Transition::TogglePin) => Some(Outcome::Moved(Active)),
            (Active | Pinned, Transition::Trash) => Some(Outcome::Moved(Trashed)),
            (Trashed, Transition::Restore) => Some(Outcome::Moved(Active)),
            (Trashed, Transition::Purge) => Some(Outcome::Removed),
            _ => None,
        }
    }

    /// State of a freshly created note.
    pub fn initial() -> Self {
        LifecycleState::Active
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Transition::TogglePin => "toggle-pin",
            Transition::Trash => "trash",
            Transition::Restore => "restore",
            Transition::Purge => "purge",
        };
        f.write_str(name)
    }
}
