use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle of a match.
///
/// ```text
/// DRAFT -> READY -> IN_PROGRESS -> COMPLETED
///                        ^             |
///                        +-------------+  (undo / super over)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchState {
    Draft,
    Ready,
    InProgress,
    Completed,
}

impl MatchState {
    pub fn can_transition_to(self, next: MatchState) -> bool {
        use MatchState::*;
        matches!(
            (self, next),
            (Draft, Ready) | (Ready, InProgress) | (InProgress, Completed) | (Completed, InProgress)
        )
    }

    /// Validate a transition, returning the new state.
    pub fn transition_to(self, next: MatchState) -> Result<MatchState, TypeError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TypeError::IllegalTransition {
                entity: "match",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Deliveries and innings changes are only accepted while in progress.
    pub fn is_live(self) -> bool {
        self == MatchState::InProgress
    }
}

impl fmt::Display for MatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::Ready => "READY",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        };
        f.write_str(s)
    }
}

/// Lifecycle of an innings.
///
/// An `Open` innings exists but has not started; penalty awards can create
/// one ahead of time. `Completed` may return to `Active` when an undo
/// removes the ball that ended it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InningsState {
    Open,
    Active,
    Completed,
    Abandoned,
}

impl InningsState {
    pub fn can_transition_to(self, next: InningsState) -> bool {
        use InningsState::*;
        matches!(
            (self, next),
            (Open, Active)
                | (Open, Abandoned)
                | (Active, Completed)
                | (Active, Abandoned)
                | (Completed, Active)
        )
    }

    pub fn transition_to(self, next: InningsState) -> Result<InningsState, TypeError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TypeError::IllegalTransition {
                entity: "innings",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    /// Has play started in this innings?
    pub fn is_started(self) -> bool {
        self != InningsState::Open
    }

    pub fn is_finished(self) -> bool {
        matches!(self, InningsState::Completed | InningsState::Abandoned)
    }
}

impl fmt::Display for InningsState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::Active => "ACTIVE",
            Self::Completed => "COMPLETED",
            Self::Abandoned => "ABANDONED",
        };
        f.write_str(s)
    }
}
