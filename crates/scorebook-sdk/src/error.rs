use serde::{Deserialize, Serialize};
use thiserror::Error;

use scorebook_engine::ValidationError;
use scorebook_ledger::LedgerError;
use scorebook_types::{InningsId, MatchId, PlayerId, TypeError};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid delivery: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Type(#[from] TypeError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("stale ball number: expected {expected}, got {found}")]
    SequenceMismatch { expected: u32, found: u32 },

    #[error("{slot} mismatch: expected {expected}, got {found}")]
    ParticipantMismatch {
        slot: &'static str,
        expected: PlayerId,
        found: PlayerId,
    },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("innings not found: {0}")]
    InningsNotFound(InningsId),

    #[error("match {0} has no active innings")]
    NoActiveInnings(MatchId),

    #[error("innings {0} has no deliveries")]
    NoDeliveries(InningsId),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("roster: {0}")]
    Roster(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("sync batch failed at event {index}: {source}")]
    BatchFailed {
        index: usize,
        #[source]
        source: Box<ScoringError>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse error classes reported to callers.
///
/// Nothing is retried inside the engine; the caller decides what to do
/// with each class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or contradictory request. Resubmitting it unchanged fails again.
    Validation,
    /// The caller's view of the innings is stale and must be refreshed.
    Sequence,
    /// The match or innings is not in the required lifecycle state.
    State,
    NotFound,
    Internal,
}

impl ScoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidRequest(_) | Self::Roster(_) => {
                ErrorKind::Validation
            }
            Self::Type(TypeError::UnknownFormat(_)) => ErrorKind::NotFound,
            Self::Type(TypeError::IllegalTransition { .. }) => ErrorKind::State,
            Self::Type(_) => ErrorKind::Validation,
            Self::Ledger(LedgerError::SequenceConflict { .. }) => ErrorKind::Sequence,
            Self::Ledger(_) => ErrorKind::Internal,
            Self::SequenceMismatch { .. } | Self::ParticipantMismatch { .. } => {
                ErrorKind::Sequence
            }
            Self::InvalidState(_) | Self::NoActiveInnings(_) | Self::NoDeliveries(_) => {
                ErrorKind::State
            }
            Self::MatchNotFound(_) | Self::InningsNotFound(_) => ErrorKind::NotFound,
            Self::BatchFailed { source, .. } => source.kind(),
            Self::Config(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type ScoringResult<T> = Result<T, ScoringError>;
