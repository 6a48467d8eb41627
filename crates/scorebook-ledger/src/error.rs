use scorebook_types::{InningsId, PenaltyId};

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("integrity violation at ball {ball_number}: {reason}")]
    IntegrityViolation { ball_number: u32, reason: String },

    #[error("ball number conflict: expected {expected}, got {found}")]
    SequenceConflict { expected: u32, found: u32 },

    #[error("invalid ball range: from={from}, to={to}")]
    InvalidRange { from: u32, to: u32 },

    #[error("penalty already recorded: {0}")]
    DuplicatePenalty(PenaltyId),

    #[error("innings has no deliveries: {0}")]
    EmptyInnings(InningsId),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("ledger {0} lock poisoned")]
    LockPoisoned(&'static str),
}
