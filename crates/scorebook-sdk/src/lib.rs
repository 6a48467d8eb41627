//! High-level scoring API.
//!
//! [`Scorer`] is the entry point for applications embedding the engine: it
//! owns the match and innings store, serializes writes per innings, and
//! drives the ledger, projections and outcome detection for every
//! operation.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod locks;
pub mod read_model;
pub mod roster;
pub mod scorer;
pub mod store;
pub mod sync;

pub use config::ScorerConfig;
pub use error::{ErrorKind, ScoringError, ScoringResult};
pub use lifecycle::NextInnings;
pub use read_model::{DeliveryEvents, DeliveryReceipt, InningsReadModel, MatchReadModel};
pub use roster::{RosterProvider, StaticRoster};
pub use scorer::{AwardedTo, InningsClosed, PenaltyReceipt, Scorer};
pub use store::{InningsRecord, MatchRecord};
pub use sync::{InningsDigest, SyncBatch, SyncEvent, SyncReport};

// Re-export key types
pub use scorebook_engine::{overs_notation, Participants, RequiredActions, TargetState};
pub use scorebook_ledger::{InMemoryLedger, ValidationReport};
pub use scorebook_types::{
    DeliveryInput, DismissalInput, DismissalKind, InningsId, InningsState, MatchId, MatchState,
    PlayerId, Rules, ScopeContext, TeamId,
};
