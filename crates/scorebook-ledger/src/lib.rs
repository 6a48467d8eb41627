//! Append-only ball ledger for Scorebook.
//!
//! The ledger is the single source of truth for an innings. It provides:
//! - Ball and penalty record types with a per-innings BLAKE3 hash chain
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger` implementation for tests and embedding
//! - Innings projections (aggregate, batting and bowling figures)
//! - Deterministic rebuild of projections from the ledger
//! - Stream validation (sequence, hash chain)

pub mod error;
pub mod memory;
pub mod projection;
pub mod records;
pub mod replay;
pub mod traits;
pub mod validation;

pub use error::LedgerError;
pub use memory::InMemoryLedger;
pub use projection::{
    AppliedBall, BatterStats, BowlerStats, ChaseContext, InningsAggregate, InningsProjection,
};
pub use records::{BallFact, BallRecord, BallRef, PenaltyAward, PenaltyRecord};
pub use replay::{ReplayEngine, ReplayResult};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{StreamValidator, ValidationReport, Violation, ViolationKind};
