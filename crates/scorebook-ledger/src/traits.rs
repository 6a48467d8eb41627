use scorebook_types::{InningsId, OwnerId};

use crate::error::LedgerError;
use crate::records::{BallFact, BallRecord, BallRef, PenaltyRecord};

/// Write boundary for the ball ledger.
pub trait LedgerWriter: Send + Sync {
    /// Append a delivery to its innings. `fact.ball_number` must be the
    /// next number in the innings.
    fn append_ball(&self, fact: BallFact, recorded_by: OwnerId) -> Result<BallRecord, LedgerError>;

    /// Remove and return the most recent delivery of an innings.
    fn remove_last_ball(&self, innings: InningsId) -> Result<Option<BallRecord>, LedgerError>;

    fn append_penalty(&self, penalty: PenaltyRecord) -> Result<PenaltyRecord, LedgerError>;
}

/// Read boundary for replay and projection.
pub trait LedgerReader: Send + Sync {
    fn head(&self, innings: InningsId) -> Result<Option<BallRef>, LedgerError>;

    /// Deliveries `from..=to` by ball number.
    fn ball_range(&self, innings: InningsId, from: u32, to: u32)
        -> Result<Vec<BallRecord>, LedgerError>;

    /// All deliveries of an innings in ball-number order.
    fn balls(&self, innings: InningsId) -> Result<Vec<BallRecord>, LedgerError>;

    fn ball_count(&self, innings: InningsId) -> Result<u32, LedgerError>;

    /// Penalties whose runs go to `innings`, in award order.
    fn penalties_for(&self, innings: InningsId) -> Result<Vec<PenaltyRecord>, LedgerError>;

    /// Innings that have at least one delivery.
    fn innings(&self) -> Result<Vec<InningsId>, LedgerError>;

    /// Hash of the head record, used to compare ledgers across devices.
    fn digest(&self, innings: InningsId) -> Result<Option<[u8; 32]>, LedgerError> {
        Ok(self.head(innings)?.map(|head| head.record_hash))
    }
}
