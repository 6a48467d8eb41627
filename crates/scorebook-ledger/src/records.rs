use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scorebook_engine::BallSequence;
use scorebook_types::{
    Attachments, BallId, Dismissal, InningsId, MatchId, OwnerId, PenaltyId, PlayerId,
    RunsBreakdown, TeamId,
};

use crate::error::LedgerError;

const BALL_HASH_DOMAIN: &[u8] = b"scorebook-ball-v1:";

/// The scoring facts of one delivery, as sequenced and classified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallFact {
    pub innings_id: InningsId,
    pub ball_number: u32,
    pub over_number: u32,
    pub ball_in_over: u32,
    pub is_legal: bool,
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    pub completed_runs: u32,
    pub runs: RunsBreakdown,
    pub is_boundary: bool,
    pub dismissal: Option<Dismissal>,
    #[serde(default)]
    pub attachments: Attachments,
}

impl BallFact {
    pub fn sequence(&self) -> BallSequence {
        BallSequence {
            ball_number: self.ball_number,
            over_number: self.over_number,
            ball_in_over: self.ball_in_over,
        }
    }

    /// Player leaving the crease on this ball, if any.
    pub fn dismissed(&self) -> Option<PlayerId> {
        self.dismissal.as_ref().map(|d| d.dismissed)
    }
}

/// A delivery as stored in the ledger. Immutable once appended; undo
/// removes whole records from the tail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BallRecord {
    pub ball_id: BallId,
    pub fact: BallFact,
    pub recorded_by: OwnerId,
    pub recorded_at: DateTime<Utc>,
    pub prev_hash: Option<[u8; 32]>,
    pub record_hash: [u8; 32],
}

impl BallRecord {
    pub fn ball_number(&self) -> u32 {
        self.fact.ball_number
    }

    pub fn innings_id(&self) -> InningsId {
        self.fact.innings_id
    }

    pub fn record_hash_hex(&self) -> String {
        hex::encode(self.record_hash)
    }

    /// BLAKE3 over the canonical JSON of the record with a zeroed hash.
    pub fn compute_hash(&self) -> Result<[u8; 32], LedgerError> {
        let mut canonical = self.clone();
        canonical.record_hash = [0; 32];

        let encoded = serde_json::to_vec(&canonical)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(BALL_HASH_DOMAIN);
        hasher.update(&encoded);
        Ok(*hasher.finalize().as_bytes())
    }
}

/// Lightweight reference to a ledger head.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallRef {
    pub ball_id: BallId,
    pub ball_number: u32,
    pub record_hash: [u8; 32],
}

impl From<&BallRecord> for BallRef {
    fn from(record: &BallRecord) -> Self {
        Self {
            ball_id: record.ball_id,
            ball_number: record.fact.ball_number,
            record_hash: record.record_hash,
        }
    }
}

/// Penalty runs awarded to an innings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyAward {
    pub match_id: MatchId,
    /// Innings in progress when the offence happened.
    pub penalized_innings: InningsId,
    /// Innings whose total receives the runs.
    pub receiving_innings: InningsId,
    pub receiving_team: TeamId,
    pub runs: u32,
    pub reason: String,
}

/// A stored penalty award. Never modified or removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyRecord {
    pub penalty_id: PenaltyId,
    pub award: PenaltyAward,
    pub awarded_by: OwnerId,
    pub awarded_at: DateTime<Utc>,
}

impl PenaltyRecord {
    pub fn new(award: PenaltyAward, awarded_by: OwnerId) -> Self {
        Self {
            penalty_id: PenaltyId::new(),
            award,
            awarded_by,
            awarded_at: Utc::now(),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BallRecord {
        let players = [PlayerId::new(), PlayerId::new(), PlayerId::new()];
        BallRecord {
            ball_id: BallId::new(),
            fact: fixtures::fact(InningsId::new(), 1, players),
            recorded_by: OwnerId::new(),
            recorded_at: Utc::now(),
            prev_hash: None,
            record_hash: [0; 32],
        }
    }

    #[test]
    fn hash_ignores_stored_hash() {
        let mut r = record();
        let h1 = r.compute_hash().unwrap();
        r.record_hash = [9; 32];
        assert_eq!(r.compute_hash().unwrap(), h1);
    }

    #[test]
    fn hash_covers_facts_and_link() {
        let r = record();
        let base = r.compute_hash().unwrap();

        let mut runs_changed = r.clone();
        runs_changed.fact.runs.off_bat = 4;
        assert_ne!(runs_changed.compute_hash().unwrap(), base);

        let mut relinked = r.clone();
        relinked.prev_hash = Some([1; 32]);
        assert_ne!(relinked.compute_hash().unwrap(), base);
    }

    #[test]
    fn hex_encoding() {
        let mut r = record();
        r.record_hash = [0xab; 32];
        assert_eq!(r.record_hash_hex(), "ab".repeat(32));
    }
}
