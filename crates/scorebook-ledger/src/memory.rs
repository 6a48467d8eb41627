use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use scorebook_types::{BallId, InningsId, OwnerId, PenaltyId};

use crate::error::LedgerError;
use crate::records::{BallFact, BallRecord, BallRef, PenaltyRecord};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ball ledger for tests, offline tools, and embedding.
#[derive(Default)]
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    streams: HashMap<InningsId, Vec<BallRecord>>,
    penalties: Vec<PenaltyRecord>,
    penalty_ids: HashSet<PenaltyId>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::LockPoisoned("read"))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::LockPoisoned("write"))
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append_ball(&self, fact: BallFact, recorded_by: OwnerId) -> Result<BallRecord, LedgerError> {
        let mut state = self.write_state()?;
        let stream = state.streams.entry(fact.innings_id).or_default();

        let expected = stream.len() as u32 + 1;
        if fact.ball_number != expected {
            return Err(LedgerError::SequenceConflict {
                expected,
                found: fact.ball_number,
            });
        }

        let mut record = BallRecord {
            ball_id: BallId::new(),
            fact,
            recorded_by,
            recorded_at: Utc::now(),
            prev_hash: stream.last().map(|last| last.record_hash),
            record_hash: [0; 32],
        };
        record.record_hash = record.compute_hash()?;
        stream.push(record.clone());

        debug!(
            innings_id = %record.innings_id(),
            ball_number = record.ball_number(),
            hash = %record.record_hash_hex(),
            "ball appended"
        );
        Ok(record)
    }

    fn remove_last_ball(&self, innings: InningsId) -> Result<Option<BallRecord>, LedgerError> {
        let mut state = self.write_state()?;
        let Some(stream) = state.streams.get_mut(&innings) else {
            return Ok(None);
        };
        let removed = stream.pop();
        if stream.is_empty() {
            state.streams.remove(&innings);
        }
        if let Some(record) = &removed {
            debug!(innings_id = %innings, ball_number = record.ball_number(), "ball removed");
        }
        Ok(removed)
    }

    fn append_penalty(&self, penalty: PenaltyRecord) -> Result<PenaltyRecord, LedgerError> {
        let mut state = self.write_state()?;
        if !state.penalty_ids.insert(penalty.penalty_id) {
            return Err(LedgerError::DuplicatePenalty(penalty.penalty_id));
        }
        state.penalties.push(penalty.clone());
        debug!(
            penalty_id = %penalty.penalty_id,
            innings_id = %penalty.award.receiving_innings,
            runs = penalty.award.runs,
            "penalty recorded"
        );
        Ok(penalty)
    }
}

impl LedgerReader for InMemoryLedger {
    fn head(&self, innings: InningsId) -> Result<Option<BallRef>, LedgerError> {
        let state = self.read_state()?;
        Ok(state
            .streams
            .get(&innings)
            .and_then(|stream| stream.last())
            .map(BallRef::from))
    }

    fn ball_range(
        &self,
        innings: InningsId,
        from: u32,
        to: u32,
    ) -> Result<Vec<BallRecord>, LedgerError> {
        if from == 0 || to == 0 || from > to {
            return Err(LedgerError::InvalidRange { from, to });
        }

        let state = self.read_state()?;
        let Some(stream) = state.streams.get(&innings) else {
            return Ok(vec![]);
        };

        let start = (from - 1) as usize;
        if start >= stream.len() {
            return Ok(vec![]);
        }
        let end = (to as usize).min(stream.len());
        Ok(stream[start..end].to_vec())
    }

    fn balls(&self, innings: InningsId) -> Result<Vec<BallRecord>, LedgerError> {
        let state = self.read_state()?;
        Ok(state.streams.get(&innings).cloned().unwrap_or_default())
    }

    fn ball_count(&self, innings: InningsId) -> Result<u32, LedgerError> {
        let state = self.read_state()?;
        Ok(state.streams.get(&innings).map_or(0, |s| s.len() as u32))
    }

    fn penalties_for(&self, innings: InningsId) -> Result<Vec<PenaltyRecord>, LedgerError> {
        let state = self.read_state()?;
        Ok(state
            .penalties
            .iter()
            .filter(|p| p.award.receiving_innings == innings)
            .cloned()
            .collect())
    }

    fn innings(&self) -> Result<Vec<InningsId>, LedgerError> {
        let state = self.read_state()?;
        let mut ids: Vec<_> = state.streams.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::fact;
    use crate::records::PenaltyAward;
    use scorebook_types::{MatchId, PlayerId, TeamId};

    fn players() -> [PlayerId; 3] {
        [PlayerId::new(), PlayerId::new(), PlayerId::new()]
    }

    fn append(ledger: &InMemoryLedger, innings: InningsId, n: u32) -> Vec<BallRecord> {
        let p = players();
        (1..=n)
            .map(|i| ledger.append_ball(fact(innings, i, p), OwnerId::new()).unwrap())
            .collect()
    }

    #[test]
    fn append_links_hashes() {
        let ledger = InMemoryLedger::new();
        let innings = InningsId::new();
        let records = append(&ledger, innings, 3);

        assert_eq!(records[0].prev_hash, None);
        assert_eq!(records[1].prev_hash, Some(records[0].record_hash));
        assert_eq!(records[2].prev_hash, Some(records[1].record_hash));
        assert_eq!(ledger.ball_count(innings).unwrap(), 3);
        assert_eq!(
            ledger.digest(innings).unwrap(),
            Some(records[2].record_hash)
        );
    }

    #[test]
    fn append_rejects_out_of_order() {
        let ledger = InMemoryLedger::new();
        let innings = InningsId::new();
        append(&ledger, innings, 2);
        let err = ledger
            .append_ball(fact(innings, 4, players()), OwnerId::new())
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::SequenceConflict {
                expected: 3,
                found: 4
            }
        );

        let err = ledger
            .append_ball(fact(innings, 2, players()), OwnerId::new())
            .unwrap_err();
        assert!(matches!(err, LedgerError::SequenceConflict { .. }));
    }

    #[test]
    fn remove_last_pops_tail_only() {
        let ledger = InMemoryLedger::new();
        let innings = InningsId::new();
        let records = append(&ledger, innings, 3);

        let removed = ledger.remove_last_ball(innings).unwrap().unwrap();
        assert_eq!(removed.ball_number(), 3);
        assert_eq!(ledger.ball_count(innings).unwrap(), 2);
        assert_eq!(
            ledger.head(innings).unwrap().unwrap().record_hash,
            records[1].record_hash
        );

        // The next append reuses the freed number.
        let again = ledger
            .append_ball(fact(innings, 3, players()), OwnerId::new())
            .unwrap();
        assert_eq!(again.prev_hash, Some(records[1].record_hash));
    }

    #[test]
    fn remove_from_empty_innings() {
        let ledger = InMemoryLedger::new();
        assert!(ledger.remove_last_ball(InningsId::new()).unwrap().is_none());
    }

    #[test]
    fn innings_are_isolated() {
        let ledger = InMemoryLedger::new();
        let (first, second) = (InningsId::new(), InningsId::new());
        append(&ledger, first, 4);
        append(&ledger, second, 1);
        assert_eq!(ledger.ball_count(first).unwrap(), 4);
        assert_eq!(ledger.ball_count(second).unwrap(), 1);
        assert_eq!(ledger.innings().unwrap().len(), 2);
    }

    #[test]
    fn range_reads() {
        let ledger = InMemoryLedger::new();
        let innings = InningsId::new();
        append(&ledger, innings, 5);

        let range = ledger.ball_range(innings, 2, 4).unwrap();
        let numbers: Vec<_> = range.iter().map(BallRecord::ball_number).collect();
        assert_eq!(numbers, vec![2, 3, 4]);

        assert_eq!(ledger.ball_range(innings, 4, 99).unwrap().len(), 2);
        assert!(ledger.ball_range(innings, 9, 10).unwrap().is_empty());
        assert_eq!(
            ledger.ball_range(innings, 3, 2).unwrap_err(),
            LedgerError::InvalidRange { from: 3, to: 2 }
        );
    }

    #[test]
    fn penalties_are_keyed_by_receiving_innings() {
        let ledger = InMemoryLedger::new();
        let (penalized, receiving) = (InningsId::new(), InningsId::new());
        let award = PenaltyAward {
            match_id: MatchId::new(),
            penalized_innings: penalized,
            receiving_innings: receiving,
            receiving_team: TeamId::named("Home"),
            runs: 5,
            reason: "ball tampering".into(),
        };
        let record = ledger
            .append_penalty(PenaltyRecord::new(award, OwnerId::new()))
            .unwrap();

        assert_eq!(ledger.penalties_for(receiving).unwrap(), vec![record.clone()]);
        assert!(ledger.penalties_for(penalized).unwrap().is_empty());
        assert_eq!(
            ledger.append_penalty(record.clone()).unwrap_err(),
            LedgerError::DuplicatePenalty(record.penalty_id)
        );
    }
}
