//! Match and innings records.
//!
//! The store hands out clones: readers always see a committed snapshot,
//! and writers replace a whole record while holding that record's lock.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scorebook_engine::InningsSummary;
use scorebook_ledger::{AppliedBall, ChaseContext, InningsProjection};
use scorebook_types::{
    InningsId, InningsLimits, InningsState, MatchId, MatchState, OwnerId, Rules, TeamId,
};

use crate::error::{ScoringError, ScoringResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub match_id: MatchId,
    pub team1: TeamId,
    pub team2: TeamId,
    /// Snapshot of the format taken when the match was created.
    pub rules: Rules,
    pub state: MatchState,
    pub created_by: OwnerId,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    pub fn has_team(&self, team: TeamId) -> bool {
        team == self.team1 || team == self.team2
    }

    pub fn opponent(&self, team: TeamId) -> TeamId {
        if team == self.team1 {
            self.team2
        } else {
            self.team1
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsRecord {
    pub innings_id: InningsId,
    pub match_id: MatchId,
    pub innings_number: u32,
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    pub state: InningsState,
    pub is_super_over: bool,
    pub super_over_index: u32,
    pub is_follow_on: bool,
    pub declared: bool,
    /// When the innings first became ACTIVE. `None` for a penalty
    /// placeholder that was never played.
    pub started_at: Option<DateTime<Utc>>,
    pub projection: InningsProjection,
    /// Effect of the most recent ball, for read-model events.
    pub last_applied: Option<AppliedBall>,
}

/// Fields of a new innings chosen by the lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInnings {
    pub innings_number: u32,
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    pub state: InningsState,
    pub is_super_over: bool,
    pub super_over_index: u32,
    pub is_follow_on: bool,
    pub chase: ChaseContext,
}

impl InningsRecord {
    pub fn new(m: &MatchRecord, fields: NewInnings) -> Self {
        let innings_id = InningsId::new();
        Self {
            innings_id,
            match_id: m.match_id,
            innings_number: fields.innings_number,
            batting_team: fields.batting_team,
            bowling_team: fields.bowling_team,
            state: fields.state,
            is_super_over: fields.is_super_over,
            super_over_index: fields.super_over_index,
            is_follow_on: fields.is_follow_on,
            declared: false,
            started_at: fields.state.is_started().then(Utc::now),
            projection: InningsProjection::new(innings_id, m.rules.balls_per_over, fields.chase),
            last_applied: None,
        }
    }

    /// Whether the innings was ever played. Unlike `state.is_started()`
    /// this stays false for a placeholder abandoned while still OPEN.
    pub fn was_played(&self) -> bool {
        self.started_at.is_some()
    }

    /// An OPEN regular innings created to hold penalty runs.
    pub fn is_placeholder(&self) -> bool {
        self.state == InningsState::Open && !self.is_super_over
    }

    pub fn summary(&self) -> InningsSummary {
        InningsSummary {
            innings_id: self.innings_id,
            innings_number: self.innings_number,
            batting_team: self.batting_team,
            bowling_team: self.bowling_team,
            is_super_over: self.is_super_over,
            super_over_index: self.super_over_index,
            state: self.state,
            runs: self.projection.aggregate.runs,
        }
    }

    pub fn limits(&self, rules: &Rules) -> InningsLimits {
        rules.innings_limits(self.is_super_over)
    }
}

#[derive(Default)]
pub struct MatchStore {
    matches: RwLock<HashMap<MatchId, MatchRecord>>,
    innings: RwLock<HashMap<InningsId, InningsRecord>>,
}

fn poisoned(what: &str) -> ScoringError {
    ScoringError::Internal(format!("{what} store lock poisoned"))
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn matches(&self) -> ScoringResult<RwLockReadGuard<'_, HashMap<MatchId, MatchRecord>>> {
        self.matches.read().map_err(|_| poisoned("match"))
    }

    fn matches_mut(&self) -> ScoringResult<RwLockWriteGuard<'_, HashMap<MatchId, MatchRecord>>> {
        self.matches.write().map_err(|_| poisoned("match"))
    }

    fn innings(&self) -> ScoringResult<RwLockReadGuard<'_, HashMap<InningsId, InningsRecord>>> {
        self.innings.read().map_err(|_| poisoned("innings"))
    }

    fn innings_mut(
        &self,
    ) -> ScoringResult<RwLockWriteGuard<'_, HashMap<InningsId, InningsRecord>>> {
        self.innings.write().map_err(|_| poisoned("innings"))
    }

    // ---- Matches ----

    pub fn insert_match(&self, record: MatchRecord) -> ScoringResult<()> {
        self.matches_mut()?.insert(record.match_id, record);
        Ok(())
    }

    pub fn get_match(&self, id: MatchId) -> ScoringResult<MatchRecord> {
        self.matches()?
            .get(&id)
            .cloned()
            .ok_or(ScoringError::MatchNotFound(id))
    }

    /// Apply `f` to a copy of the match and keep the copy only if `f`
    /// succeeds.
    pub fn update_match<T>(
        &self,
        id: MatchId,
        f: impl FnOnce(&mut MatchRecord) -> ScoringResult<T>,
    ) -> ScoringResult<T> {
        let mut matches = self.matches_mut()?;
        let current = matches.get(&id).ok_or(ScoringError::MatchNotFound(id))?;
        let mut next = current.clone();
        let out = f(&mut next)?;
        matches.insert(id, next);
        Ok(out)
    }

    // ---- Innings ----

    /// Insert a new innings. Innings numbers are unique within a match.
    pub fn insert_innings(&self, record: InningsRecord) -> ScoringResult<()> {
        let mut innings = self.innings_mut()?;
        if innings
            .values()
            .any(|i| i.match_id == record.match_id && i.innings_number == record.innings_number)
        {
            return Err(ScoringError::InvalidState(format!(
                "innings {} already exists",
                record.innings_number
            )));
        }
        innings.insert(record.innings_id, record);
        Ok(())
    }

    pub fn get_innings(&self, id: InningsId) -> ScoringResult<InningsRecord> {
        self.innings()?
            .get(&id)
            .cloned()
            .ok_or(ScoringError::InningsNotFound(id))
    }

    /// Replace an existing innings record.
    pub fn put_innings(&self, record: InningsRecord) -> ScoringResult<()> {
        let mut innings = self.innings_mut()?;
        match innings.get_mut(&record.innings_id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(ScoringError::InningsNotFound(record.innings_id)),
        }
    }

    /// All innings of a match, ordered by innings number.
    pub fn innings_for(&self, match_id: MatchId) -> ScoringResult<Vec<InningsRecord>> {
        let mut list: Vec<_> = self
            .innings()?
            .values()
            .filter(|i| i.match_id == match_id)
            .cloned()
            .collect();
        list.sort_by_key(|i| i.innings_number);
        Ok(list)
    }

    pub fn active_innings(&self, match_id: MatchId) -> ScoringResult<Option<InningsRecord>> {
        Ok(self
            .innings_for(match_id)?
            .into_iter()
            .find(|i| i.state == InningsState::Active))
    }
}
