//! Offline sync: replay a device's recorded event log through the scorer.
//!
//! Events go through the same operations a live scorer uses, in order, so
//! a server-side match reaches the state the device reached offline.
//! Innings-scoped events apply to the match's active innings.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use scorebook_engine::Participants;
use scorebook_ledger::{LedgerReader, LedgerWriter};
use scorebook_types::{DeliveryInput, InningsId, MatchId, PlayerId, ScopeContext, TeamId};

use crate::error::{ScoringError, ScoringResult};
use crate::lifecycle::NextInnings;
use crate::scorer::{AwardedTo, Scorer};

/// One recorded scorer action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncEvent {
    MarkReady,
    StartSession {
        #[serde(default)]
        batting_first: Option<TeamId>,
    },
    SelectParticipants {
        #[serde(default)]
        striker: Option<PlayerId>,
        #[serde(default)]
        non_striker: Option<PlayerId>,
        #[serde(default)]
        bowler: Option<PlayerId>,
    },
    Delivery(DeliveryInput),
    Undo,
    Dls {
        #[serde(default)]
        revised_target_runs: Option<u32>,
        #[serde(default)]
        revised_max_overs: Option<u32>,
    },
    Penalty {
        runs: u32,
        awarded_to: AwardedTo,
        #[serde(default)]
        reason: String,
    },
    EndInnings,
    Declare,
    StartNextInnings(NextInnings),
    EndMatch,
}

impl SyncEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MarkReady => "mark_ready",
            Self::StartSession { .. } => "start_session",
            Self::SelectParticipants { .. } => "select_participants",
            Self::Delivery(_) => "delivery",
            Self::Undo => "undo",
            Self::Dls { .. } => "dls",
            Self::Penalty { .. } => "penalty",
            Self::EndInnings => "end_innings",
            Self::Declare => "declare",
            Self::StartNextInnings(_) => "start_next_innings",
            Self::EndMatch => "end_match",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SyncBatch {
    pub match_id: MatchId,
    pub events: Vec<SyncEvent>,
}

/// Ledger digest of one innings after a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsDigest {
    pub innings_id: InningsId,
    pub innings_number: u32,
    pub ball_count: u32,
    /// Hex head hash, `None` for an innings without balls.
    pub digest: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub match_id: MatchId,
    pub applied: usize,
    pub digests: Vec<InningsDigest>,
}

impl<L: LedgerReader + LedgerWriter> Scorer<L> {
    /// Apply every event of `batch` in order.
    ///
    /// Stops at the first failure. Events before it stay applied; the
    /// error carries the failing index.
    pub fn apply_batch(&self, scope: &ScopeContext, batch: &SyncBatch) -> ScoringResult<SyncReport> {
        let match_id = batch.match_id;
        for (index, event) in batch.events.iter().enumerate() {
            if let Err(source) = self.apply_event(scope, match_id, event) {
                warn!(
                    match_id = %match_id,
                    index,
                    event = event.name(),
                    error = %source,
                    "sync batch stopped"
                );
                return Err(ScoringError::BatchFailed {
                    index,
                    source: Box::new(source),
                });
            }
        }

        let digests = self.digests(match_id)?;
        info!(
            match_id = %match_id,
            applied = batch.events.len(),
            innings = digests.len(),
            scope = %scope,
            "sync batch applied"
        );
        Ok(SyncReport {
            match_id,
            applied: batch.events.len(),
            digests,
        })
    }

    fn apply_event(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
        event: &SyncEvent,
    ) -> ScoringResult<()> {
        match event {
            SyncEvent::MarkReady => {
                self.mark_ready(scope, match_id)?;
            }
            SyncEvent::StartSession { batting_first } => {
                self.start_session(scope, match_id, *batting_first)?;
            }
            SyncEvent::SelectParticipants {
                striker,
                non_striker,
                bowler,
            } => {
                let innings = self.active_innings(match_id)?.innings_id;
                let selection = Participants {
                    striker: *striker,
                    non_striker: *non_striker,
                    bowler: *bowler,
                };
                self.select_participants(scope, innings, selection)?;
            }
            SyncEvent::Delivery(input) => {
                self.record_delivery(scope, match_id, input.clone())?;
            }
            SyncEvent::Undo => {
                self.undo_last_delivery(scope, match_id)?;
            }
            SyncEvent::Dls {
                revised_target_runs,
                revised_max_overs,
            } => {
                let innings = self.active_innings(match_id)?.innings_id;
                self.apply_dls(scope, innings, *revised_target_runs, *revised_max_overs)?;
            }
            SyncEvent::Penalty {
                runs,
                awarded_to,
                reason,
            } => {
                let innings = self.active_innings(match_id)?.innings_id;
                self.apply_penalty(scope, innings, *runs, *awarded_to, reason)?;
            }
            SyncEvent::EndInnings => {
                self.end_active_innings(scope, match_id)?;
            }
            SyncEvent::Declare => {
                self.declare_innings(scope, match_id)?;
            }
            SyncEvent::StartNextInnings(request) => {
                self.start_next_innings(scope, match_id, *request)?;
            }
            SyncEvent::EndMatch => {
                self.end_match(scope, match_id)?;
            }
        }
        Ok(())
    }

    /// Ledger digests of every innings of a match, in innings order.
    pub fn digests(&self, match_id: MatchId) -> ScoringResult<Vec<InningsDigest>> {
        self.innings(match_id)?
            .iter()
            .map(|record| -> ScoringResult<InningsDigest> {
                Ok(InningsDigest {
                    innings_id: record.innings_id,
                    innings_number: record.innings_number,
                    ball_count: self.ledger().ball_count(record.innings_id)?,
                    digest: self.ledger().digest(record.innings_id)?.map(hex::encode),
                })
            })
            .collect()
    }
}
