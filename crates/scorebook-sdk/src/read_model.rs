//! Read-models returned to callers after every operation.

use serde::{Deserialize, Serialize};

use scorebook_engine::{
    confirm_super_over, detect, overs_notation, Detection, InningsSummary, MatchEndInput,
    Participants, RequiredActions, TargetState, TeamTotals,
};
use scorebook_ledger::{AppliedBall, BallRef, BatterStats, BowlerStats, InningsAggregate};
use scorebook_types::{
    InningsId, InningsState, MatchId, MatchState, Rules, RunsBreakdown, TeamId,
};

use crate::store::{InningsRecord, MatchRecord};

/// Evaluate outcome detection for `current` within its match.
///
/// `innings` is every innings of the match; `current` replaces its own
/// entry so uncommitted changes are seen. A finished innings is treated as
/// ended whatever its score.
pub fn detect_for(m: &MatchRecord, innings: &[InningsRecord], current: &InningsRecord) -> Detection {
    let summaries: Vec<InningsSummary> = innings
        .iter()
        .filter(|i| i.innings_id != current.innings_id)
        .chain(std::iter::once(current))
        .map(InningsRecord::summary)
        .collect();
    let totals = TeamTotals::projected(m.team1, m.team2, &summaries, current.innings_id);
    let score = current.projection.aggregate.score_state();
    let input = MatchEndInput {
        score: &score,
        rules: &m.rules,
        innings_number: current.innings_number,
        is_super_over: current.is_super_over,
        totals: &totals,
    };

    let mut detection = detect(&input, &current.limits(&m.rules));
    if current.state.is_finished() && !detection.innings_end {
        detection.innings_end = true;
        detection.confirm_super_over =
            confirm_super_over(true, detection.target_state, &m.rules);
    }
    detection
}

/// What the latest change did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvents {
    pub wicket: bool,
    pub over_end: bool,
    pub innings_end: bool,
    pub match_end: bool,
    pub target_state: Option<TargetState>,
}

impl DeliveryEvents {
    pub fn new(applied: Option<&AppliedBall>, detection: &Detection) -> Self {
        Self {
            wicket: applied.is_some_and(|a| a.wicket),
            over_end: applied.is_some_and(|a| a.outcome.over_end),
            innings_end: detection.innings_end,
            match_end: detection.match_complete(),
            target_state: detection.target_state,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsReadModel {
    pub match_id: MatchId,
    pub innings_id: InningsId,
    pub innings_number: u32,
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    pub state: InningsState,
    pub is_super_over: bool,
    pub super_over_index: u32,
    pub is_follow_on: bool,
    pub declared: bool,
    pub aggregate: InningsAggregate,
    /// Overs bowled, e.g. `12.3`.
    pub overs: String,
    pub effective_target: Option<u32>,
    pub effective_max_overs: Option<u32>,
    pub batting: Vec<BatterStats>,
    pub bowling: Vec<BowlerStats>,
    pub detection: Detection,
    pub actions: RequiredActions,
    pub events: DeliveryEvents,
    /// Crease slots for the next delivery. Empty slots need a selection.
    pub next: Participants,
    /// Hex head hash of the innings ledger.
    pub digest: Option<String>,
}

impl InningsReadModel {
    pub fn build(
        m: &MatchRecord,
        innings: &[InningsRecord],
        current: &InningsRecord,
        digest: Option<[u8; 32]>,
    ) -> Self {
        let detection = detect_for(m, innings, current);
        let aggregate = current.projection.aggregate.clone();
        let score = aggregate.score_state();
        let next = aggregate.participants;

        let actions = if current.state == InningsState::Active {
            RequiredActions::determine(&next, Some(&detection))
        } else {
            RequiredActions {
                ask_follow_on: detection.ask_follow_on(),
                confirm_super_over: detection.confirm_super_over,
                ..RequiredActions::default()
            }
        };

        Self {
            match_id: m.match_id,
            innings_id: current.innings_id,
            innings_number: current.innings_number,
            batting_team: current.batting_team,
            bowling_team: current.bowling_team,
            state: current.state,
            is_super_over: current.is_super_over,
            super_over_index: current.super_over_index,
            is_follow_on: current.is_follow_on,
            declared: current.declared,
            overs: overs_notation(aggregate.legal_balls, m.rules.balls_per_over),
            effective_target: score.effective_target(),
            effective_max_overs: score.effective_max_overs(&current.limits(&m.rules)),
            batting: current.projection.batting.clone(),
            bowling: current.projection.bowling.clone(),
            detection,
            actions,
            events: DeliveryEvents::new(current.last_applied.as_ref(), &detection),
            next,
            digest: digest.map(hex::encode),
            aggregate,
        }
    }

    /// One-line score, e.g. `143/4 (17.2 ov)`.
    pub fn score_line(&self) -> String {
        format!(
            "{}/{} ({} ov)",
            self.aggregate.runs, self.aggregate.wickets, self.overs
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReadModel {
    pub match_id: MatchId,
    pub team1: TeamId,
    pub team2: TeamId,
    pub rules: Rules,
    pub state: MatchState,
    pub innings: Vec<InningsSummary>,
    /// The active innings, else the most recently started one.
    pub current: Option<InningsReadModel>,
}

/// Returned by a successful delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub ball: BallRef,
    pub over_number: u32,
    pub ball_in_over: u32,
    pub runs: RunsBreakdown,
    pub events: DeliveryEvents,
    pub innings: InningsReadModel,
}
