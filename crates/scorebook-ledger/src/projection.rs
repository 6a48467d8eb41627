//! Derived innings state.
//!
//! An [`InningsProjection`] is never authoritative: it is always
//! reproducible by replaying the innings' ball records from empty state and
//! then re-applying its penalty records. The live append path and
//! [`ReplayEngine`](crate::ReplayEngine) call the same `apply_*` methods.

use serde::{Deserialize, Serialize};

use scorebook_engine::{
    Outcome, OutcomeEngine, OutcomeRequest, Participants, ScoreState, TargetState,
};
use scorebook_types::{DismissalKind, InningsId, PlayerId};

use crate::error::LedgerError;
use crate::records::{BallRecord, BallRef, PenaltyRecord};

/// Chase settings of an innings. Orthogonal to ball history, so a rebuild
/// carries them over unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaseContext {
    pub is_chasing: bool,
    pub target_runs: Option<u32>,
    pub revised_target_runs: Option<u32>,
    pub revised_max_overs: Option<u32>,
}

impl ChaseContext {
    pub fn chasing(target_runs: u32) -> Self {
        Self {
            is_chasing: true,
            target_runs: Some(target_runs),
            ..Self::default()
        }
    }
}

/// Running totals and crease state of one innings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsAggregate {
    pub innings_id: InningsId,
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    pub completed_overs: u32,
    pub extras: u32,
    pub penalty_extras: u32,
    pub chase: ChaseContext,
    pub target_achieved: bool,
    pub participants: Participants,
    pub last_ball: Option<BallRef>,
}

impl InningsAggregate {
    pub fn new(innings_id: InningsId, chase: ChaseContext) -> Self {
        Self {
            innings_id,
            runs: 0,
            wickets: 0,
            legal_balls: 0,
            completed_overs: 0,
            extras: 0,
            penalty_extras: 0,
            chase,
            target_achieved: false,
            participants: Participants::default(),
            last_ball: None,
        }
    }

    pub fn last_ball_number(&self) -> u32 {
        self.last_ball.map_or(0, |b| b.ball_number)
    }

    /// View used by outcome detection.
    pub fn score_state(&self) -> ScoreState {
        ScoreState {
            runs: self.runs,
            wickets: self.wickets,
            completed_overs: self.completed_overs,
            is_chasing: self.chase.is_chasing,
            target_runs: self.chase.target_runs,
            revised_target_runs: self.chase.revised_target_runs,
            revised_max_overs: self.chase.revised_max_overs,
        }
    }
}

/// Batting figures for one player in one innings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatterStats {
    pub player: PlayerId,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub is_out: bool,
    pub dismissal: Option<DismissalKind>,
}

impl BatterStats {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            runs: 0,
            balls: 0,
            fours: 0,
            sixes: 0,
            is_out: false,
            dismissal: None,
        }
    }
}

/// Bowling figures for one player in one innings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowlerStats {
    pub player: PlayerId,
    pub legal_balls: u32,
    pub runs_conceded: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
}

impl BowlerStats {
    fn new(player: PlayerId) -> Self {
        Self {
            player,
            legal_balls: 0,
            runs_conceded: 0,
            wickets: 0,
            wides: 0,
            no_balls: 0,
        }
    }
}

/// Effect of applying one ball.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedBall {
    pub ball_number: u32,
    pub outcome: Outcome,
    pub wicket: bool,
}

/// Aggregate plus per-player figures for one innings. Stats rows appear in
/// first-touch order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsProjection {
    pub balls_per_over: u32,
    pub aggregate: InningsAggregate,
    pub batting: Vec<BatterStats>,
    pub bowling: Vec<BowlerStats>,
}

impl InningsProjection {
    pub fn new(innings_id: InningsId, balls_per_over: u32, chase: ChaseContext) -> Self {
        Self {
            balls_per_over,
            aggregate: InningsAggregate::new(innings_id, chase),
            batting: Vec::new(),
            bowling: Vec::new(),
        }
    }

    /// Empty projection for the same innings, keeping the chase context.
    pub fn reset(&self) -> Self {
        Self::new(
            self.aggregate.innings_id,
            self.balls_per_over,
            self.aggregate.chase,
        )
    }

    pub fn innings_id(&self) -> InningsId {
        self.aggregate.innings_id
    }

    pub fn batter(&self, player: PlayerId) -> Option<&BatterStats> {
        self.batting.iter().find(|b| b.player == player)
    }

    pub fn bowler(&self, player: PlayerId) -> Option<&BowlerStats> {
        self.bowling.iter().find(|b| b.player == player)
    }

    /// Has `player` lost their wicket in this innings?
    pub fn is_out(&self, player: PlayerId) -> bool {
        self.batter(player).is_some_and(|b| b.is_out)
    }

    fn batter_mut(&mut self, player: PlayerId) -> &mut BatterStats {
        let index = match self.batting.iter().position(|b| b.player == player) {
            Some(index) => index,
            None => {
                self.batting.push(BatterStats::new(player));
                self.batting.len() - 1
            }
        };
        &mut self.batting[index]
    }

    fn bowler_mut(&mut self, player: PlayerId) -> &mut BowlerStats {
        let index = match self.bowling.iter().position(|b| b.player == player) {
            Some(index) => index,
            None => {
                self.bowling.push(BowlerStats::new(player));
                self.bowling.len() - 1
            }
        };
        &mut self.bowling[index]
    }

    /// Fill empty crease slots chosen by the scorer. Slots already set are
    /// left untouched.
    pub fn fill_participants(&mut self, selection: Participants) {
        let slots = &mut self.aggregate.participants;
        slots.striker = slots.striker.or(selection.striker);
        slots.non_striker = slots.non_striker.or(selection.non_striker);
        slots.bowler = slots.bowler.or(selection.bowler);
    }

    /// Apply the next ball of the innings.
    pub fn apply_ball(&mut self, record: &BallRecord) -> Result<AppliedBall, LedgerError> {
        let fact = &record.fact;
        if fact.innings_id != self.aggregate.innings_id {
            return Err(LedgerError::IntegrityViolation {
                ball_number: fact.ball_number,
                reason: format!("ball belongs to innings {}", fact.innings_id),
            });
        }
        let expected = self.aggregate.last_ball_number() + 1;
        if fact.ball_number != expected {
            return Err(LedgerError::IntegrityViolation {
                ball_number: fact.ball_number,
                reason: format!("expected ball {expected}"),
            });
        }

        let request = OutcomeRequest {
            runs: fact.runs,
            is_legal: fact.is_legal,
            ball_in_over: fact.ball_in_over,
            balls_per_over: self.balls_per_over,
            dismissed: fact.dismissed(),
        };
        let at_crease = Participants::new(fact.striker, fact.non_striker, fact.bowler);
        let outcome = OutcomeEngine::next(&request, &at_crease);
        let wicket = fact
            .dismissal
            .as_ref()
            .is_some_and(|d| d.kind.counts_as_wicket());

        let agg = &mut self.aggregate;
        agg.runs += fact.runs.total();
        agg.extras += fact.runs.extras();
        if wicket {
            agg.wickets += 1;
        }
        if fact.is_legal {
            agg.legal_balls += 1;
            if outcome.over_end {
                agg.completed_overs += 1;
            }
        }
        agg.participants = outcome.next;
        agg.last_ball = Some(BallRef::from(record));

        let striker = self.batter_mut(fact.striker);
        striker.runs += fact.runs.off_bat;
        if fact.runs.wide_runs == 0 {
            striker.balls += 1;
        }
        match fact.runs.off_bat {
            4 => striker.fours += 1,
            6 => striker.sixes += 1,
            _ => {}
        }
        self.batter_mut(fact.non_striker);

        if let Some(dismissal) = &fact.dismissal {
            let batter = self.batter_mut(dismissal.dismissed);
            batter.is_out = dismissal.kind.counts_as_wicket();
            batter.dismissal = Some(dismissal.kind);
        }

        let bowler = self.bowler_mut(fact.bowler);
        bowler.runs_conceded += fact.runs.conceded_by_bowler();
        if fact.runs.wide_runs > 0 {
            bowler.wides += 1;
        }
        if fact.runs.no_ball_runs > 0 {
            bowler.no_balls += 1;
        }
        if fact.is_legal {
            bowler.legal_balls += 1;
        }
        if fact
            .dismissal
            .as_ref()
            .is_some_and(|d| d.bowler_credited == Some(fact.bowler))
        {
            bowler.wickets += 1;
        }

        self.refresh_target();

        Ok(AppliedBall {
            ball_number: fact.ball_number,
            outcome,
            wicket,
        })
    }

    /// Add awarded penalty runs to this innings. They count as extras.
    pub fn apply_penalty(&mut self, penalty: &PenaltyRecord) -> Result<(), LedgerError> {
        if penalty.award.receiving_innings != self.aggregate.innings_id {
            return Err(LedgerError::IntegrityViolation {
                ball_number: self.aggregate.last_ball_number(),
                reason: format!("penalty {} awarded to another innings", penalty.penalty_id),
            });
        }
        let agg = &mut self.aggregate;
        agg.runs += penalty.award.runs;
        agg.extras += penalty.award.runs;
        agg.penalty_extras += penalty.award.runs;
        self.refresh_target();
        Ok(())
    }

    /// Replace the chase context, e.g. after a DLS revision.
    pub fn set_chase(&mut self, chase: ChaseContext) {
        self.aggregate.chase = chase;
        self.refresh_target();
    }

    /// The one place `target_achieved` is computed.
    pub fn refresh_target(&mut self) {
        self.aggregate.target_achieved = self
            .aggregate
            .score_state()
            .target_state()
            .is_some_and(|s| s == TargetState::Won);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::fixtures::fact;
    use crate::records::{BallFact, PenaltyAward};
    use chrono::Utc;
    use scorebook_engine::classify_runs;
    use scorebook_types::{BallId, DeliveryInput, Dismissal, DismissalInput, MatchId, OwnerId, TeamId};

    struct Crease {
        a: PlayerId,
        b: PlayerId,
        bowler: PlayerId,
    }

    fn crease() -> Crease {
        Crease {
            a: PlayerId::new(),
            b: PlayerId::new(),
            bowler: PlayerId::new(),
        }
    }

    fn record(fact: BallFact) -> BallRecord {
        BallRecord {
            ball_id: BallId::new(),
            fact,
            recorded_by: OwnerId::new(),
            recorded_at: Utc::now(),
            prev_hash: None,
            record_hash: [0; 32],
        }
    }

    fn ball(
        projection: &InningsProjection,
        striker: PlayerId,
        non_striker: PlayerId,
        bowler: PlayerId,
        input: impl FnOnce(DeliveryInput) -> DeliveryInput,
    ) -> BallRecord {
        let input = input(DeliveryInput::new(striker, non_striker, bowler));
        let agg = &projection.aggregate;
        let seq = scorebook_engine::next_sequence(
            agg.last_ball_number(),
            agg.legal_balls,
            projection.balls_per_over,
        );
        let mut f = fact(agg.innings_id, seq.ball_number, [striker, non_striker, bowler]);
        f.over_number = seq.over_number;
        f.ball_in_over = seq.ball_in_over;
        f.is_legal = input.is_legal();
        f.completed_runs = input.completed_runs;
        f.runs = classify_runs(&input);
        f.is_boundary = scorebook_engine::is_boundary(&input);
        f.dismissal = scorebook_engine::resolve_dismissal(&input);
        record(f)
    }

    #[test]
    fn six_dot_balls_complete_an_over() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let mut last = None;
        for _ in 0..6 {
            let r = ball(&p, c.a, c.b, c.bowler, |i| i);
            last = Some(p.apply_ball(&r).unwrap());
        }
        let agg = &p.aggregate;
        assert_eq!(agg.completed_overs, 1);
        assert_eq!(agg.legal_balls, 6);
        assert!(last.unwrap().outcome.over_end);
        assert_eq!(agg.participants.striker, Some(c.b));
        assert_eq!(agg.participants.bowler, None);
        assert_eq!(p.bowler(c.bowler).unwrap().legal_balls, 6);
        assert_eq!(p.batter(c.a).unwrap().balls, 6);
    }

    #[test]
    fn wide_does_not_count_as_ball() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let r = ball(&p, c.a, c.b, c.bowler, |i| i.wide().runs(1));
        let applied = p.apply_ball(&r).unwrap();

        assert!(applied.outcome.strike_rotated);
        let agg = &p.aggregate;
        assert_eq!((agg.runs, agg.extras, agg.legal_balls), (2, 2, 0));
        assert_eq!(p.batter(c.a).unwrap().balls, 0);
        let bowler = p.bowler(c.bowler).unwrap();
        assert_eq!((bowler.wides, bowler.runs_conceded, bowler.legal_balls), (1, 2, 0));
    }

    #[test]
    fn no_ball_counts_as_faced_but_not_legal() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let r = ball(&p, c.a, c.b, c.bowler, |i| i.no_ball().runs(4));
        p.apply_ball(&r).unwrap();

        let batter = p.batter(c.a).unwrap();
        assert_eq!((batter.runs, batter.balls, batter.fours), (4, 1, 1));
        assert_eq!(p.aggregate.runs, 5);
        assert_eq!(p.aggregate.legal_balls, 0);
        assert_eq!(p.bowler(c.bowler).unwrap().no_balls, 1);
    }

    #[test]
    fn byes_are_not_charged_to_bowler() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let r = ball(&p, c.a, c.b, c.bowler, |i| i.leg_bye().runs(2));
        p.apply_ball(&r).unwrap();
        assert_eq!(p.aggregate.extras, 2);
        assert_eq!(p.bowler(c.bowler).unwrap().runs_conceded, 0);
        assert_eq!(p.batter(c.a).unwrap().runs, 0);
    }

    #[test]
    fn caught_counts_wicket_for_bowler() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let a = c.a;
        let r = ball(&p, c.a, c.b, c.bowler, |i| {
            i.dismissal(DismissalInput::new(DismissalKind::Caught, a))
        });
        let applied = p.apply_ball(&r).unwrap();

        assert!(applied.wicket);
        assert_eq!(p.aggregate.wickets, 1);
        assert!(p.is_out(c.a));
        assert_eq!(p.bowler(c.bowler).unwrap().wickets, 1);
        assert_eq!(p.aggregate.participants.striker, None);
    }

    #[test]
    fn run_out_of_non_striker_marks_them_out() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let b = c.b;
        let r = ball(&p, c.a, c.b, c.bowler, |i| {
            i.dismissal(DismissalInput::new(DismissalKind::RunOut, b))
        });
        p.apply_ball(&r).unwrap();

        assert!(p.is_out(c.b));
        assert_eq!(p.bowler(c.bowler).unwrap().wickets, 0);
        assert_eq!(p.aggregate.participants.non_striker, None);
        assert_eq!(p.aggregate.participants.striker, Some(c.a));
    }

    #[test]
    fn retired_hurt_is_not_a_wicket() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let a = c.a;
        let r = ball(&p, c.a, c.b, c.bowler, |i| {
            i.dismissal(DismissalInput::new(
                DismissalKind::RetiredHurt,
                a,
            ))
        });
        let applied = p.apply_ball(&r).unwrap();

        assert!(!applied.wicket);
        assert_eq!(p.aggregate.wickets, 0);
        assert!(!p.is_out(c.a));
        assert_eq!(p.aggregate.participants.striker, None);
        assert_eq!(
            p.batter(c.a).unwrap().dismissal,
            Some(DismissalKind::RetiredHurt)
        );
    }

    #[test]
    fn rejects_out_of_order_ball() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let mut r = ball(&p, c.a, c.b, c.bowler, |i| i);
        r.fact.ball_number = 2;
        assert!(matches!(
            p.apply_ball(&r),
            Err(LedgerError::IntegrityViolation { ball_number: 2, .. })
        ));
    }

    #[test]
    fn target_achieved_tracks_chase() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::chasing(5));
        let r = ball(&p, c.a, c.b, c.bowler, |i| i.runs(4));
        p.apply_ball(&r).unwrap();
        assert!(!p.aggregate.target_achieved);

        let r = ball(&p, c.a, c.b, c.bowler, |i| i.runs(2));
        p.apply_ball(&r).unwrap();
        assert!(p.aggregate.target_achieved);

        // A revised target above the score clears the flag.
        let mut chase = p.aggregate.chase;
        chase.revised_target_runs = Some(10);
        p.set_chase(chase);
        assert!(!p.aggregate.target_achieved);
    }

    #[test]
    fn penalty_adds_extras() {
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let penalty = PenaltyRecord::new(
            PenaltyAward {
                match_id: MatchId::new(),
                penalized_innings: InningsId::new(),
                receiving_innings: p.innings_id(),
                receiving_team: TeamId::named("Home"),
                runs: 5,
                reason: "fielder helmet".into(),
            },
            OwnerId::new(),
        );
        p.apply_penalty(&penalty).unwrap();
        let agg = &p.aggregate;
        assert_eq!((agg.runs, agg.extras, agg.penalty_extras), (5, 5, 5));

        let mut other = penalty.clone();
        other.award.receiving_innings = InningsId::new();
        assert!(p.apply_penalty(&other).is_err());
    }

    #[test]
    fn fill_participants_keeps_occupied_slots() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        p.fill_participants(Participants {
            striker: Some(c.a),
            non_striker: None,
            bowler: Some(c.bowler),
        });
        let newcomer = PlayerId::new();
        p.fill_participants(Participants {
            striker: Some(newcomer),
            non_striker: Some(c.b),
            bowler: None,
        });
        assert_eq!(
            p.aggregate.participants,
            Participants::new(c.a, c.b, c.bowler)
        );
    }

    #[test]
    fn dismissal_record_round_trips_into_stats() {
        let c = crease();
        let mut p = InningsProjection::new(InningsId::new(), 6, ChaseContext::default());
        let mut r = ball(&p, c.a, c.b, c.bowler, |i| i);
        r.fact.dismissal = Some(Dismissal {
            kind: DismissalKind::Stumped,
            dismissed: c.a,
            bowler_credited: Some(c.bowler),
            fielder: None,
        });
        p.apply_ball(&r).unwrap();
        assert_eq!(p.batter(c.a).unwrap().dismissal, Some(DismissalKind::Stumped));
        assert_eq!(p.bowler(c.bowler).unwrap().wickets, 1);
    }
}
