use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use scorebook_engine::{
    classify_runs, is_boundary, next_sequence, resolve_dismissal, validate_crease,
    validate_delivery, Participants, ValidationError,
};
use scorebook_ledger::{
    BallFact, BallRef, ChaseContext, InMemoryLedger, LedgerReader, LedgerWriter, PenaltyAward,
    PenaltyRecord, ReplayEngine, StreamValidator, ValidationReport,
};
use scorebook_types::{
    DeliveryInput, InningsId, InningsState, MatchId, MatchState, PenaltyId, PlayerId, Rules,
    RulesRegistry, ScopeContext, TeamId,
};

use crate::config::ScorerConfig;
use crate::error::{ScoringError, ScoringResult};
use crate::lifecycle::{plan_next_innings, NextInnings};
use crate::locks::LockTable;
use crate::read_model::{detect_for, DeliveryReceipt, InningsReadModel, MatchReadModel};
use crate::roster::{RosterProvider, StaticRoster};
use crate::store::{InningsRecord, MatchRecord, MatchStore, NewInnings};

/// Side that receives awarded penalty runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AwardedTo {
    Batting,
    Bowling,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyReceipt {
    pub penalty_id: PenaltyId,
    pub receiving_innings: InningsId,
    pub receiving_team: TeamId,
    pub runs: u32,
    /// The receiving innings was created as an OPEN placeholder.
    pub placeholder_created: bool,
    /// The award decided the match.
    pub match_ended: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsClosed {
    pub innings: InningsReadModel,
    pub match_ended: bool,
}

/// The scoring engine facade.
///
/// Every mutation of an innings runs under that innings' lock. Operations
/// that create, activate or close innings also hold the match lock, which
/// is always taken first. Reads take no engine locks and see committed
/// snapshots.
pub struct Scorer<L = InMemoryLedger> {
    config: ScorerConfig,
    registry: RwLock<RulesRegistry>,
    ledger: L,
    roster: Arc<dyn RosterProvider>,
    store: MatchStore,
    match_locks: LockTable<MatchId>,
    innings_locks: LockTable<InningsId>,
}

impl Scorer<InMemoryLedger> {
    /// Scorer backed by an in-memory ledger and an empty [`StaticRoster`].
    pub fn new(config: ScorerConfig) -> ScoringResult<Self> {
        Self::with_parts(config, InMemoryLedger::new(), Arc::new(StaticRoster::new()))
    }
}

impl<L: LedgerReader + LedgerWriter> Scorer<L> {
    pub fn with_parts(
        config: ScorerConfig,
        ledger: L,
        roster: Arc<dyn RosterProvider>,
    ) -> ScoringResult<Self> {
        let mut registry = RulesRegistry::builtin();
        for rules in &config.formats {
            registry.register(rules.clone())?;
        }
        Ok(Self {
            config,
            registry: RwLock::new(registry),
            ledger,
            roster,
            store: MatchStore::new(),
            match_locks: LockTable::new("match"),
            innings_locks: LockTable::new("innings"),
        })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ---- Formats ----

    fn registry(&self) -> ScoringResult<RwLockReadGuard<'_, RulesRegistry>> {
        self.registry
            .read()
            .map_err(|_| ScoringError::Internal("rules registry lock poisoned".into()))
    }

    pub fn register_format(&self, rules: Rules) -> ScoringResult<()> {
        let code = rules.code.clone();
        self.registry
            .write()
            .map_err(|_| ScoringError::Internal("rules registry lock poisoned".into()))?
            .register(rules)?;
        info!(code = %code, "format registered");
        Ok(())
    }

    pub fn rules(&self, code: &str) -> ScoringResult<Rules> {
        Ok(self.registry()?.get(code)?.clone())
    }

    pub fn formats(&self) -> ScoringResult<Vec<Rules>> {
        Ok(self.registry()?.iter().cloned().collect())
    }

    // ---- Match lifecycle ----

    pub fn create_match(
        &self,
        scope: &ScopeContext,
        team1: TeamId,
        team2: TeamId,
        format: &str,
    ) -> ScoringResult<MatchRecord> {
        if team1 == team2 {
            return Err(ScoringError::InvalidRequest(
                "a match needs two different teams".into(),
            ));
        }
        let record = MatchRecord {
            match_id: MatchId::new(),
            team1,
            team2,
            rules: self.rules(format)?,
            state: MatchState::Draft,
            created_by: scope.owner,
            created_at: Utc::now(),
        };
        self.store.insert_match(record.clone())?;
        info!(
            match_id = %record.match_id,
            format = %record.rules.code,
            scope = %scope,
            "match created"
        );
        Ok(record)
    }

    /// DRAFT -> READY once both playing XIs are known.
    pub fn mark_ready(&self, scope: &ScopeContext, match_id: MatchId) -> ScoringResult<MatchRecord> {
        self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            if self.config.enforce_roster {
                for team in [m.team1, m.team2] {
                    let named = self
                        .roster
                        .playing_xi(match_id, team)
                        .is_some_and(|xi| !xi.is_empty());
                    if !named {
                        return Err(ScoringError::Roster(format!(
                            "no playing XI named for team {team}"
                        )));
                    }
                }
            }
            self.set_match_state(match_id, MatchState::Ready)?;
            debug!(match_id = %match_id, scope = %scope, "match ready");
            self.store.get_match(match_id)
        })
    }

    /// Open the scoring session for a match.
    ///
    /// Resumes the active innings if there is one. Otherwise a placeholder
    /// innings left by a penalty award becomes the next innings, or
    /// innings 1 is created with `batting_first` (default: team 1) batting.
    pub fn start_session(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
        batting_first: Option<TeamId>,
    ) -> ScoringResult<InningsReadModel> {
        let innings_id = self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            if !matches!(m.state, MatchState::Ready | MatchState::InProgress) {
                return Err(ScoringError::InvalidState(format!(
                    "cannot score a {} match",
                    m.state
                )));
            }

            let innings = self.store.innings_for(match_id)?;
            let record = if let Some(active) = innings.iter().find(|i| i.state == InningsState::Active)
            {
                debug!(match_id = %match_id, innings_id = %active.innings_id, "session resumed");
                active.clone()
            } else if innings.iter().any(InningsRecord::was_played) {
                if !innings.iter().any(|i| i.state == InningsState::Open) {
                    return Err(ScoringError::InvalidState(
                        "no innings to resume; start the next innings".into(),
                    ));
                }
                self.open_next_innings(scope, &m, &innings, NextInnings::default())?
            } else {
                let batting = batting_first.unwrap_or(m.team1);
                if !m.has_team(batting) {
                    return Err(ScoringError::InvalidRequest(format!(
                        "team {batting} is not playing this match"
                    )));
                }
                let record = InningsRecord::new(
                    &m,
                    NewInnings {
                        innings_number: 1,
                        batting_team: batting,
                        bowling_team: m.opponent(batting),
                        state: InningsState::Active,
                        is_super_over: false,
                        super_over_index: 0,
                        is_follow_on: false,
                        chase: ChaseContext::default(),
                    },
                );
                self.store.insert_innings(record.clone())?;
                info!(
                    match_id = %match_id,
                    innings_id = %record.innings_id,
                    innings_number = 1,
                    batting_team = %batting,
                    scope = %scope,
                    "innings started"
                );
                record
            };

            if m.state == MatchState::Ready {
                self.set_match_state(match_id, MatchState::InProgress)?;
            }
            Ok(record.innings_id)
        })?;
        self.innings_read_model(innings_id)
    }

    pub fn start_next_innings(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
        request: NextInnings,
    ) -> ScoringResult<InningsReadModel> {
        let innings_id = self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            match m.state {
                MatchState::InProgress => {}
                MatchState::Completed if request.super_over => {}
                other => {
                    return Err(ScoringError::InvalidState(format!(
                        "cannot start an innings in a {other} match"
                    )))
                }
            }
            let innings = self.store.innings_for(match_id)?;
            let record = self.open_next_innings(scope, &m, &innings, request)?;
            if m.state == MatchState::Completed {
                self.set_match_state(match_id, MatchState::InProgress)?;
            }
            Ok(record.innings_id)
        })?;
        self.innings_read_model(innings_id)
    }

    /// Plan and activate the next innings. Caller holds the match lock.
    fn open_next_innings(
        &self,
        scope: &ScopeContext,
        m: &MatchRecord,
        innings: &[InningsRecord],
        request: NextInnings,
    ) -> ScoringResult<InningsRecord> {
        let plan = plan_next_innings(m, innings, request)?;
        if let Some(renumber) = plan.displace {
            self.innings_locks.with_lock(renumber.innings_id, || {
                let mut record = self.store.get_innings(renumber.innings_id)?;
                let from = record.innings_number;
                record.innings_number = renumber.innings_number;
                self.store.put_innings(record)?;
                debug!(
                    match_id = %m.match_id,
                    innings_id = %renumber.innings_id,
                    from,
                    to = renumber.innings_number,
                    "placeholder innings renumbered"
                );
                Ok(())
            })?;
        }
        let record = match plan.reuse {
            Some(id) => self.innings_locks.with_lock(id, || {
                let mut record = self.store.get_innings(id)?;
                record.state = record.state.transition_to(InningsState::Active)?;
                record.started_at = Some(Utc::now());
                record.bowling_team = plan.fields.bowling_team;
                record.is_follow_on = plan.fields.is_follow_on;
                record.projection.set_chase(plan.fields.chase);
                self.store.put_innings(record.clone())?;
                Ok(record)
            })?,
            None => {
                let record = InningsRecord::new(m, plan.fields);
                self.store.insert_innings(record.clone())?;
                record
            }
        };

        info!(
            match_id = %m.match_id,
            innings_id = %record.innings_id,
            innings_number = record.innings_number,
            batting_team = %record.batting_team,
            super_over = record.is_super_over,
            follow_on = record.is_follow_on,
            chase_target = ?record.projection.aggregate.chase.target_runs,
            reused_placeholder = plan.reuse.is_some(),
            scope = %scope,
            "innings started"
        );
        Ok(record)
    }

    pub fn end_active_innings(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
    ) -> ScoringResult<InningsClosed> {
        self.close_active_innings(scope, match_id, false)
    }

    /// Close the active innings by declaration. Longest format only.
    pub fn declare_innings(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
    ) -> ScoringResult<InningsClosed> {
        self.close_active_innings(scope, match_id, true)
    }

    fn close_active_innings(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
        declare: bool,
    ) -> ScoringResult<InningsClosed> {
        self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            if declare && !m.rules.is_longest_format() {
                return Err(ScoringError::InvalidState(format!(
                    "declarations are not allowed in {}",
                    m.rules.code
                )));
            }
            let innings_id = self
                .store
                .active_innings(match_id)?
                .ok_or(ScoringError::NoActiveInnings(match_id))?
                .innings_id;

            let record = self.innings_locks.with_lock(innings_id, || {
                let mut record = self.store.get_innings(innings_id)?;
                record.state = record.state.transition_to(InningsState::Completed)?;
                record.declared = declare;
                self.store.put_innings(record.clone())?;
                Ok(record)
            })?;

            let innings = self.store.innings_for(match_id)?;
            let match_ended = detect_for(&m, &innings, &record).match_complete();
            if match_ended && m.state != MatchState::Completed {
                self.set_match_state(match_id, MatchState::Completed)?;
            }
            info!(
                match_id = %match_id,
                innings_id = %innings_id,
                runs = record.projection.aggregate.runs,
                wickets = record.projection.aggregate.wickets,
                declared = declare,
                match_ended,
                scope = %scope,
                "innings closed"
            );

            Ok(InningsClosed {
                innings: self.innings_read_model(innings_id)?,
                match_ended,
            })
        })
    }

    /// OPEN or ACTIVE -> ABANDONED.
    pub fn abandon_innings(
        &self,
        scope: &ScopeContext,
        innings_id: InningsId,
    ) -> ScoringResult<InningsReadModel> {
        let match_id = self.store.get_innings(innings_id)?.match_id;
        self.match_locks.with_lock(match_id, || {
            self.innings_locks.with_lock(innings_id, || {
                let mut record = self.store.get_innings(innings_id)?;
                record.state = record.state.transition_to(InningsState::Abandoned)?;
                self.store.put_innings(record)?;
                info!(match_id = %match_id, innings_id = %innings_id, scope = %scope, "innings abandoned");
                Ok(())
            })
        })?;
        self.innings_read_model(innings_id)
    }

    /// Complete the match, closing the active innings if there is one.
    pub fn end_match(&self, scope: &ScopeContext, match_id: MatchId) -> ScoringResult<MatchReadModel> {
        self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            m.state.transition_to(MatchState::Completed)?;

            if let Some(active) = self.store.active_innings(match_id)? {
                self.innings_locks.with_lock(active.innings_id, || {
                    let mut record = self.store.get_innings(active.innings_id)?;
                    record.state = record.state.transition_to(InningsState::Completed)?;
                    self.store.put_innings(record)
                })?;
            }
            self.set_match_state(match_id, MatchState::Completed)?;
            info!(match_id = %match_id, scope = %scope, "match ended");
            Ok(())
        })?;
        self.read_model(match_id)
    }

    fn set_match_state(&self, match_id: MatchId, next: MatchState) -> ScoringResult<()> {
        let from = self.store.update_match(match_id, |m| {
            let from = m.state;
            m.state = m.state.transition_to(next)?;
            Ok(from)
        })?;
        info!(match_id = %match_id, from = %from, to = %next, "match state changed");
        Ok(())
    }

    // ---- Crease ----

    /// Fill empty crease slots: the opening pair, a new batter after a
    /// wicket, a new bowler after an over. Occupied slots may only be
    /// re-selected with the same player.
    pub fn select_participants(
        &self,
        scope: &ScopeContext,
        innings_id: InningsId,
        selection: Participants,
    ) -> ScoringResult<InningsReadModel> {
        self.innings_locks.with_lock(innings_id, || {
            let mut record = self.store.get_innings(innings_id)?;
            if record.state != InningsState::Active {
                return Err(ScoringError::InvalidState(format!(
                    "innings {} is {}",
                    record.innings_number, record.state
                )));
            }
            let m = self.store.get_match(record.match_id)?;
            let current = record.projection.aggregate.participants;
            check_slot("striker", current.striker, selection.striker)?;
            check_slot("non-striker", current.non_striker, selection.non_striker)?;
            check_slot("bowler", current.bowler, selection.bowler)?;

            let filled = Participants {
                striker: current.striker.or(selection.striker),
                non_striker: current.non_striker.or(selection.non_striker),
                bowler: current.bowler.or(selection.bowler),
            };
            if let (Some(striker), Some(non_striker)) = (filled.striker, filled.non_striker) {
                if striker == non_striker {
                    return Err(ValidationError::SameBatters(striker).into());
                }
            }
            if let Some(bowler) = filled.bowler.filter(|b| filled.is_batting(*b)) {
                return Err(ValidationError::BowlerIsBatting(bowler).into());
            }
            for incoming in [selection.striker, selection.non_striker].into_iter().flatten() {
                if !current.is_batting(incoming) && record.projection.is_out(incoming) {
                    return Err(ValidationError::BatterAlreadyOut(incoming).into());
                }
            }
            self.check_roster(&m, &record, &filled)?;

            record.projection.fill_participants(selection);
            self.store.put_innings(record)?;
            debug!(innings_id = %innings_id, scope = %scope, "participants selected");
            Ok(())
        })?;
        self.innings_read_model(innings_id)
    }

    fn check_roster(
        &self,
        m: &MatchRecord,
        record: &InningsRecord,
        crease: &Participants,
    ) -> ScoringResult<()> {
        if !self.config.enforce_roster {
            return Ok(());
        }
        let batters = [crease.striker, crease.non_striker]
            .into_iter()
            .flatten()
            .map(|p| (record.batting_team, p));
        let bowler = crease.bowler.map(|p| (record.bowling_team, p));
        for (team, player) in batters.chain(bowler) {
            if !self.roster.is_eligible(m.match_id, team, player) {
                return Err(ScoringError::Roster(format!(
                    "player {player} is not in the playing XI of team {team}"
                )));
            }
        }
        Ok(())
    }

    // ---- Deliveries ----

    /// Validate, sequence and append one delivery to the active innings,
    /// then update its projection.
    pub fn record_delivery(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
        input: DeliveryInput,
    ) -> ScoringResult<DeliveryReceipt> {
        validate_delivery(&input)?;
        let m = self.store.get_match(match_id)?;
        if !m.state.is_live() {
            return Err(ScoringError::InvalidState(format!("match is {}", m.state)));
        }
        let innings_id = self
            .store
            .active_innings(match_id)?
            .ok_or(ScoringError::NoActiveInnings(match_id))?
            .innings_id;

        self.innings_locks.with_lock(innings_id, || {
            let mut record = self.store.get_innings(innings_id)?;
            if record.state != InningsState::Active {
                return Err(ScoringError::NoActiveInnings(match_id));
            }
            let innings = self.store.innings_for(match_id)?;
            if detect_for(&m, &innings, &record).innings_end {
                return Err(ScoringError::InvalidState(format!(
                    "innings {} has ended",
                    record.innings_number
                )));
            }

            let agg = &record.projection.aggregate;
            let seq = next_sequence(agg.last_ball_number(), agg.legal_balls, m.rules.balls_per_over);
            if let Some(found) = input.expected_ball_number {
                if found != seq.ball_number {
                    warn!(
                        match_id = %match_id,
                        innings_id = %innings_id,
                        expected = seq.ball_number,
                        found,
                        "stale ball number"
                    );
                    return Err(ScoringError::SequenceMismatch {
                        expected: seq.ball_number,
                        found,
                    });
                }
            }
            if self.config.enforce_expected_participants {
                if let Err(err) = check_crease(&agg.participants, &input) {
                    warn!(match_id = %match_id, innings_id = %innings_id, error = %err, "crease mismatch");
                    return Err(err);
                }
            }
            validate_crease(&input, &agg.participants, |p| record.projection.is_out(p))?;
            self.check_roster(
                &m,
                &record,
                &Participants::new(input.striker, input.non_striker, input.bowler),
            )?;

            let fact = BallFact {
                innings_id,
                ball_number: seq.ball_number,
                over_number: seq.over_number,
                ball_in_over: seq.ball_in_over,
                is_legal: input.is_legal(),
                striker: input.striker,
                non_striker: input.non_striker,
                bowler: input.bowler,
                completed_runs: input.completed_runs,
                runs: classify_runs(&input),
                is_boundary: is_boundary(&input),
                dismissal: resolve_dismissal(&input),
                attachments: input.attachments.clone(),
            };
            let ball = self.ledger.append_ball(fact, scope.owner)?;
            let applied = match record.projection.apply_ball(&ball) {
                Ok(applied) => applied,
                Err(err) => {
                    self.ledger.remove_last_ball(innings_id)?;
                    return Err(err.into());
                }
            };
            record.last_applied = Some(applied);

            let detection = detect_for(&m, &innings, &record);
            self.store.put_innings(record.clone())?;
            if detection.match_complete() {
                self.set_match_state(match_id, MatchState::Completed)?;
            }

            debug!(
                match_id = %match_id,
                innings_id = %innings_id,
                ball_number = seq.ball_number,
                over = seq.over_number,
                ball_in_over = seq.ball_in_over,
                runs = ball.fact.runs.total(),
                wicket = applied.wicket,
                scope = %scope,
                "delivery recorded"
            );

            let m = self.store.get_match(match_id)?;
            let model = InningsReadModel::build(&m, &innings, &record, Some(ball.record_hash));
            Ok(DeliveryReceipt {
                ball: BallRef::from(&ball),
                over_number: seq.over_number,
                ball_in_over: seq.ball_in_over,
                runs: ball.fact.runs,
                events: model.events,
                innings: model,
            })
        })
    }

    /// Remove the most recent delivery of the active innings (or of the
    /// latest innings when none is active) and rebuild from the ledger.
    ///
    /// An innings or match closed by that delivery is reopened when its
    /// end condition no longer holds.
    ///
    /// Figures equal a rebuild of the remaining ledger, but the crease is
    /// set back to the removed ball's striker, non-striker and bowler
    /// rather than the slots a pure rebuild would leave.
    pub fn undo_last_delivery(
        &self,
        scope: &ScopeContext,
        match_id: MatchId,
    ) -> ScoringResult<InningsReadModel> {
        let innings_id = self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            let innings = self.store.innings_for(match_id)?;
            let target = innings
                .iter()
                .find(|i| i.state == InningsState::Active)
                .or_else(|| {
                    innings
                        .iter()
                        .filter(|i| i.was_played())
                        .max_by_key(|i| i.innings_number)
                })
                .ok_or(ScoringError::NoActiveInnings(match_id))?;
            if target.state == InningsState::Abandoned {
                return Err(ScoringError::InvalidState(format!(
                    "innings {} was abandoned",
                    target.innings_number
                )));
            }
            let innings_id = target.innings_id;

            self.innings_locks.with_lock(innings_id, || {
                let mut record = self.store.get_innings(innings_id)?;
                let removed = self
                    .ledger
                    .remove_last_ball(innings_id)?
                    .ok_or(ScoringError::NoDeliveries(innings_id))?;
                let rebuilt = match ReplayEngine::rebuild_projection(&self.ledger, &record.projection) {
                    Ok(rebuilt) => rebuilt,
                    Err(err) => {
                        self.ledger.append_ball(removed.fact, removed.recorded_by)?;
                        return Err(err.into());
                    }
                };
                record.projection = rebuilt.projection;
                record.last_applied = rebuilt.last_applied;
                // The crease goes back to how it stood for the removed ball.
                let fact = &removed.fact;
                record.projection.aggregate.participants =
                    Participants::new(fact.striker, fact.non_striker, fact.bowler);

                if record.state == InningsState::Completed && !record.declared {
                    let mut reopened = record.clone();
                    reopened.state = InningsState::Active;
                    if !detect_for(&m, &innings, &reopened).innings_end {
                        record.state = record.state.transition_to(InningsState::Active)?;
                        info!(match_id = %match_id, innings_id = %innings_id, "innings reopened");
                    }
                }

                let detection = detect_for(&m, &innings, &record);
                self.store.put_innings(record)?;
                if m.state == MatchState::Completed && !detection.match_complete() {
                    self.set_match_state(match_id, MatchState::InProgress)?;
                }

                debug!(
                    match_id = %match_id,
                    innings_id = %innings_id,
                    ball_number = removed.ball_number(),
                    scope = %scope,
                    "delivery undone"
                );
                Ok(innings_id)
            })
        })?;
        self.innings_read_model(innings_id)
    }

    /// Replace an innings' projection with a fresh rebuild from its ledger.
    ///
    /// Crease selections made since the last ball are kept.
    pub fn rebuild_innings(
        &self,
        scope: &ScopeContext,
        innings_id: InningsId,
    ) -> ScoringResult<InningsReadModel> {
        self.innings_locks.with_lock(innings_id, || {
            let mut record = self.store.get_innings(innings_id)?;
            let consistent = ReplayEngine::verify_projection(&self.ledger, &record.projection)?;
            let selected = record.projection.aggregate.participants;

            let rebuilt = ReplayEngine::rebuild_projection(&self.ledger, &record.projection)?;
            record.projection = rebuilt.projection;
            record.projection.fill_participants(selected);
            record.last_applied = rebuilt.last_applied;
            self.store.put_innings(record)?;

            if consistent {
                info!(
                    innings_id = %innings_id,
                    balls = rebuilt.applied_balls,
                    penalties = rebuilt.applied_penalties,
                    scope = %scope,
                    "innings rebuilt"
                );
            } else {
                warn!(innings_id = %innings_id, scope = %scope, "projection drift repaired by rebuild");
            }
            Ok(())
        })?;
        self.innings_read_model(innings_id)
    }

    // ---- Adjustments ----

    /// DLS override of an innings' target and/or maximum overs.
    pub fn apply_dls(
        &self,
        scope: &ScopeContext,
        innings_id: InningsId,
        revised_target_runs: Option<u32>,
        revised_max_overs: Option<u32>,
    ) -> ScoringResult<InningsReadModel> {
        if revised_target_runs.is_none() && revised_max_overs.is_none() {
            return Err(ScoringError::InvalidRequest(
                "revised target runs or revised max overs required".into(),
            ));
        }
        if revised_max_overs == Some(0) {
            return Err(ScoringError::InvalidRequest(
                "revised max overs must be greater than zero".into(),
            ));
        }

        let match_id = self.store.get_innings(innings_id)?.match_id;
        self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            self.innings_locks.with_lock(innings_id, || {
                let mut record = self.store.get_innings(innings_id)?;
                if record.state == InningsState::Abandoned {
                    return Err(ScoringError::InvalidState(format!(
                        "innings {} was abandoned",
                        record.innings_number
                    )));
                }
                let agg = &record.projection.aggregate;
                if let Some(overs) = revised_max_overs {
                    if overs < agg.completed_overs {
                        return Err(ScoringError::InvalidState(format!(
                            "revised max overs {overs} is below the {} overs already completed",
                            agg.completed_overs
                        )));
                    }
                }
                if revised_target_runs.is_some() && !agg.chase.is_chasing {
                    return Err(ScoringError::InvalidState(format!(
                        "innings {} is not a chase",
                        record.innings_number
                    )));
                }

                let mut chase = agg.chase;
                if revised_target_runs.is_some() {
                    chase.revised_target_runs = revised_target_runs;
                }
                if revised_max_overs.is_some() {
                    chase.revised_max_overs = revised_max_overs;
                }
                record.projection.set_chase(chase);
                self.store.put_innings(record.clone())?;
                let match_ended = self.complete_if_decided(&m, &record)?;

                info!(
                    match_id = %match_id,
                    innings_id = %innings_id,
                    revised_target_runs = ?revised_target_runs,
                    revised_max_overs = ?revised_max_overs,
                    match_ended,
                    scope = %scope,
                    "DLS applied"
                );
                Ok(())
            })
        })?;
        self.innings_read_model(innings_id)
    }

    /// Award penalty runs for an offence during `innings_id`.
    pub fn apply_penalty(
        &self,
        scope: &ScopeContext,
        innings_id: InningsId,
        runs: u32,
        awarded_to: AwardedTo,
        reason: &str,
    ) -> ScoringResult<PenaltyReceipt> {
        if runs == 0 {
            return Err(ScoringError::InvalidRequest(
                "penalty runs must be greater than zero".into(),
            ));
        }
        let match_id = self.store.get_innings(innings_id)?.match_id;

        self.match_locks.with_lock(match_id, || {
            let m = self.store.get_match(match_id)?;
            if !m.state.is_live() {
                return Err(ScoringError::InvalidState(format!("match is {}", m.state)));
            }
            let penalized = self.store.get_innings(innings_id)?;
            let (receiving, placeholder_created) = match awarded_to {
                AwardedTo::Batting => (penalized.clone(), false),
                AwardedTo::Bowling => self.bowling_side_innings(scope, &m, &penalized)?,
            };

            self.innings_locks.with_lock(receiving.innings_id, || {
                let mut record = self.store.get_innings(receiving.innings_id)?;
                let penalty = self.ledger.append_penalty(PenaltyRecord::new(
                    PenaltyAward {
                        match_id,
                        penalized_innings: innings_id,
                        receiving_innings: record.innings_id,
                        receiving_team: record.batting_team,
                        runs,
                        reason: reason.to_string(),
                    },
                    scope.owner,
                ))?;
                record.projection.apply_penalty(&penalty)?;
                self.store.put_innings(record.clone())?;
                let match_ended = self.complete_if_decided(&m, &record)?;

                info!(
                    match_id = %match_id,
                    penalized_innings = %innings_id,
                    receiving_innings = %record.innings_id,
                    runs,
                    reason,
                    match_ended,
                    scope = %scope,
                    "penalty awarded"
                );
                Ok(PenaltyReceipt {
                    penalty_id: penalty.penalty_id,
                    receiving_innings: record.innings_id,
                    receiving_team: record.batting_team,
                    runs,
                    placeholder_created,
                    match_ended,
                })
            })
        })
    }

    /// Complete the match when an adjustment to an active innings decides
    /// it. Caller holds the match lock.
    fn complete_if_decided(&self, m: &MatchRecord, record: &InningsRecord) -> ScoringResult<bool> {
        if record.state != InningsState::Active || m.state != MatchState::InProgress {
            return Ok(false);
        }
        let innings = self.store.innings_for(m.match_id)?;
        if !detect_for(m, &innings, record).match_complete() {
            return Ok(false);
        }
        self.set_match_state(m.match_id, MatchState::Completed)?;
        Ok(true)
    }

    /// Innings that receives penalty runs awarded to the fielding side:
    /// their unfinished innings, else a new OPEN placeholder while regular
    /// innings remain, else their latest innings. Caller holds the match
    /// lock.
    fn bowling_side_innings(
        &self,
        scope: &ScopeContext,
        m: &MatchRecord,
        penalized: &InningsRecord,
    ) -> ScoringResult<(InningsRecord, bool)> {
        let team = penalized.bowling_team;
        let innings = self.store.innings_for(m.match_id)?;
        let theirs: Vec<&InningsRecord> = innings
            .iter()
            .filter(|i| i.batting_team == team && i.is_super_over == penalized.is_super_over)
            .collect();

        if let Some(next) = theirs.iter().find(|i| !i.state.is_finished()) {
            return Ok(((*next).clone(), false));
        }

        let regular = innings
            .iter()
            .filter(|i| !i.is_super_over && (i.was_played() || i.is_placeholder()))
            .count() as u32;
        if !penalized.is_super_over && regular < m.rules.max_innings {
            let number = innings.iter().map(|i| i.innings_number).max().unwrap_or(0) + 1;
            let record = InningsRecord::new(
                m,
                NewInnings {
                    innings_number: number,
                    batting_team: team,
                    bowling_team: penalized.batting_team,
                    state: InningsState::Open,
                    is_super_over: false,
                    super_over_index: 0,
                    is_follow_on: false,
                    chase: ChaseContext::default(),
                },
            );
            self.store.insert_innings(record.clone())?;
            info!(
                match_id = %m.match_id,
                innings_id = %record.innings_id,
                innings_number = number,
                batting_team = %team,
                scope = %scope,
                "placeholder innings created for penalty runs"
            );
            return Ok((record, true));
        }

        theirs
            .iter()
            .max_by_key(|i| i.innings_number)
            .map(|i| ((*i).clone(), false))
            .ok_or_else(|| {
                ScoringError::InvalidState(format!("team {team} has no innings to receive runs"))
            })
    }

    // ---- Reads ----

    pub fn match_record(&self, match_id: MatchId) -> ScoringResult<MatchRecord> {
        self.store.get_match(match_id)
    }

    pub fn innings(&self, match_id: MatchId) -> ScoringResult<Vec<InningsRecord>> {
        self.store.get_match(match_id)?;
        self.store.innings_for(match_id)
    }

    pub fn active_innings(&self, match_id: MatchId) -> ScoringResult<InningsRecord> {
        self.store
            .active_innings(match_id)?
            .ok_or(ScoringError::NoActiveInnings(match_id))
    }

    pub fn innings_read_model(&self, innings_id: InningsId) -> ScoringResult<InningsReadModel> {
        let record = self.store.get_innings(innings_id)?;
        let m = self.store.get_match(record.match_id)?;
        let innings = self.store.innings_for(m.match_id)?;
        let digest = self.ledger.digest(innings_id)?;
        Ok(InningsReadModel::build(&m, &innings, &record, digest))
    }

    pub fn read_model(&self, match_id: MatchId) -> ScoringResult<MatchReadModel> {
        let m = self.store.get_match(match_id)?;
        let innings = self.store.innings_for(match_id)?;
        let current = innings
            .iter()
            .find(|i| i.state == InningsState::Active)
            .or_else(|| {
                innings
                    .iter()
                    .filter(|i| i.was_played())
                    .max_by_key(|i| i.innings_number)
            })
            .map(|record| -> ScoringResult<InningsReadModel> {
                let digest = self.ledger.digest(record.innings_id)?;
                Ok(InningsReadModel::build(&m, &innings, record, digest))
            })
            .transpose()?;

        Ok(MatchReadModel {
            match_id,
            team1: m.team1,
            team2: m.team2,
            rules: m.rules.clone(),
            state: m.state,
            innings: innings.iter().map(InningsRecord::summary).collect(),
            current,
        })
    }

    /// Sequence and hash-chain check of an innings ledger.
    pub fn validate_ledger(&self, innings_id: InningsId) -> ScoringResult<ValidationReport> {
        Ok(StreamValidator::validate_innings(&self.ledger, innings_id)?)
    }

    /// Does the stored projection equal a fresh rebuild?
    pub fn verify_innings(&self, innings_id: InningsId) -> ScoringResult<bool> {
        let record = self.store.get_innings(innings_id)?;
        Ok(ReplayEngine::verify_projection(&self.ledger, &record.projection)?)
    }
}

fn check_slot(
    slot: &'static str,
    current: Option<PlayerId>,
    selected: Option<PlayerId>,
) -> ScoringResult<()> {
    match (current, selected) {
        (Some(expected), Some(found)) if expected != found => {
            Err(ScoringError::ParticipantMismatch {
                slot,
                expected,
                found,
            })
        }
        _ => Ok(()),
    }
}

/// Occupied crease slots must match the delivery's participants.
fn check_crease(current: &Participants, input: &DeliveryInput) -> ScoringResult<()> {
    check_slot("striker", current.striker, Some(input.striker))?;
    check_slot("non-striker", current.non_striker, Some(input.non_striker))?;
    check_slot("bowler", current.bowler, Some(input.bowler))
}
