//! Next-innings preparation.
//!
//! Decides who bats next, the innings number, super-over pairing and the
//! chase target. Pure over the match's current innings records.

use serde::{Deserialize, Serialize};

use scorebook_engine::{regular_chase_target, super_over_target, TargetState, TeamTotals};
use scorebook_ledger::ChaseContext;
use scorebook_types::{InningsId, InningsState};

use crate::error::{ScoringError, ScoringResult};
use crate::store::{InningsRecord, MatchRecord, NewInnings};

/// Kind of innings requested by the scorer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextInnings {
    pub super_over: bool,
    pub enforce_follow_on: bool,
}

/// A planned innings. `reuse` names an OPEN placeholder innings to
/// activate instead of creating a new one; `displace` moves the other
/// side's placeholder out of the way first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InningsPlan {
    pub fields: NewInnings,
    pub reuse: Option<InningsId>,
    pub displace: Option<Renumber>,
}

/// New innings number for an unplayed placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Renumber {
    pub innings_id: InningsId,
    pub innings_number: u32,
}

pub fn plan_next_innings(
    m: &MatchRecord,
    innings: &[InningsRecord],
    request: NextInnings,
) -> ScoringResult<InningsPlan> {
    if let Some(active) = innings.iter().find(|i| i.state == InningsState::Active) {
        return Err(ScoringError::InvalidState(format!(
            "innings {} is still active",
            active.innings_number
        )));
    }
    let last = innings
        .iter()
        .filter(|i| i.was_played())
        .max_by_key(|i| i.innings_number)
        .ok_or_else(|| ScoringError::InvalidState("no innings has been played yet".into()))?;
    let innings_number = last.innings_number + 1;

    let fields = if request.super_over {
        plan_super_over(m, innings, last, innings_number)?
    } else {
        plan_regular(m, innings, last, innings_number, request.enforce_follow_on)?
    };

    let (reuse, displace) = match innings.iter().find(|i| i.innings_number == innings_number) {
        None => (None, None),
        Some(existing)
            if existing.is_placeholder()
                && !fields.is_super_over
                && existing.batting_team == fields.batting_team =>
        {
            (Some(existing.innings_id), None)
        }
        // A placeholder for the other side (the follow-on reverses the
        // batting order) or one abandoned unplayed moves behind the new
        // innings.
        Some(existing) if existing.is_placeholder() || !existing.was_played() => {
            let highest = innings.iter().map(|i| i.innings_number).max().unwrap_or(0);
            let moved_to = highest + 1;
            if existing.is_placeholder() && moved_to > m.rules.max_innings {
                return Err(ScoringError::InvalidState(format!(
                    "innings {innings_number} is held for another batting side"
                )));
            }
            let renumber = Renumber {
                innings_id: existing.innings_id,
                innings_number: moved_to,
            };
            (None, Some(renumber))
        }
        Some(_) => {
            return Err(ScoringError::InvalidState(format!(
                "innings {innings_number} already exists for another batting side"
            )));
        }
    };

    Ok(InningsPlan {
        fields,
        reuse,
        displace,
    })
}

fn plan_regular(
    m: &MatchRecord,
    innings: &[InningsRecord],
    last: &InningsRecord,
    innings_number: u32,
    enforce_follow_on: bool,
) -> ScoringResult<NewInnings> {
    if last.is_super_over {
        return Err(ScoringError::InvalidState(
            "a regular innings cannot follow a super over".into(),
        ));
    }
    let played = innings
        .iter()
        .filter(|i| !i.is_super_over && i.was_played())
        .count() as u32;
    if played >= m.rules.max_innings {
        return Err(ScoringError::InvalidState(format!(
            "all {} innings of the match have been played",
            m.rules.max_innings
        )));
    }

    let (batting_team, bowling_team) = if enforce_follow_on {
        if !m.rules.follow_on_allowed || last.innings_number != 2 {
            return Err(ScoringError::InvalidState(
                "follow-on can only be enforced after the second innings".into(),
            ));
        }
        (last.batting_team, last.bowling_team)
    } else {
        (last.bowling_team, last.batting_team)
    };

    let summaries: Vec<_> = innings.iter().map(InningsRecord::summary).collect();
    let totals = TeamTotals::from_innings(m.team1, m.team2, &summaries);
    let chase = regular_chase_target(&m.rules, innings_number, &totals, batting_team)
        .map(ChaseContext::chasing)
        .unwrap_or_default();

    Ok(NewInnings {
        innings_number,
        batting_team,
        bowling_team,
        state: InningsState::Active,
        is_super_over: false,
        super_over_index: 0,
        is_follow_on: enforce_follow_on,
        chase,
    })
}

fn plan_super_over(
    m: &MatchRecord,
    innings: &[InningsRecord],
    last: &InningsRecord,
    innings_number: u32,
) -> ScoringResult<NewInnings> {
    if !m.rules.super_over_allowed {
        return Err(ScoringError::InvalidState(format!(
            "{} does not allow super overs",
            m.rules.code
        )));
    }

    let supers: Vec<&InningsRecord> = innings
        .iter()
        .filter(|i| i.is_super_over && i.was_played())
        .collect();

    // Second half of a pair: the other side chases.
    if supers.len() % 2 == 1 {
        return Ok(NewInnings {
            innings_number,
            batting_team: last.bowling_team,
            bowling_team: last.batting_team,
            state: InningsState::Active,
            is_super_over: true,
            super_over_index: last.super_over_index,
            is_follow_on: false,
            chase: ChaseContext::chasing(super_over_target(last.projection.aggregate.runs)),
        });
    }

    // A new pair needs the previous chase to have finished level.
    let tied = last.projection.aggregate.score_state().target_state() == Some(TargetState::Tied);
    if !tied {
        return Err(ScoringError::InvalidState(
            "a super over needs a tied chase".into(),
        ));
    }

    let (batting_team, super_over_index) = match supers.last() {
        Some(prior) => (prior.bowling_team, prior.super_over_index + 1),
        None => {
            let batted_second = innings
                .iter()
                .filter(|i| !i.is_super_over && i.was_played())
                .nth(1)
                .map_or(last.batting_team, |i| i.batting_team);
            (batted_second, 1)
        }
    };

    Ok(NewInnings {
        innings_number,
        batting_team,
        bowling_team: m.opponent(batting_team),
        state: InningsState::Active,
        is_super_over: true,
        super_over_index,
        is_follow_on: false,
        chase: ChaseContext::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scorebook_types::{MatchId, MatchState, OwnerId, Rules, TeamId};

    fn fixture(rules: Rules) -> MatchRecord {
        MatchRecord {
            match_id: MatchId::new(),
            team1: TeamId::named("Lions"),
            team2: TeamId::named("Tigers"),
            rules,
            state: MatchState::InProgress,
            created_by: OwnerId::new(),
            created_at: Utc::now(),
        }
    }

    /// A finished innings with `runs` on the board.
    fn played(m: &MatchRecord, plan: NewInnings, runs: u32) -> InningsRecord {
        let mut record = InningsRecord::new(m, plan);
        record.state = InningsState::Completed;
        record.projection.aggregate.runs = runs;
        record.projection.refresh_target();
        record
    }

    fn first(m: &MatchRecord, runs: u32) -> InningsRecord {
        played(
            m,
            NewInnings {
                innings_number: 1,
                batting_team: m.team1,
                bowling_team: m.team2,
                state: InningsState::Completed,
                is_super_over: false,
                super_over_index: 0,
                is_follow_on: false,
                chase: ChaseContext::default(),
            },
            runs,
        )
    }

    fn next(m: &MatchRecord, innings: &[InningsRecord], request: NextInnings) -> NewInnings {
        plan_next_innings(m, innings, request).unwrap().fields
    }

    #[test]
    fn second_innings_swaps_and_chases() {
        let m = fixture(Rules::t20());
        let innings = vec![first(&m, 160)];
        let plan = next(&m, &innings, NextInnings::default());
        assert_eq!(plan.innings_number, 2);
        assert_eq!(plan.batting_team, m.team2);
        assert_eq!(plan.bowling_team, m.team1);
        assert_eq!(plan.chase, ChaseContext::chasing(161));
        assert_eq!(plan.state, InningsState::Active);
    }

    #[test]
    fn refuses_while_active_or_after_last_innings() {
        let m = fixture(Rules::t20());
        let mut innings = vec![first(&m, 100)];
        innings[0].state = InningsState::Active;
        assert!(plan_next_innings(&m, &innings, NextInnings::default()).is_err());

        innings[0].state = InningsState::Completed;
        let second = next(&m, &innings, NextInnings::default());
        innings.push(played(&m, second, 90));
        let err = plan_next_innings(&m, &innings, NextInnings::default()).unwrap_err();
        assert!(matches!(err, ScoringError::InvalidState(_)));
    }

    #[test]
    fn follow_on_keeps_sides() {
        let m = fixture(Rules::test());
        let mut innings = vec![first(&m, 450)];
        let second = next(&m, &innings, NextInnings::default());
        innings.push(played(&m, second, 150));

        let plan = next(
            &m,
            &innings,
            NextInnings {
                enforce_follow_on: true,
                ..Default::default()
            },
        );
        assert!(plan.is_follow_on);
        assert_eq!(plan.batting_team, m.team2);
        assert_eq!(plan.chase, ChaseContext::default());

        // Not after the first innings, and not in limited overs.
        let only_first = vec![first(&m, 450)];
        let request = NextInnings {
            enforce_follow_on: true,
            ..Default::default()
        };
        assert!(plan_next_innings(&m, &only_first, request).is_err());
        let t20 = fixture(Rules::t20());
        assert!(plan_next_innings(&t20, &[first(&t20, 100)], request).is_err());
    }

    #[test]
    fn fourth_innings_target_is_deficit() {
        let m = fixture(Rules::test());
        let mut innings = vec![first(&m, 300)];
        for runs in [250, 200] {
            let plan = next(&m, &innings, NextInnings::default());
            innings.push(played(&m, plan, runs));
        }
        let fourth = next(&m, &innings, NextInnings::default());
        assert_eq!(fourth.innings_number, 4);
        assert_eq!(fourth.batting_team, m.team2);
        // Lions 300 + 200, Tigers 250.
        assert_eq!(fourth.chase, ChaseContext::chasing(250));
    }

    #[test]
    fn super_over_pairs_alternate_sides() {
        let m = fixture(Rules::t20());
        let mut innings = vec![first(&m, 150)];
        let second = next(&m, &innings, NextInnings::default());
        // Level with the target of 151.
        innings.push(played(&m, second, 151));

        let request = NextInnings {
            super_over: true,
            ..Default::default()
        };
        let so1 = next(&m, &innings, request);
        assert!(so1.is_super_over);
        assert_eq!(so1.super_over_index, 1);
        assert_eq!(so1.batting_team, m.team2, "side that batted second goes first");
        assert!(!so1.chase.is_chasing);
        innings.push(played(&m, so1, 11));

        let so2 = next(&m, &innings, request);
        assert_eq!(so2.super_over_index, 1);
        assert_eq!(so2.batting_team, m.team1);
        assert_eq!(so2.chase, ChaseContext::chasing(12));
        innings.push(played(&m, so2, 12));

        let so3 = next(&m, &innings, request);
        assert_eq!(so3.innings_number, 5);
        assert_eq!(so3.super_over_index, 2);
        assert_eq!(so3.batting_team, m.team2);
    }

    #[test]
    fn super_over_needs_tie_and_format() {
        let m = fixture(Rules::t20());
        let mut innings = vec![first(&m, 150)];
        let second = next(&m, &innings, NextInnings::default());
        innings.push(played(&m, second, 120));
        let request = NextInnings {
            super_over: true,
            ..Default::default()
        };
        assert!(plan_next_innings(&m, &innings, request).is_err());

        let test = fixture(Rules::test());
        assert!(plan_next_innings(&test, &[first(&test, 10)], request).is_err());
    }

    #[test]
    fn placeholder_is_reused_when_sides_match() {
        let m = fixture(Rules::t20());
        let placeholder = InningsRecord::new(
            &m,
            NewInnings {
                innings_number: 2,
                batting_team: m.team2,
                bowling_team: m.team1,
                state: InningsState::Open,
                is_super_over: false,
                super_over_index: 0,
                is_follow_on: false,
                chase: ChaseContext::default(),
            },
        );
        let innings = vec![first(&m, 99), placeholder.clone()];
        let plan = plan_next_innings(&m, &innings, NextInnings::default()).unwrap();
        assert_eq!(plan.reuse, Some(placeholder.innings_id));
        assert_eq!(plan.fields.chase, ChaseContext::chasing(100));

        let mut wrong_side = placeholder;
        wrong_side.batting_team = m.team1;
        let innings = vec![first(&m, 99), wrong_side];
        assert!(plan_next_innings(&m, &innings, NextInnings::default()).is_err());
    }

    #[test]
    fn follow_on_displaces_other_sides_placeholder() {
        let m = fixture(Rules::test());
        let mut innings = vec![first(&m, 450)];
        let second = next(&m, &innings, NextInnings::default());
        innings.push(played(&m, second, 150));
        let placeholder = InningsRecord::new(
            &m,
            NewInnings {
                innings_number: 3,
                batting_team: m.team1,
                bowling_team: m.team2,
                state: InningsState::Open,
                is_super_over: false,
                super_over_index: 0,
                is_follow_on: false,
                chase: ChaseContext::default(),
            },
        );
        assert!(!placeholder.was_played());
        innings.push(placeholder.clone());

        let request = NextInnings {
            enforce_follow_on: true,
            ..Default::default()
        };
        let plan = plan_next_innings(&m, &innings, request).unwrap();
        assert_eq!(plan.fields.innings_number, 3);
        assert_eq!(plan.fields.batting_team, m.team2);
        assert_eq!(plan.reuse, None);
        assert_eq!(
            plan.displace,
            Some(Renumber {
                innings_id: placeholder.innings_id,
                innings_number: 4,
            })
        );

        // Abandoned before it was ever played: still not the last innings.
        innings[2].state = InningsState::Abandoned;
        let plan = plan_next_innings(&m, &innings, request).unwrap();
        assert_eq!(plan.fields.innings_number, 3);
        assert!(plan.displace.is_some());
    }
}
