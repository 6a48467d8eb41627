//! Innings and match outcome detection.
//!
//! Pure decision functions over an innings' score and the format rules.
//! [`detect`] is the single place where all of them are evaluated together
//! after a delivery, so the innings-end, target and match-end answers a
//! caller sees always come from the same snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

use scorebook_types::{InningsLimits, Rules};

use crate::context::TeamTotals;

/// State of a chase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    InProgress,
    Won,
    Tied,
}

impl TargetState {
    pub fn is_decided(self) -> bool {
        matches!(self, Self::Won | Self::Tied)
    }
}

impl fmt::Display for TargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Won => "WON",
            Self::Tied => "TIED",
        };
        f.write_str(s)
    }
}

/// The slice of an innings aggregate that detection reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreState {
    pub runs: u32,
    pub wickets: u32,
    pub completed_overs: u32,
    pub is_chasing: bool,
    pub target_runs: Option<u32>,
    pub revised_target_runs: Option<u32>,
    pub revised_max_overs: Option<u32>,
}

impl ScoreState {
    /// DLS-revised target if set, else the original target.
    pub fn effective_target(&self) -> Option<u32> {
        self.revised_target_runs.or(self.target_runs)
    }

    /// DLS-revised overs if set, else the innings limit.
    pub fn effective_max_overs(&self, limits: &InningsLimits) -> Option<u32> {
        self.revised_max_overs.or(limits.max_overs)
    }

    /// `None` unless this is a chase with an original target.
    pub fn target_state(&self) -> Option<TargetState> {
        if !self.is_chasing || self.target_runs.is_none() {
            return None;
        }
        let target = self.effective_target()?;
        Some(if self.runs > target {
            TargetState::Won
        } else if self.runs == target {
            TargetState::Tied
        } else {
            TargetState::InProgress
        })
    }

    pub fn innings_end(&self, limits: &InningsLimits) -> bool {
        if self.wickets >= limits.all_out_wickets {
            return true;
        }
        if let Some(max_overs) = self.effective_max_overs(limits) {
            if self.completed_overs >= max_overs {
                return true;
            }
        }
        match self.effective_target() {
            Some(target) if self.is_chasing => self.runs > target,
            _ => false,
        }
    }
}

/// Follow-on is offered after the second innings of the longest format.
pub fn follow_on_required(rules: &Rules, innings_number: u32) -> bool {
    rules.is_longest_format() && innings_number == 2 && rules.follow_on_allowed
}

/// Inputs to [`match_end`].
#[derive(Clone, Copy, Debug)]
pub struct MatchEndInput<'a> {
    pub score: &'a ScoreState,
    pub rules: &'a Rules,
    pub innings_number: u32,
    pub is_super_over: bool,
    /// Regular-innings totals with the current innings counted as completed.
    pub totals: &'a TeamTotals,
}

/// Would the match be over once the current innings ends?
pub fn match_end(input: &MatchEndInput<'_>) -> bool {
    let score = input.score;

    if score.is_chasing
        && score.effective_target().is_some()
        && score.target_state().is_some_and(TargetState::is_decided)
    {
        return true;
    }

    if input.is_super_over {
        // Only the chasing half of a pair decides the match.
        return score.is_chasing;
    }

    if input.innings_number >= input.rules.max_innings {
        return true;
    }

    if input.rules.is_longest_format() && input.innings_number == 3 {
        return input.totals.innings_victory();
    }

    false
}

/// A tied chase in a format with super overs waits for the scorer to
/// confirm the super over instead of ending the match.
pub fn confirm_super_over(innings_end: bool, target_state: Option<TargetState>, rules: &Rules) -> bool {
    innings_end && target_state == Some(TargetState::Tied) && rules.super_over_allowed
}

/// Every detection answer for one snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub innings_end: bool,
    pub target_state: Option<TargetState>,
    pub target_achieved: bool,
    /// Raw match-end condition, before the super-over gate.
    pub match_end: bool,
    pub follow_on_required: bool,
    pub confirm_super_over: bool,
}

impl Detection {
    /// The match is over: the innings has ended, the match-end condition
    /// holds and no super over is pending confirmation.
    pub fn match_complete(&self) -> bool {
        self.innings_end && self.match_end && !self.confirm_super_over
    }

    /// Ask the scorer about the follow-on once the innings is over.
    pub fn ask_follow_on(&self) -> bool {
        self.innings_end && self.follow_on_required && !self.match_complete()
    }
}

/// Evaluate every detection rule once.
pub fn detect(input: &MatchEndInput<'_>, limits: &InningsLimits) -> Detection {
    let innings_end = input.score.innings_end(limits);
    let target_state = input.score.target_state();
    Detection {
        innings_end,
        target_state,
        target_achieved: target_state == Some(TargetState::Won),
        match_end: match_end(input),
        follow_on_required: !input.is_super_over
            && follow_on_required(input.rules, input.innings_number),
        confirm_super_over: confirm_super_over(innings_end, target_state, input.rules),
    }
}
