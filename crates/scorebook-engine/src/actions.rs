use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::outcome::Participants;

/// What the scorer must do before the next delivery can be recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredActions {
    pub striker_select: bool,
    pub non_striker_select: bool,
    pub bowler_select: bool,
    pub new_batter_select: bool,
    pub new_bowler_select: bool,
    pub end_innings: bool,
    pub end_match: bool,
    pub ask_follow_on: bool,
    pub confirm_super_over: bool,
}

impl RequiredActions {
    /// Actions derived from the current slots and the latest detection.
    pub fn determine(participants: &Participants, detection: Option<&Detection>) -> Self {
        let striker_missing = participants.striker.is_none();
        let non_striker_missing = participants.non_striker.is_none();
        let bowler_missing = participants.bowler.is_none();

        let mut actions = Self {
            striker_select: striker_missing,
            non_striker_select: non_striker_missing,
            bowler_select: bowler_missing,
            new_batter_select: striker_missing || non_striker_missing,
            new_bowler_select: bowler_missing,
            ..Self::default()
        };
        if let Some(detection) = detection {
            actions.end_innings = detection.innings_end;
            actions.end_match = detection.match_complete();
            actions.ask_follow_on = detection.ask_follow_on();
            actions.confirm_super_over = detection.confirm_super_over;
        }
        actions
    }

    /// No selection or decision is outstanding.
    pub fn ready_for_delivery(&self) -> bool {
        !(self.new_batter_select
            || self.new_bowler_select
            || self.end_innings
            || self.end_match
            || self.confirm_super_over)
    }
}
