use serde::{Deserialize, Serialize};

use scorebook_types::{PlayerId, RunsBreakdown};

/// Who is at the crease and who is bowling. `None` means the slot must be
/// filled by the scorer before the next delivery.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participants {
    pub striker: Option<PlayerId>,
    pub non_striker: Option<PlayerId>,
    pub bowler: Option<PlayerId>,
}

impl Participants {
    pub fn new(striker: PlayerId, non_striker: PlayerId, bowler: PlayerId) -> Self {
        Self {
            striker: Some(striker),
            non_striker: Some(non_striker),
            bowler: Some(bowler),
        }
    }

    pub fn swap_strike(&mut self) {
        std::mem::swap(&mut self.striker, &mut self.non_striker);
    }

    /// Is `player` one of the two batters?
    pub fn is_batting(&self, player: PlayerId) -> bool {
        self.striker == Some(player) || self.non_striker == Some(player)
    }

    pub fn needs_batter(&self) -> bool {
        self.striker.is_none() || self.non_striker.is_none()
    }

    pub fn needs_bowler(&self) -> bool {
        self.bowler.is_none()
    }

    pub fn is_complete(&self) -> bool {
        !self.needs_batter() && !self.needs_bowler()
    }
}

/// Facts about one delivery that drive the outcome computation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutcomeRequest {
    pub runs: RunsBreakdown,
    pub is_legal: bool,
    /// 1-based position in the over, as sequenced for this delivery.
    pub ball_in_over: u32,
    pub balls_per_over: u32,
    /// Player leaving the crease, if any.
    pub dismissed: Option<PlayerId>,
}

/// Participants after a delivery plus the flags the scorer must act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub next: Participants,
    pub physical_runs: u32,
    pub strike_rotated: bool,
    pub over_end: bool,
    pub new_batter_required: bool,
    pub new_bowler_required: bool,
}

/// Computes strike rotation, over completion and wicket clearing.
pub struct OutcomeEngine;

impl OutcomeEngine {
    /// Runs that make the batters change ends.
    ///
    /// The first run of a wide or no-ball is a penalty, not a crossing run.
    pub fn physical_runs(runs: &RunsBreakdown) -> u32 {
        runs.off_bat
            + runs.byes
            + runs.leg_byes
            + runs.wide_runs.saturating_sub(1)
            + runs.no_ball_runs.saturating_sub(1)
    }

    /// Over end: a legal delivery that is the last of its over.
    pub fn is_over_end(request: &OutcomeRequest) -> bool {
        request.is_legal && request.ball_in_over == request.balls_per_over
    }

    /// Next participant state after one delivery.
    pub fn next(request: &OutcomeRequest, current: &Participants) -> Outcome {
        let mut next = *current;

        let physical_runs = Self::physical_runs(&request.runs);
        let strike_rotated = physical_runs % 2 == 1;
        if strike_rotated {
            next.swap_strike();
        }

        let over_end = Self::is_over_end(request);
        if over_end {
            next.swap_strike();
            next.bowler = None;
        }

        // Clearing happens on the already-rotated slots.
        if let Some(dismissed) = request.dismissed {
            if next.striker == Some(dismissed) {
                next.striker = None;
            } else if next.non_striker == Some(dismissed) {
                next.non_striker = None;
            }
        }

        Outcome {
            next,
            physical_runs,
            strike_rotated,
            over_end,
            new_batter_required: next.needs_batter(),
            new_bowler_required: next.needs_bowler(),
        }
    }
}
