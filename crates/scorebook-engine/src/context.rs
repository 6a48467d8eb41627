use serde::{Deserialize, Serialize};

use scorebook_types::{InningsId, InningsState, Rules, TeamId};

/// What match-level decisions need to know about one innings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsSummary {
    pub innings_id: InningsId,
    pub innings_number: u32,
    pub batting_team: TeamId,
    pub bowling_team: TeamId,
    pub is_super_over: bool,
    /// Pair index for super overs (1 for the first pair), 0 otherwise.
    pub super_over_index: u32,
    pub state: InningsState,
    pub runs: u32,
}

/// Per-team run totals and completed-innings counts over regular innings.
///
/// Super-over innings never contribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeamTotals {
    teams: [TeamId; 2],
    runs: [u32; 2],
    completed: [u32; 2],
}

impl TeamTotals {
    pub fn from_innings(team1: TeamId, team2: TeamId, innings: &[InningsSummary]) -> Self {
        Self::build(team1, team2, innings, None)
    }

    /// Totals as they would stand once innings `current` is completed.
    pub fn projected(
        team1: TeamId,
        team2: TeamId,
        innings: &[InningsSummary],
        current: InningsId,
    ) -> Self {
        Self::build(team1, team2, innings, Some(current))
    }

    fn build(
        team1: TeamId,
        team2: TeamId,
        innings: &[InningsSummary],
        current: Option<InningsId>,
    ) -> Self {
        let mut totals = Self {
            teams: [team1, team2],
            runs: [0; 2],
            completed: [0; 2],
        };
        for summary in innings.iter().filter(|s| !s.is_super_over) {
            let Some(slot) = totals.slot(summary.batting_team) else {
                continue;
            };
            totals.runs[slot] += summary.runs;
            if summary.state == InningsState::Completed || current == Some(summary.innings_id) {
                totals.completed[slot] += 1;
            }
        }
        totals
    }

    fn slot(&self, team: TeamId) -> Option<usize> {
        self.teams.iter().position(|t| *t == team)
    }

    pub fn runs(&self, team: TeamId) -> u32 {
        self.slot(team).map_or(0, |i| self.runs[i])
    }

    pub fn completed(&self, team: TeamId) -> u32 {
        self.slot(team).map_or(0, |i| self.completed[i])
    }

    /// The other team. Unknown teams map to the first team's opponent.
    pub fn opponent(&self, team: TeamId) -> TeamId {
        if team == self.teams[0] {
            self.teams[1]
        } else {
            self.teams[0]
        }
    }

    pub fn teams(&self) -> [TeamId; 2] {
        self.teams
    }

    /// Innings-victory check after three regular innings: the side that
    /// has batted twice still trails the side that has batted once.
    pub fn innings_victory(&self) -> bool {
        match self.completed {
            [2, 1] => self.runs[0] < self.runs[1],
            [1, 2] => self.runs[1] < self.runs[0],
            _ => false,
        }
    }
}

/// Target for the second innings of a limited-overs match.
pub fn limited_overs_target(totals: &TeamTotals, batting_team: TeamId) -> u32 {
    totals.runs(totals.opponent(batting_team)) + 1
}

/// Target for the fourth innings of the longest format: the deficit the
/// batting side must overturn.
pub fn fourth_innings_target(totals: &TeamTotals, batting_team: TeamId) -> u32 {
    let own = totals.runs(batting_team);
    let opponent = totals.runs(totals.opponent(batting_team));
    opponent.saturating_sub(own)
}

/// Target for the chasing half of a super-over pair.
pub fn super_over_target(first_half_runs: u32) -> u32 {
    first_half_runs + 1
}

/// Target for a new regular innings, if it is a chase.
pub fn regular_chase_target(
    rules: &Rules,
    innings_number: u32,
    totals: &TeamTotals,
    batting_team: TeamId,
) -> Option<u32> {
    match (rules.is_longest_format(), innings_number) {
        (false, 2) => Some(limited_overs_target(totals, batting_team)),
        (true, 4) => Some(fourth_innings_target(totals, batting_team)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(number: u32, batting: TeamId, bowling: TeamId, runs: u32) -> InningsSummary {
        InningsSummary {
            innings_id: InningsId::new(),
            innings_number: number,
            batting_team: batting,
            bowling_team: bowling,
            is_super_over: false,
            super_over_index: 0,
            state: InningsState::Completed,
            runs,
        }
    }

    #[test]
    fn totals_skip_super_overs() {
        let (a, b) = (TeamId::named("A"), TeamId::named("B"));
        let mut so = summary(3, a, b, 12);
        so.is_super_over = true;
        so.super_over_index = 1;
        let innings = vec![summary(1, a, b, 160), summary(2, b, a, 160), so];
        let totals = TeamTotals::from_innings(a, b, &innings);
        assert_eq!(totals.runs(a), 160);
        assert_eq!(totals.completed(a), 1);
    }

    #[test]
    fn limited_overs_target_is_one_more() {
        let (a, b) = (TeamId::named("A"), TeamId::named("B"));
        let totals = TeamTotals::from_innings(a, b, &[summary(1, a, b, 149)]);
        assert_eq!(limited_overs_target(&totals, b), 150);
        assert_eq!(
            regular_chase_target(&Rules::t20(), 2, &totals, b),
            Some(150)
        );
    }

    #[test]
    fn fourth_innings_target_is_deficit() {
        let (a, b) = (TeamId::named("A"), TeamId::named("B"));
        let innings = [
            summary(1, a, b, 300),
            summary(2, b, a, 250),
            summary(3, a, b, 200),
        ];
        let totals = TeamTotals::from_innings(a, b, &innings);
        assert_eq!(fourth_innings_target(&totals, b), 250);
        assert_eq!(regular_chase_target(&Rules::test(), 4, &totals, b), Some(250));
        assert_eq!(regular_chase_target(&Rules::test(), 3, &totals, a), None);
    }

    #[test]
    fn projected_counts_current_innings() {
        let (a, b) = (TeamId::named("A"), TeamId::named("B"));
        let mut current = summary(3, b, a, 100);
        current.state = InningsState::Active;
        let id = current.innings_id;
        let innings = [summary(1, a, b, 400), summary(2, b, a, 150), current];

        let live = TeamTotals::from_innings(a, b, &innings);
        assert_eq!(live.completed(b), 1);
        assert!(!live.innings_victory());

        let projected = TeamTotals::projected(a, b, &innings, id);
        assert_eq!(projected.completed(b), 2);
        assert!(projected.innings_victory());
    }

    #[test]
    fn no_innings_victory_when_ahead() {
        let (a, b) = (TeamId::named("A"), TeamId::named("B"));
        let innings = [
            summary(1, a, b, 200),
            summary(2, b, a, 150),
            summary(3, b, a, 100),
        ];
        assert!(!TeamTotals::from_innings(a, b, &innings).innings_victory());
    }

    #[test]
    fn super_over_target_is_one_more() {
        assert_eq!(super_over_target(11), 12);
    }
}
