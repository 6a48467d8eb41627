use std::collections::HashMap;
use std::sync::RwLock;

use scorebook_types::{MatchId, PlayerId, TeamId};

/// Supplies the players eligible to take part in a match.
///
/// The engine only asks whether a player belongs to a team's playing XI;
/// selection policy beyond that lives with the provider.
pub trait RosterProvider: Send + Sync {
    /// The team's playing XI for the match, if one has been named.
    fn playing_xi(&self, match_id: MatchId, team: TeamId) -> Option<Vec<PlayerId>>;

    fn is_eligible(&self, match_id: MatchId, team: TeamId, player: PlayerId) -> bool {
        self.playing_xi(match_id, team)
            .is_some_and(|xi| xi.contains(&player))
    }
}

/// Roster held in memory, filled by the embedding application.
#[derive(Default)]
pub struct StaticRoster {
    sheets: RwLock<HashMap<(MatchId, TeamId), Vec<PlayerId>>>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name (or replace) a team's playing XI.
    pub fn set_playing_xi(&self, match_id: MatchId, team: TeamId, players: Vec<PlayerId>) {
        if let Ok(mut sheets) = self.sheets.write() {
            sheets.insert((match_id, team), players);
        }
    }
}

impl RosterProvider for StaticRoster {
    fn playing_xi(&self, match_id: MatchId, team: TeamId) -> Option<Vec<PlayerId>> {
        self.sheets.read().ok()?.get(&(match_id, team)).cloned()
    }
}
