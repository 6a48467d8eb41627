use scorebook_types::{DismissalKind, PlayerId};
use thiserror::Error;

/// Malformed or self-contradictory delivery facts.
///
/// These are rejected before anything is written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("striker and non-striker are the same player ({0})")]
    SameBatters(PlayerId),

    #[error("bowler {0} is also batting")]
    BowlerIsBatting(PlayerId),

    #[error("a delivery cannot be both a bye and a leg-bye")]
    ByeAndLegBye,

    #[error("a wide cannot also be a bye or leg-bye")]
    WideWithByes,

    #[error("a delivery cannot be both a wide and a no-ball")]
    WideAndNoBall,

    #[error("{0} dismissal has no dismissed player")]
    MissingDismissedPlayer(DismissalKind),

    #[error("{kind} cannot dismiss the non-striker")]
    NonStrikerDismissal { kind: DismissalKind },

    #[error("dismissed player {0} is not at the crease")]
    DismissedNotAtCrease(PlayerId),

    #[error("batter {0} has already been dismissed this innings")]
    BatterAlreadyOut(PlayerId),
}
