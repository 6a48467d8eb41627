use serde::{Deserialize, Serialize};

/// Position of a delivery within its innings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallSequence {
    /// 1-based, contiguous across every delivery in the innings.
    pub ball_number: u32,
    /// 1-based over the delivery belongs to.
    pub over_number: u32,
    /// 1-based legal-ball position within the over.
    pub ball_in_over: u32,
}

/// Sequence numbers for the next delivery.
///
/// Derived from the ledger and the legal-ball count, never from the client.
/// Wides and no-balls share the position of the legal ball that follows.
pub fn next_sequence(last_ball_number: u32, legal_balls: u32, balls_per_over: u32) -> BallSequence {
    let balls_per_over = balls_per_over.max(1);
    BallSequence {
        ball_number: last_ball_number + 1,
        over_number: legal_balls / balls_per_over + 1,
        ball_in_over: legal_balls % balls_per_over + 1,
    }
}

/// Overs in cricket notation, e.g. `12.3` for twelve overs and three balls.
pub fn overs_notation(legal_balls: u32, balls_per_over: u32) -> String {
    let balls_per_over = balls_per_over.max(1);
    format!(
        "{}.{}",
        legal_balls / balls_per_over,
        legal_balls % balls_per_over
    )
}
