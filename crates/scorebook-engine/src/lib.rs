//! Pure scoring rules for Scorebook.
//!
//! Nothing in this crate performs I/O or holds locks. Every function takes
//! the facts it needs as arguments, so the same code drives live scoring
//! and full-history replay and produces identical results in both paths.
//!
//! # Pipeline
//!
//! ```text
//! DeliveryInput
//!   -> validate      structural checks, crease checks
//!   -> classify      RunsBreakdown, boundary flag, resolved Dismissal
//!   -> sequence      ball_number / over_number / ball_in_over
//!   -> OutcomeEngine next striker, non-striker and bowler
//!   -> detection     innings end, target state, match end
//!   -> actions       what the scorer must do next
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use scorebook_engine::{OutcomeEngine, OutcomeRequest, Participants};
//! use scorebook_types::{PlayerId, RunsBreakdown};
//!
//! let (a, b, bowler) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
//! let before = Participants::new(a, b, bowler);
//! let request = OutcomeRequest {
//!     runs: RunsBreakdown { off_bat: 1, ..Default::default() },
//!     is_legal: true,
//!     ball_in_over: 3,
//!     balls_per_over: 6,
//!     dismissed: None,
//! };
//! let outcome = OutcomeEngine::next(&request, &before);
//! assert_eq!(outcome.next.striker, Some(b));
//! assert!(!outcome.over_end);
//! ```

pub mod actions;
pub mod classify;
pub mod context;
pub mod detection;
pub mod error;
pub mod outcome;
pub mod sequence;
pub mod validate;

pub use actions::RequiredActions;
pub use classify::{classify_runs, is_boundary, resolve_dismissal};
pub use context::{
    fourth_innings_target, limited_overs_target, regular_chase_target, super_over_target,
    InningsSummary, TeamTotals,
};
pub use detection::{
    confirm_super_over, detect, follow_on_required, match_end, Detection, MatchEndInput,
    ScoreState, TargetState,
};
pub use error::ValidationError;
pub use outcome::{Outcome, OutcomeEngine, OutcomeRequest, Participants};
pub use sequence::{next_sequence, overs_notation, BallSequence};
pub use validate::{validate_crease, validate_delivery};
