//! Foundation types for Scorebook.
//!
//! This crate provides the identity, format, lifecycle, and delivery-fact
//! types shared by every other Scorebook crate. It performs no scoring.
//!
//! # Key Types
//!
//! - [`MatchId`], [`InningsId`], [`PlayerId`], [`TeamId`]: UUID identifiers
//! - [`Rules`] / [`RulesRegistry`]: per-format playing conditions
//! - [`MatchState`] / [`InningsState`]: lifecycle state machines
//! - [`DeliveryInput`]: what a scorer submits for one ball
//! - [`RunsBreakdown`]: classified runs of a recorded ball
//! - [`DismissalKind`] / [`Dismissal`]: wicket facts attached to a ball
//! - [`Attachments`]: scoring-neutral side data (analytics, video, ...)

pub mod delivery;
pub mod error;
pub mod ids;
pub mod lifecycle;
pub mod rules;
pub mod scope;

pub use delivery::{
    AttachmentKind, Attachments, DeliveryInput, Dismissal, DismissalInput, DismissalKind,
    RunsBreakdown,
};
pub use error::TypeError;
pub use ids::{BallId, InningsId, MatchId, OwnerId, PenaltyId, PlayerId, TeamId};
pub use lifecycle::{InningsState, MatchState};
pub use rules::{InningsLimits, Rules, RulesRegistry};
pub use scope::{Role, ScopeContext};
