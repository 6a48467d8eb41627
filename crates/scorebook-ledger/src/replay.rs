use tracing::debug;

use scorebook_types::InningsId;

use crate::error::LedgerError;
use crate::projection::{AppliedBall, ChaseContext, InningsProjection};
use crate::traits::LedgerReader;

/// Result of rebuilding an innings from its ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub projection: InningsProjection,
    pub applied_balls: u32,
    pub applied_penalties: u32,
    /// Effect of the final ball, if any.
    pub last_applied: Option<AppliedBall>,
}

/// Deterministic rebuild of innings projections.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Replay every ball of `innings` in ball-number order from empty
    /// state, then re-apply the penalties it received.
    pub fn rebuild<R: LedgerReader + ?Sized>(
        reader: &R,
        innings: InningsId,
        balls_per_over: u32,
        chase: ChaseContext,
    ) -> Result<ReplayResult, LedgerError> {
        let mut projection = InningsProjection::new(innings, balls_per_over, chase);
        let mut applied_balls = 0u32;
        let mut last_applied = None;

        for record in reader.balls(innings)? {
            last_applied = Some(projection.apply_ball(&record)?);
            applied_balls += 1;
        }

        let penalties = reader.penalties_for(innings)?;
        for penalty in &penalties {
            projection.apply_penalty(penalty)?;
        }

        debug!(
            innings_id = %innings,
            applied_balls,
            applied_penalties = penalties.len(),
            runs = projection.aggregate.runs,
            "innings rebuilt"
        );

        Ok(ReplayResult {
            projection,
            applied_balls,
            applied_penalties: penalties.len() as u32,
            last_applied,
        })
    }

    /// Rebuild an existing projection, keeping its chase context.
    pub fn rebuild_projection<R: LedgerReader + ?Sized>(
        reader: &R,
        current: &InningsProjection,
    ) -> Result<ReplayResult, LedgerError> {
        Self::rebuild(
            reader,
            current.innings_id(),
            current.balls_per_over,
            current.aggregate.chase,
        )
    }

    /// Does `projection` match a fresh rebuild from the ledger?
    ///
    /// Crease slots filled by selection after the last ball are not ledger
    /// facts and are ignored.
    pub fn verify_projection<R: LedgerReader + ?Sized>(
        reader: &R,
        projection: &InningsProjection,
    ) -> Result<bool, LedgerError> {
        let rebuilt = Self::rebuild_projection(reader, projection)?.projection;
        let mut live = projection.clone();
        live.aggregate.participants = rebuilt.aggregate.participants;
        Ok(live == rebuilt)
    }
}
