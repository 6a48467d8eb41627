use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;

/// How a batter was dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DismissalKind {
    Bowled,
    Lbw,
    Caught,
    RunOut,
    Stumped,
    HitWicket,
    RetiredHurt,
    ObstructingField,
    HandledBall,
    TimedOut,
}

impl DismissalKind {
    /// Kinds credited to the bowler in their figures.
    pub fn credits_bowler(self) -> bool {
        matches!(
            self,
            Self::Bowled | Self::Lbw | Self::Caught | Self::Stumped | Self::HitWicket
        )
    }

    /// Retired hurt leaves the crease without losing a wicket.
    pub fn counts_as_wicket(self) -> bool {
        self != Self::RetiredHurt
    }

    /// Only a run out can dismiss the non-striker.
    pub fn may_dismiss_non_striker(self) -> bool {
        self == Self::RunOut
    }
}

impl fmt::Display for DismissalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bowled => "BOWLED",
            Self::Lbw => "LBW",
            Self::Caught => "CAUGHT",
            Self::RunOut => "RUN_OUT",
            Self::Stumped => "STUMPED",
            Self::HitWicket => "HIT_WICKET",
            Self::RetiredHurt => "RETIRED_HURT",
            Self::ObstructingField => "OBSTRUCTING_FIELD",
            Self::HandledBall => "HANDLED_BALL",
            Self::TimedOut => "TIMED_OUT",
        };
        f.write_str(s)
    }
}

/// Dismissal facts as submitted by the scorer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissalInput {
    pub kind: DismissalKind,
    /// Required: a wicket without a dismissed player is rejected.
    pub dismissed: Option<PlayerId>,
    /// Bowler to credit; defaults to the delivery's bowler for credited kinds.
    #[serde(default)]
    pub bowler: Option<PlayerId>,
    /// Catcher, run-out thrower or wicket-keeper.
    #[serde(default)]
    pub fielder: Option<PlayerId>,
}

impl DismissalInput {
    pub fn new(kind: DismissalKind, dismissed: PlayerId) -> Self {
        Self {
            kind,
            dismissed: Some(dismissed),
            bowler: None,
            fielder: None,
        }
    }

    pub fn with_fielder(mut self, fielder: PlayerId) -> Self {
        self.fielder = Some(fielder);
        self
    }
}

/// A dismissal as recorded against a ball.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dismissal {
    pub kind: DismissalKind,
    pub dismissed: PlayerId,
    /// Bowler credited with the wicket, if the kind credits one.
    pub bowler_credited: Option<PlayerId>,
    pub fielder: Option<PlayerId>,
}

/// Scoring-neutral side data attached to a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Analytics,
    Spatial,
    Trajectory,
    Release,
    Video,
    Review,
}

/// Attachment payloads keyed by kind. Never read by the scoring path.
pub type Attachments = BTreeMap<AttachmentKind, serde_json::Value>;

/// One delivery as submitted for scoring.
///
/// Runs are supplied as completed (running or boundary) runs plus flags;
/// the engine classifies them into a [`RunsBreakdown`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeliveryInput {
    pub striker: PlayerId,
    pub non_striker: PlayerId,
    pub bowler: PlayerId,
    #[serde(default)]
    pub completed_runs: u32,
    #[serde(default)]
    pub is_wide: bool,
    #[serde(default)]
    pub is_no_ball: bool,
    #[serde(default)]
    pub is_bye: bool,
    #[serde(default)]
    pub is_leg_bye: bool,
    #[serde(default)]
    pub dismissal: Option<DismissalInput>,
    /// The ball number the client believes comes next.
    #[serde(default)]
    pub expected_ball_number: Option<u32>,
    #[serde(default)]
    pub attachments: Attachments,
}

impl DeliveryInput {
    /// A dot ball.
    pub fn new(striker: PlayerId, non_striker: PlayerId, bowler: PlayerId) -> Self {
        Self {
            striker,
            non_striker,
            bowler,
            completed_runs: 0,
            is_wide: false,
            is_no_ball: false,
            is_bye: false,
            is_leg_bye: false,
            dismissal: None,
            expected_ball_number: None,
            attachments: Attachments::new(),
        }
    }

    pub fn runs(mut self, completed_runs: u32) -> Self {
        self.completed_runs = completed_runs;
        self
    }

    pub fn wide(mut self) -> Self {
        self.is_wide = true;
        self
    }

    pub fn no_ball(mut self) -> Self {
        self.is_no_ball = true;
        self
    }

    pub fn bye(mut self) -> Self {
        self.is_bye = true;
        self
    }

    pub fn leg_bye(mut self) -> Self {
        self.is_leg_bye = true;
        self
    }

    pub fn dismissal(mut self, dismissal: DismissalInput) -> Self {
        self.dismissal = Some(dismissal);
        self
    }

    pub fn expecting(mut self, ball_number: u32) -> Self {
        self.expected_ball_number = Some(ball_number);
        self
    }

    pub fn attach(mut self, kind: AttachmentKind, payload: serde_json::Value) -> Self {
        self.attachments.insert(kind, payload);
        self
    }

    /// Wides and no-balls do not count toward the over.
    pub fn is_legal(&self) -> bool {
        !self.is_wide && !self.is_no_ball
    }
}

/// Classified runs of one delivery.
///
/// `wide_runs` and `no_ball_runs` include their one-run penalty;
/// `penalty_runs` records how many such penalty runs are contained in
/// them and is never added to the total a second time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunsBreakdown {
    pub off_bat: u32,
    pub byes: u32,
    pub leg_byes: u32,
    pub wide_runs: u32,
    pub no_ball_runs: u32,
    pub penalty_runs: u32,
}

impl RunsBreakdown {
    pub fn extras(&self) -> u32 {
        self.byes + self.leg_byes + self.wide_runs + self.no_ball_runs
    }

    pub fn total(&self) -> u32 {
        self.off_bat + self.extras()
    }

    /// Runs charged to the bowler (byes and leg-byes are not).
    pub fn conceded_by_bowler(&self) -> u32 {
        self.off_bat + self.wide_runs + self.no_ball_runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bowler_credit_kinds() {
        assert!(DismissalKind::Caught.credits_bowler());
        assert!(DismissalKind::HitWicket.credits_bowler());
        assert!(!DismissalKind::RunOut.credits_bowler());
        assert!(!DismissalKind::RetiredHurt.credits_bowler());
    }

    #[test]
    fn retired_hurt_is_not_a_wicket() {
        assert!(!DismissalKind::RetiredHurt.counts_as_wicket());
        assert!(DismissalKind::TimedOut.counts_as_wicket());
    }

    #[test]
    fn only_run_out_dismisses_non_striker() {
        assert!(DismissalKind::RunOut.may_dismiss_non_striker());
        assert!(!DismissalKind::Stumped.may_dismiss_non_striker());
    }

    #[test]
    fn legality() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        assert!(DeliveryInput::new(a, b, c).is_legal());
        assert!(!DeliveryInput::new(a, b, c).wide().is_legal());
        assert!(!DeliveryInput::new(a, b, c).no_ball().is_legal());
    }

    #[test]
    fn runs_breakdown_totals() {
        let runs = RunsBreakdown {
            off_bat: 4,
            no_ball_runs: 1,
            penalty_runs: 1,
            ..Default::default()
        };
        assert_eq!(runs.total(), 5);
        assert_eq!(runs.extras(), 1);
        assert_eq!(runs.conceded_by_bowler(), 5);

        let byes = RunsBreakdown {
            byes: 2,
            ..Default::default()
        };
        assert_eq!(byes.conceded_by_bowler(), 0);
        assert_eq!(byes.total(), 2);
    }

    #[test]
    fn delivery_input_deserializes_with_defaults() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let json = serde_json::json!({
            "striker": a,
            "non_striker": b,
            "bowler": c,
            "completed_runs": 2,
        });
        let input: DeliveryInput = serde_json::from_value(json).unwrap();
        assert_eq!(input, DeliveryInput::new(a, b, c).runs(2));
    }

    #[test]
    fn attachments_serialize_by_kind() {
        let (a, b, c) = (PlayerId::new(), PlayerId::new(), PlayerId::new());
        let input = DeliveryInput::new(a, b, c)
            .attach(AttachmentKind::Video, serde_json::json!({"clip": "v1.mp4"}));
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["attachments"]["video"]["clip"], "v1.mp4");
    }
}
