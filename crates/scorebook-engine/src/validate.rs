use scorebook_types::{DeliveryInput, PlayerId};

use crate::error::ValidationError;
use crate::outcome::Participants;

/// Structural checks on a delivery, independent of innings state.
pub fn validate_delivery(input: &DeliveryInput) -> Result<(), ValidationError> {
    if input.striker == input.non_striker {
        return Err(ValidationError::SameBatters(input.striker));
    }
    if input.bowler == input.striker || input.bowler == input.non_striker {
        return Err(ValidationError::BowlerIsBatting(input.bowler));
    }
    if input.is_bye && input.is_leg_bye {
        return Err(ValidationError::ByeAndLegBye);
    }
    if input.is_wide && (input.is_bye || input.is_leg_bye) {
        return Err(ValidationError::WideWithByes);
    }
    if input.is_wide && input.is_no_ball {
        return Err(ValidationError::WideAndNoBall);
    }

    if let Some(dismissal) = &input.dismissal {
        let dismissed = dismissal
            .dismissed
            .ok_or(ValidationError::MissingDismissedPlayer(dismissal.kind))?;
        if dismissed == input.non_striker {
            if !dismissal.kind.may_dismiss_non_striker() {
                return Err(ValidationError::NonStrikerDismissal {
                    kind: dismissal.kind,
                });
            }
        } else if dismissed != input.striker {
            return Err(ValidationError::DismissedNotAtCrease(dismissed));
        }
    }
    Ok(())
}

/// Checks that need the innings' crease state.
///
/// A batter who is not already at the crease is coming in, and must not
/// have been dismissed earlier in the innings.
pub fn validate_crease(
    input: &DeliveryInput,
    current: &Participants,
    is_out: impl Fn(PlayerId) -> bool,
) -> Result<(), ValidationError> {
    for batter in [input.striker, input.non_striker] {
        if !current.is_batting(batter) && is_out(batter) {
            return Err(ValidationError::BatterAlreadyOut(batter));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorebook_types::{DismissalInput, DismissalKind};

    fn dot() -> DeliveryInput {
        DeliveryInput::new(PlayerId::new(), PlayerId::new(), PlayerId::new())
    }

    #[test]
    fn accepts_plain_delivery() {
        assert!(validate_delivery(&dot().runs(4)).is_ok());
    }

    #[test]
    fn rejects_same_batters() {
        let mut input = dot();
        input.non_striker = input.striker;
        assert_eq!(
            validate_delivery(&input),
            Err(ValidationError::SameBatters(input.striker))
        );
    }

    #[test]
    fn rejects_bowler_batting() {
        let mut input = dot();
        input.bowler = input.non_striker;
        assert!(matches!(
            validate_delivery(&input),
            Err(ValidationError::BowlerIsBatting(_))
        ));
    }

    #[test]
    fn rejects_bye_and_leg_bye() {
        assert_eq!(
            validate_delivery(&dot().bye().leg_bye()),
            Err(ValidationError::ByeAndLegBye)
        );
    }

    #[test]
    fn rejects_wide_with_byes() {
        assert_eq!(
            validate_delivery(&dot().wide().bye()),
            Err(ValidationError::WideWithByes)
        );
        assert_eq!(
            validate_delivery(&dot().wide().leg_bye()),
            Err(ValidationError::WideWithByes)
        );
    }

    #[test]
    fn rejects_wide_no_ball() {
        assert_eq!(
            validate_delivery(&dot().wide().no_ball()),
            Err(ValidationError::WideAndNoBall)
        );
    }

    #[test]
    fn no_ball_with_byes_is_allowed() {
        assert!(validate_delivery(&dot().no_ball().bye().runs(1)).is_ok());
    }

    #[test]
    fn wicket_requires_dismissed_player() {
        let input = dot().dismissal(DismissalInput {
            kind: DismissalKind::Bowled,
            dismissed: None,
            bowler: None,
            fielder: None,
        });
        assert_eq!(
            validate_delivery(&input),
            Err(ValidationError::MissingDismissedPlayer(DismissalKind::Bowled))
        );
    }

    #[test]
    fn only_run_out_dismisses_non_striker() {
        let input = dot();
        let caught = input
            .clone()
            .dismissal(DismissalInput::new(DismissalKind::Caught, input.non_striker));
        assert_eq!(
            validate_delivery(&caught),
            Err(ValidationError::NonStrikerDismissal {
                kind: DismissalKind::Caught
            })
        );

        let run_out = input
            .clone()
            .dismissal(DismissalInput::new(DismissalKind::RunOut, input.non_striker));
        assert!(validate_delivery(&run_out).is_ok());
    }

    #[test]
    fn dismissed_player_must_be_at_crease() {
        let stranger = PlayerId::new();
        let input = dot().dismissal(DismissalInput::new(DismissalKind::RunOut, stranger));
        assert_eq!(
            validate_delivery(&input),
            Err(ValidationError::DismissedNotAtCrease(stranger))
        );
    }

    #[test]
    fn incoming_batter_must_not_be_out() {
        let input = dot();
        let current = Participants {
            striker: None,
            non_striker: Some(input.non_striker),
            bowler: Some(input.bowler),
        };
        let out = input.striker;
        assert_eq!(
            validate_crease(&input, &current, |p| p == out),
            Err(ValidationError::BatterAlreadyOut(out))
        );
        assert!(validate_crease(&input, &current, |_| false).is_ok());
    }
}
