use scorebook_types::{DeliveryInput, Dismissal, RunsBreakdown};

/// Penalty for a wide or a no-ball.
pub const EXTRA_PENALTY: u32 = 1;

/// Attribute a delivery's completed runs.
///
/// On a wide every completed run is a wide run on top of the penalty.
/// Otherwise completed runs go to byes, leg-byes or the bat, and a no-ball
/// adds its one-run penalty.
pub fn classify_runs(input: &DeliveryInput) -> RunsBreakdown {
    let mut runs = RunsBreakdown::default();

    if input.is_wide {
        runs.wide_runs = EXTRA_PENALTY + input.completed_runs;
        runs.penalty_runs = EXTRA_PENALTY;
        return runs;
    }

    if input.is_bye {
        runs.byes = input.completed_runs;
    } else if input.is_leg_bye {
        runs.leg_byes = input.completed_runs;
    } else {
        runs.off_bat = input.completed_runs;
    }

    if input.is_no_ball {
        runs.no_ball_runs = EXTRA_PENALTY;
        runs.penalty_runs = EXTRA_PENALTY;
    }
    runs
}

/// Four or six completed runs on anything but a wide.
pub fn is_boundary(input: &DeliveryInput) -> bool {
    !input.is_wide && matches!(input.completed_runs, 4 | 6)
}

/// Resolve the recorded dismissal for a validated delivery.
///
/// The wicket is credited to the delivery's bowler for the kinds that
/// credit bowlers, unless a different bowler was named.
pub fn resolve_dismissal(input: &DeliveryInput) -> Option<Dismissal> {
    let dismissal = input.dismissal.as_ref()?;
    let dismissed = dismissal.dismissed?;

    let credited = dismissal.bowler.unwrap_or(input.bowler);
    let bowler_credited =
        (dismissal.kind.credits_bowler() && credited == input.bowler).then_some(credited);

    Some(Dismissal {
        kind: dismissal.kind,
        dismissed,
        bowler_credited,
        fielder: dismissal.fielder,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorebook_types::{DismissalInput, DismissalKind, PlayerId};

    fn dot() -> DeliveryInput {
        DeliveryInput::new(PlayerId::new(), PlayerId::new(), PlayerId::new())
    }

    #[test]
    fn runs_off_the_bat() {
        let runs = classify_runs(&dot().runs(3));
        assert_eq!(runs.off_bat, 3);
        assert_eq!(runs.total(), 3);
        assert_eq!(runs.extras(), 0);
    }

    #[test]
    fn wide_runs_include_penalty() {
        let runs = classify_runs(&dot().wide().runs(1));
        assert_eq!(runs.wide_runs, 2);
        assert_eq!(runs.off_bat, 0);
        assert_eq!(runs.penalty_runs, 1);
        assert_eq!(runs.total(), 2);
    }

    #[test]
    fn no_ball_with_runs_off_bat() {
        let runs = classify_runs(&dot().no_ball().runs(4));
        assert_eq!(runs.off_bat, 4);
        assert_eq!(runs.no_ball_runs, 1);
        assert_eq!(runs.total(), 5);
    }

    #[test]
    fn byes_and_leg_byes() {
        assert_eq!(classify_runs(&dot().bye().runs(2)).byes, 2);
        assert_eq!(classify_runs(&dot().leg_bye().runs(1)).leg_byes, 1);
        let nb_bye = classify_runs(&dot().no_ball().bye().runs(1));
        assert_eq!((nb_bye.byes, nb_bye.no_ball_runs, nb_bye.total()), (1, 1, 2));
    }

    #[test]
    fn boundaries() {
        assert!(is_boundary(&dot().runs(4)));
        assert!(is_boundary(&dot().leg_bye().runs(4)));
        assert!(!is_boundary(&dot().wide().runs(4)));
        assert!(!is_boundary(&dot().runs(5)));
    }

    #[test]
    fn caught_credits_delivery_bowler() {
        let input = dot();
        let fielder = PlayerId::new();
        let input = input.clone().dismissal(
            DismissalInput::new(DismissalKind::Caught, input.striker).with_fielder(fielder),
        );
        let dismissal = resolve_dismissal(&input).unwrap();
        assert_eq!(dismissal.bowler_credited, Some(input.bowler));
        assert_eq!(dismissal.fielder, Some(fielder));
    }

    #[test]
    fn run_out_credits_nobody() {
        let input = dot();
        let input = input
            .clone()
            .dismissal(DismissalInput::new(DismissalKind::RunOut, input.striker));
        assert_eq!(resolve_dismissal(&input).unwrap().bowler_credited, None);
    }

    #[test]
    fn named_other_bowler_is_not_credited() {
        let input = dot();
        let mut dismissal = DismissalInput::new(DismissalKind::Bowled, input.striker);
        dismissal.bowler = Some(PlayerId::new());
        let input = input.dismissal(dismissal);
        assert_eq!(resolve_dismissal(&input).unwrap().bowler_credited, None);
    }

    #[test]
    fn no_dismissal() {
        assert!(resolve_dismissal(&dot()).is_none());
    }
}
