use proptest::prelude::*;
use settle_sync::domain::money::MoneyAmount;
use settle_sync::domain::swap::{SwapAction, SwapStatus};

fn arb_action() -> impl Strategy<Value = SwapAction> {
    prop_oneof![
        Just(SwapAction::Accept),
        Just(SwapAction::Decline),
        Just(SwapAction::Cancel),
        Just(SwapAction::Fulfill),
        Just(SwapAction::Expire),
    ]
}

fn arb_status() -> impl Strategy<Value = SwapStatus> {
    prop_oneof![
        Just(SwapStatus::Requested),
        Just(SwapStatus::Accepted),
        Just(SwapStatus::Declined),
        Just(SwapStatus::Cancelled),
        Just(SwapStatus::Fulfilled),
        Just(SwapStatus::Expired),
    ]
}

proptest! {
    /// Terminal states admit no action at all.
    #[test]
    fn terminal_states_reject_all_actions(action in arb_action()) {
        for terminal in [
            SwapStatus::Declined,
            SwapStatus::Cancelled,
            SwapStatus::Fulfilled,
            SwapStatus::Expired,
        ] {
            prop_assert!(!action.legal_from().contains(&terminal));
        }
    }

    /// Every action's target is reachable only via that action's legal-from
    /// set, and never loops back into it.
    #[test]
    fn target_is_never_in_legal_from(action in arb_action()) {
        prop_assert!(!action.legal_from().contains(&action.target()));
    }

    /// Any random action sequence starting from `requested` applies at most
    /// two transitions (accept then fulfill is the longest legal chain) and
    /// always parks in either `accepted` or a terminal state.
    #[test]
    fn random_walk_is_bounded(actions in prop::collection::vec(arb_action(), 1..30)) {
        let mut current = SwapStatus::Requested;
        let mut applied = 0u32;
        for action in &actions {
            if action.legal_from().contains(&current) {
                current = action.target();
                applied += 1;
            }
        }
        prop_assert!(applied <= 2, "got {applied} transitions in walk: {actions:?}");
        if applied > 0 {
            prop_assert!(
                current == SwapStatus::Accepted || current.is_terminal(),
                "walk ended in unexpected state {current}"
            );
        }
    }

    /// as_str → try_from roundtrip is identity for statuses and actions.
    #[test]
    fn status_roundtrip(status in arb_status()) {
        prop_assert_eq!(SwapStatus::try_from(status.as_str()).unwrap(), status);
    }

    #[test]
    fn action_roundtrip(action in arb_action()) {
        prop_assert_eq!(SwapAction::try_from(action.as_str()).unwrap(), action);
    }

    /// Minor→major conversion never drifts within the supported range:
    /// scaling back up recovers the exact minor-unit value.
    #[test]
    fn minor_to_major_never_drifts(minor in 0i64..=1_000_000_000_000) {
        let amount = MoneyAmount::new(minor).unwrap();
        let recovered = (amount.major_units() * 100.0).round() as i64;
        prop_assert_eq!(recovered, minor);
    }

    /// checked_add mirrors i64::checked_add; a sum is only ever lost to
    /// overflow, never silently wrapped.
    #[test]
    fn money_add_never_silently_overflows(a in 0i64..=i64::MAX, b in 0i64..=i64::MAX) {
        let result = MoneyAmount::new(a).unwrap().checked_add(MoneyAmount::new(b).unwrap());
        match a.checked_add(b) {
            Some(expected) => prop_assert_eq!(result.unwrap().minor_units(), expected),
            None => prop_assert!(result.is_none()),
        }
    }
}
