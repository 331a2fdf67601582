// backend/campaign-view/src/test_properties.rs
//
// Property tests for the pure derivations.

use proptest::prelude::*;

use crate::types::FULLY_FUNDED_BPS;
use crate::{coerce_duration_days, coerce_goal, CampaignStatus, FundingProgress};

/// `a * b` for a small `b`, as a (high, low) pair of 128-bit words.
fn wide_mul(a: u128, b: u128) -> (u128, u128) {
    let (high, low) = (a >> 64, a & u128::from(u64::MAX));
    let (high, low) = (high * b, low * b);
    let (sum, carry) = (high << 64).overflowing_add(low);
    ((high >> 64) + u128::from(carry), sum)
}

fn huge_goal_and_short_balance() -> impl Strategy<Value = (u128, u128)> {
    (u128::MAX / 10_000 + 1..=u128::MAX).prop_flat_map(|goal| (0..goal, Just(goal)))
}

proptest! {
    #[test]
    fn prop_progress_matches_clamped_ratio(balance in 0u128..=u64::MAX as u128, goal in 1u128..=u64::MAX as u128) {
        let progress = FundingProgress::compute(balance, goal);
        let expected = (balance * 10_000 / goal).min(10_000) as u32;
        prop_assert_eq!(progress.basis_points(), expected);
        prop_assert!(progress.basis_points() <= FULLY_FUNDED_BPS);
    }

    #[test]
    fn prop_progress_floors_exactly_for_huge_goals((balance, goal) in huge_goal_and_short_balance()) {
        let bps = FundingProgress::compute(balance, goal).basis_points();
        prop_assert!(bps < FULLY_FUNDED_BPS);
        let scaled = wide_mul(balance, 10_000);
        prop_assert!(wide_mul(goal, u128::from(bps)) <= scaled);
        prop_assert!(scaled < wide_mul(goal, u128::from(bps) + 1));
    }

    #[test]
    fn prop_progress_never_exceeds_full(balance in any::<u128>(), goal in any::<u128>()) {
        let progress = FundingProgress::compute(balance, goal);
        prop_assert!(progress.basis_points() <= FULLY_FUNDED_BPS);
        prop_assert_eq!(progress.is_fully_funded(), balance >= goal.max(1));
    }

    #[test]
    fn prop_status_is_deterministic(code in any::<u8>()) {
        let status = CampaignStatus::from_code(code);
        prop_assert_eq!(status, CampaignStatus::from_code(code));
        if code > 2 {
            prop_assert_eq!(status, CampaignStatus::Unknown);
        }
    }

    #[test]
    fn prop_coercion_floors_at_one(goal in any::<i128>(), days in any::<i64>()) {
        let coerced_goal = coerce_goal(goal);
        let coerced_days = coerce_duration_days(days);
        prop_assert!(coerced_goal >= 1);
        prop_assert!(coerced_days >= 1);
        if goal >= 1 {
            prop_assert_eq!(coerced_goal, goal as u128);
        }
        if days >= 1 {
            prop_assert_eq!(coerced_days, days as u64);
        }
    }
}
