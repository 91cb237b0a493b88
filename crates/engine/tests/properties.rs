use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

use engine::{BADGE_THRESHOLDS, BadgePolicy, Ledger, MIN_MONTHLY_GOAL, crossed_badges, scheduler};

proptest! {
    #[test]
    fn schedule_sums_to_goal(
        goal in MIN_MONTHLY_GOAL..5_000_000i64,
        days in 28u32..=31,
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let targets = scheduler::generate(goal, days, &mut rng).unwrap();
        prop_assert_eq!(targets.len(), days as usize);
        prop_assert_eq!(targets.iter().sum::<i64>(), goal);
        prop_assert!(targets.iter().all(|target| *target > 0));
    }

    #[test]
    fn total_tracks_daily_amounts(
        deposits in prop::collection::vec((1u32..=30, 1i64..100_000), 0..60),
    ) {
        let mut ledger = Ledger::new();
        for (day, amount) in &deposits {
            ledger.apply_deposit(*amount, *day, 30).unwrap();
        }
        prop_assert_eq!(ledger.total(), ledger.daily_amounts().values().sum::<i64>());
        prop_assert_eq!(ledger.total(), deposits.iter().map(|(_, amount)| amount).sum::<i64>());
        prop_assert!(ledger.validate(30).is_ok());
    }

    #[test]
    fn progress_only_moves_forward(
        goal in MIN_MONTHLY_GOAL..1_000_000i64,
        deposits in prop::collection::vec((1u32..=31, 1i64..50_000), 1..40),
    ) {
        let mut ledger = Ledger::new();
        let mut percent = ledger.percent_complete(goal).unwrap();
        let mut remaining = ledger.remaining(goal);
        for (day, amount) in deposits {
            ledger.apply_deposit(amount, day, 31).unwrap();
            let next_percent = ledger.percent_complete(goal).unwrap();
            let next_remaining = ledger.remaining(goal);
            prop_assert!(next_percent >= percent);
            prop_assert!(next_percent <= 100);
            prop_assert!(next_remaining <= remaining);
            prop_assert!(next_remaining >= 0);
            percent = next_percent;
            remaining = next_remaining;
        }
    }

    #[test]
    fn crossing_badges_fire_at_most_once(
        steps in prop::collection::vec(0u32..=100, 1..20),
    ) {
        let mut percents = steps;
        percents.sort_unstable();
        let mut fired: BTreeMap<u32, usize> = BTreeMap::new();
        let mut previous = 0;
        for percent in percents {
            for badge in crossed_badges(previous, percent, BadgePolicy::Crossing) {
                *fired.entry(badge.threshold_percent).or_insert(0) += 1;
            }
            previous = percent;
        }
        prop_assert!(fired.values().all(|count| *count == 1));
        for threshold in BADGE_THRESHOLDS {
            prop_assert_eq!(fired.contains_key(&threshold), previous >= threshold);
        }
    }
}
