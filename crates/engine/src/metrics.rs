//! Values derived from deposit history: streaks and milestone badges.
//!
//! Nothing here is stored. Both functions are recomputed from the ledger
//! every time the dashboard is built.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Progress milestones, in percent of the monthly goal.
pub const BADGE_THRESHOLDS: [u32; 4] = [25, 50, 75, 100];

/// Width of the band above a threshold inside which the banded policy still
/// fires the badge.
pub const BADGE_BAND: u32 = 5;

/// How a milestone crossing is detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgePolicy {
    /// The threshold must be crossed and the new percentage must land within
    /// [`BADGE_BAND`] points of it. A single deposit jumping from 24% to 30%
    /// skips the 25% badge.
    #[default]
    Banded,
    /// Any crossing fires.
    Crossing,
}

/// A milestone reached by a deposit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub threshold_percent: u32,
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% reached", self.threshold_percent)
    }
}

/// Consecutive days with a positive deposit, counted backwards.
///
/// With `as_of` the walk starts from that day, or from the day before when
/// nothing was saved yet today, so an unbroken run is not lost before the
/// daily deposit. Without `as_of` it starts from the last recorded day.
pub fn streak(daily_amounts: &BTreeMap<u32, i64>, as_of: Option<u32>) -> u32 {
    let saved = |day: u32| daily_amounts.get(&day).is_some_and(|amount| *amount > 0);

    let start = match as_of {
        Some(today) if saved(today) => today,
        Some(today) if today > 1 && saved(today - 1) => today - 1,
        Some(_) => return 0,
        None => match daily_amounts.keys().next_back() {
            Some(last) => *last,
            None => return 0,
        },
    };

    (1..=start).rev().take_while(|day| saved(*day)).count() as u32
}

/// Milestones crossed when progress moves from `old_percent` to
/// `new_percent`.
///
/// Callers pass the highest progress already rewarded this month as
/// `old_percent`, so a threshold fires at most once even when a goal change
/// pulls progress back below it.
pub fn crossed_badges(old_percent: u32, new_percent: u32, policy: BadgePolicy) -> Vec<Badge> {
    BADGE_THRESHOLDS
        .iter()
        .copied()
        .filter(|threshold| old_percent < *threshold && *threshold <= new_percent)
        .filter(|threshold| match policy {
            BadgePolicy::Banded => new_percent < threshold + BADGE_BAND,
            BadgePolicy::Crossing => true,
        })
        .map(|threshold_percent| Badge { threshold_percent })
        .collect()
}
