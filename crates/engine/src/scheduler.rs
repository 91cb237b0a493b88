//! Daily target schedule.
//!
//! A monthly goal is split into one target per day. Each day draws a value
//! around the running average so the calendar does not look flat, and the
//! last day takes whatever is left so the schedule always sums to the goal.

use rand::Rng;

use crate::{EngineError, ResultEngine};

/// Smallest target a day receives when the goal allows it.
pub const DAILY_FLOOR: i64 = 100;

/// Largest distance of a draw from the running average.
pub const MAX_VARIANCE: i64 = 500;

/// Build `day_count` positive targets summing exactly to `goal`.
///
/// The floor is [`DAILY_FLOOR`], lowered to `goal / day_count` for goals too
/// small to give every day 100 units. A goal smaller than `day_count` cannot
/// be split into positive integers and is rejected.
pub fn generate<R>(goal: i64, day_count: u32, rng: &mut R) -> ResultEngine<Vec<i64>>
where
    R: Rng + ?Sized,
{
    if day_count == 0 {
        return Err(EngineError::InvalidGoal(
            "cannot schedule a month with no days".to_string(),
        ));
    }
    let days = i64::from(day_count);
    if goal < days {
        return Err(EngineError::InvalidGoal(format!(
            "goal {goal} cannot give each of {days} days a positive target"
        )));
    }

    let floor = DAILY_FLOOR.min(goal / days);
    let mut remaining = goal;
    let mut targets = Vec::with_capacity(day_count as usize);

    for day in 0..days {
        let days_left = days - day;
        if days_left == 1 {
            targets.push(remaining);
            break;
        }

        let average = remaining / days_left;
        let variance = MAX_VARIANCE.min(average * 2 / 5);
        let low = floor.max(average - variance);
        // Leave at least `floor` for every day still to come.
        let high = (average + variance).min(remaining - (days_left - 1) * floor);

        let value = if high < low {
            low.min(remaining)
        } else {
            rng.gen_range(low..=high)
        };
        remaining -= value;
        targets.push(value);
    }

    Ok(targets)
}
