//! Input validation helpers.
//!
//! Everything the presentation layer hands to the engine is a raw string or a
//! plain integer; these functions are the single place where such input is
//! turned into values the core accepts.

use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Suggested monthly goal when the user does not pick one.
pub const DEFAULT_MONTHLY_GOAL: i64 = 25_000;

/// Smallest accepted monthly goal.
///
/// Every day of the longest month must receive a positive target, so the goal
/// cannot be smaller than 31 units.
pub const MIN_MONTHLY_GOAL: i64 = 31;

/// Trim and NFC-normalize a username so visually equal names share one key.
pub fn normalize_username(value: &str) -> ResultEngine<String> {
    let normalized: String = value.trim().nfc().collect();
    if normalized.is_empty() {
        return Err(EngineError::WrongCredential(
            "username must not be empty".to_string(),
        ));
    }
    Ok(normalized)
}

pub(crate) fn ensure_credential(credential: &str) -> ResultEngine<()> {
    if credential.trim().is_empty() {
        return Err(EngineError::WrongCredential(
            "password must not be empty".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_goal(goal: i64) -> ResultEngine<()> {
    if goal < MIN_MONTHLY_GOAL {
        return Err(EngineError::InvalidGoal(format!(
            "monthly goal must be at least {MIN_MONTHLY_GOAL}, got {goal}"
        )));
    }
    Ok(())
}

pub(crate) fn ensure_amount(amount: i64) -> ResultEngine<()> {
    if amount <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    Ok(())
}

/// Parse a user-entered monthly goal.
///
/// Non-numeric or too small input is rejected rather than replaced by
/// [`DEFAULT_MONTHLY_GOAL`].
pub fn parse_goal(raw: &str) -> ResultEngine<i64> {
    let goal = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| EngineError::InvalidGoal(format!("not a whole number: {raw:?}")))?;
    ensure_goal(goal)?;
    Ok(goal)
}

/// Parse a user-entered deposit amount.
pub fn parse_amount(raw: &str) -> ResultEngine<i64> {
    let amount = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| EngineError::InvalidAmount(format!("not a whole number: {raw:?}")))?;
    ensure_amount(amount)?;
    Ok(amount)
}
