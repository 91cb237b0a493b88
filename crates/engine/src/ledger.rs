//! The module contains `Ledger`, the per-user record of the current month.

use std::collections::BTreeMap;

use api_types::ledger::SavedData;
use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    EngineError, ResultEngine,
    clock::{month_key, month_length},
    util::ensure_amount,
};

/// Deposits of the current month and the daily target schedule.
///
/// `total` always equals the sum of `daily_amounts`; the only way to change
/// either is [`Ledger::apply_deposit`]. Targets are set once and never
/// replaced afterwards. A ledger stamped with a month only ever holds that
/// month.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ledger {
    total: i64,
    daily_amounts: BTreeMap<u32, i64>,
    targets: Vec<i64>,
    month: Option<String>,
    peak_percent: Option<u32>,
}

/// Read-only view of a [`Ledger`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerSnapshot {
    pub total: i64,
    pub daily_amounts: BTreeMap<u32, i64>,
    pub targets: Vec<i64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger for the month of `date`, nothing rewarded yet.
    pub fn for_month(date: NaiveDate) -> Self {
        Self {
            month: Some(month_key(date)),
            peak_percent: Some(0),
            ..Self::default()
        }
    }

    /// Rebuild a ledger from its stored form, rejecting anything that breaks
    /// the ledger invariants with [`EngineError::CacheCorrupt`].
    ///
    /// A stamped ledger is checked against the length of its own month,
    /// `days_in_month` applies to unstamped ones.
    pub fn from_saved(saved: SavedData, days_in_month: u32) -> ResultEngine<Self> {
        let days_in_month = match saved.month.as_deref() {
            Some(month) => month_length(month)
                .ok_or_else(|| EngineError::CacheCorrupt(format!("unknown month {month:?}")))?,
            None => days_in_month,
        };
        let ledger = Self {
            total: saved.total,
            daily_amounts: saved.days,
            targets: saved.targets,
            month: saved.month,
            peak_percent: saved.peak_percent,
        };
        ledger.validate(days_in_month)?;
        Ok(ledger)
    }

    pub fn to_saved(&self) -> SavedData {
        SavedData {
            total: self.total,
            days: self.daily_amounts.clone(),
            targets: self.targets.clone(),
            month: self.month.clone(),
            peak_percent: self.peak_percent,
        }
    }

    pub fn validate(&self, days_in_month: u32) -> ResultEngine<()> {
        if let Some((day, _)) = self
            .daily_amounts
            .iter()
            .find(|(day, _)| **day == 0 || **day > days_in_month)
        {
            return Err(EngineError::CacheCorrupt(format!(
                "deposit on day {day} outside 1..={days_in_month}"
            )));
        }
        if let Some((day, amount)) = self.daily_amounts.iter().find(|(_, amount)| **amount < 0) {
            return Err(EngineError::CacheCorrupt(format!(
                "negative amount {amount} on day {day}"
            )));
        }
        let sum = self
            .daily_amounts
            .values()
            .try_fold(0i64, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| EngineError::CacheCorrupt("daily amounts overflow".to_string()))?;
        if sum != self.total {
            return Err(EngineError::CacheCorrupt(format!(
                "total {} does not match daily amounts {sum}",
                self.total
            )));
        }
        if let Some(peak) = self.peak_percent.filter(|peak| *peak > 100) {
            return Err(EngineError::CacheCorrupt(format!(
                "rewarded progress {peak}% above 100%"
            )));
        }
        if self.targets_initialized() {
            if self.targets.len() != days_in_month as usize {
                return Err(EngineError::CacheCorrupt(format!(
                    "{} targets for a {days_in_month} day month",
                    self.targets.len()
                )));
            }
            if self.targets.iter().any(|target| *target <= 0) {
                return Err(EngineError::CacheCorrupt(
                    "non-positive daily target".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn daily_amounts(&self) -> &BTreeMap<u32, i64> {
        &self.daily_amounts
    }

    pub fn targets(&self) -> &[i64] {
        &self.targets
    }

    /// Amount saved on `day`; days without deposits are zero.
    pub fn amount_on(&self, day: u32) -> i64 {
        self.daily_amounts.get(&day).copied().unwrap_or(0)
    }

    /// Add `amount` to `day` and return the new total.
    ///
    /// There is no upper cap: savings may exceed the goal.
    pub fn apply_deposit(&mut self, amount: i64, day: u32, days_in_month: u32) -> ResultEngine<i64> {
        ensure_amount(amount)?;
        if day == 0 || day > days_in_month {
            return Err(EngineError::InvalidAmount(format!(
                "day {day} outside 1..={days_in_month}"
            )));
        }
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| EngineError::InvalidAmount("total overflow".to_string()))?;

        *self.daily_amounts.entry(day).or_insert(0) += amount;
        self.total = total;
        Ok(self.total)
    }

    pub fn remaining(&self, goal: i64) -> i64 {
        (goal - self.total).max(0)
    }

    /// Whole percent of `goal` saved so far, capped at 100.
    pub fn percent_complete(&self, goal: i64) -> ResultEngine<u32> {
        if goal <= 0 {
            return Err(EngineError::InvalidGoal(format!(
                "cannot compute progress against goal {goal}"
            )));
        }
        let percent = (i128::from(self.total) * 100 / i128::from(goal)).clamp(0, 100);
        Ok(percent as u32)
    }

    pub fn month(&self) -> Option<&str> {
        self.month.as_deref()
    }

    /// Whether the ledger is stamped with the month of `date`.
    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.month.as_deref() == Some(month_key(date).as_str())
    }

    /// Stamp an unstamped ledger with the month of `date`. Returns `false`
    /// if it already carries a month.
    pub fn stamp_month(&mut self, date: NaiveDate) -> bool {
        if self.month.is_some() {
            return false;
        }
        self.month = Some(month_key(date));
        true
    }

    /// Highest progress already rewarded this month, `None` when unknown.
    pub fn peak_percent(&self) -> Option<u32> {
        self.peak_percent
    }

    pub fn raise_peak(&mut self, percent: u32) {
        let percent = percent.min(100);
        self.peak_percent = Some(self.peak_percent.map_or(percent, |peak| peak.max(percent)));
    }

    /// Keep the rewarded progress of `other` when both describe the same
    /// month.
    pub fn merge_peak(&mut self, other: &Ledger) {
        if let Some(peak) = other.peak_percent
            && self.month.is_some()
            && self.month == other.month
        {
            self.raise_peak(peak);
        }
    }

    pub fn targets_initialized(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Install the month schedule. Returns `false`, leaving the existing
    /// schedule untouched, if one was already set.
    pub fn set_targets(&mut self, targets: Vec<i64>) -> bool {
        if self.targets_initialized() {
            return false;
        }
        self.targets = targets;
        true
    }

    /// Target for `day` (1-based).
    pub fn target_for(&self, day: u32) -> Option<i64> {
        let index = usize::try_from(day).ok()?.checked_sub(1)?;
        self.targets.get(index).copied()
    }

    /// Whether the deposits of `day` reached its target.
    pub fn hit_target(&self, day: u32) -> bool {
        self.target_for(day)
            .is_some_and(|target| self.amount_on(day) >= target)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            total: self.total,
            daily_amounts: self.daily_amounts.clone(),
            targets: self.targets.clone(),
        }
    }
}
