//! What a presentation layer needs to draw the tracker.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    Ledger, ResultEngine,
    accounts::UserAccount,
    clock::days_in_month,
    metrics::{Badge, streak},
};

/// Snapshot produced after the initial load and after every mutating call.
///
/// Renderers (calendar, chart, progress bar) work from this value alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub username: String,
    pub monthly_goal: i64,
    pub total: i64,
    pub remaining: i64,
    pub percent_complete: u32,
    pub daily_amounts: BTreeMap<u32, i64>,
    pub targets: Vec<i64>,
    pub streak: u32,
    pub today: u32,
    pub days_in_month: u32,
    /// Milestones reached by the call that produced this snapshot.
    pub badges: Vec<Badge>,
}

impl Dashboard {
    pub fn build(
        account: &UserAccount,
        ledger: &Ledger,
        today: NaiveDate,
        badges: Vec<Badge>,
    ) -> ResultEngine<Self> {
        let snapshot = ledger.snapshot();
        Ok(Self {
            username: account.id.clone(),
            monthly_goal: account.monthly_goal,
            total: snapshot.total,
            remaining: ledger.remaining(account.monthly_goal),
            percent_complete: ledger.percent_complete(account.monthly_goal)?,
            streak: streak(&snapshot.daily_amounts, Some(today.day())),
            daily_amounts: snapshot.daily_amounts,
            targets: snapshot.targets,
            today: today.day(),
            days_in_month: days_in_month(today),
            badges,
        })
    }

    /// Amount saved on `day`, zero when nothing was saved.
    pub fn saved_on(&self, day: u32) -> i64 {
        self.daily_amounts.get(&day).copied().unwrap_or(0)
    }

    /// Target for `day` (1-based), if the schedule covers it.
    pub fn target_on(&self, day: u32) -> Option<i64> {
        let index = usize::try_from(day).ok()?.checked_sub(1)?;
        self.targets.get(index).copied()
    }
}
