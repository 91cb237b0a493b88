use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegisterUser {
        pub username: String,
        pub password: String,
        pub monthly_goal: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginUser {
        pub username: String,
        pub password: String,
    }

    /// Response body of both `/api/register` and `/api/login`.
    ///
    /// `user` is present only when `ok` is true; `msg` carries the rejection
    /// reason otherwise.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub ok: bool,
        #[serde(default)]
        pub user: Option<UserRecord>,
        #[serde(default)]
        pub msg: Option<String>,
    }

    /// A user as the remote store knows it: account fields plus the current
    /// month ledger. Never carries a credential.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct UserRecord {
        pub username: String,
        pub monthly_goal: i64,
        #[serde(default)]
        pub saved_data: ledger::SavedData,
    }
}

pub mod ledger {
    use super::*;

    /// Month ledger on the wire.
    ///
    /// `days` is keyed by day of month (1-based); missing days are zero.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SavedData {
        #[serde(default)]
        pub total: i64,
        #[serde(default)]
        pub days: BTreeMap<u32, i64>,
        #[serde(default)]
        pub targets: Vec<i64>,
        /// Month the ledger belongs to, `YYYY-MM`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub month: Option<String>,
        /// Highest progress already rewarded with a badge this month.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub peak_percent: Option<u32>,
    }
}

pub mod deposit {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SaveDeposit {
        pub username: String,
        /// Must be > 0.
        pub amount: i64,
        /// Calendar day the deposit belongs to (`YYYY-MM-DD`).
        pub date: NaiveDate,
    }
}
