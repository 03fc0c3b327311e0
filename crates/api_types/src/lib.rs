//! JSON bodies exchanged over the HTTP API.
//!
//! All amounts are integer minor units (kopecks for the base currency).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod balance {
    use super::*;

    /// Body of `PATCH /users/{user_id}/balance`.
    ///
    /// A positive `change` deposits, a negative one withdraws. The account is
    /// opened by its first deposit.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ChangeBalance {
        pub change: i64,
        #[serde(default)]
        pub comment: String,
        /// Free-text origin of the money, e.g. `"card"`.
        #[serde(default)]
        pub source: String,
    }

    /// Body of `PATCH /users/{user_id}/balance/transfer`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Transfer {
        pub change: i64,
        pub target_id: i64,
        #[serde(default)]
        pub comment: String,
    }

    /// Query of `GET /users/{user_id}/balance`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BalanceGet {
        pub currency: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Balance {
        pub user_id: i64,
        pub balance: i64,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferResult {
        pub source: Balance,
        pub target: Balance,
    }

    /// Balance expressed in `currency`.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceView {
        pub user_id: i64,
        pub balance: i64,
        pub currency: String,
    }
}

pub mod transaction {
    use super::*;

    /// Body of `POST /users/{user_id}/transactions`.
    ///
    /// `page` is 1-based. A page past the end returns the last page.
    /// `change_sort` wins over `time_sort` when both are set.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub page: i64,
        pub per_page: i64,
        #[serde(default)]
        pub change_sort: bool,
        #[serde(default)]
        pub time_sort: bool,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransactionView {
        pub init_balance: i64,
        pub change: i64,
        pub change_time: DateTime<Utc>,
        pub source: String,
        pub comment: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub user_id: i64,
        pub transactions: Vec<TransactionView>,
    }
}
