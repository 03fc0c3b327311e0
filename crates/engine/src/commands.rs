//! Command structs for engine operations.
//!
//! These types group parameters for write operations (balance changes and
//! transfers) and reads (balance, history), keeping call sites readable and
//! avoiding long argument lists.

/// Deposit (positive `amount`) or withdraw (negative `amount`) on one account.
#[derive(Clone, Debug)]
pub struct ChangeBalanceCmd {
    pub user_id: i64,
    pub amount: i64,
    pub comment: String,
    pub source: String,
}

impl ChangeBalanceCmd {
    #[must_use]
    pub fn new(user_id: i64, amount: i64) -> Self {
        Self {
            user_id,
            amount,
            comment: String::new(),
            source: String::new(),
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    #[must_use]
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }
}

/// Move `amount` from `user_id` to `target_id`.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: i64,
    pub target_id: i64,
    pub amount: i64,
    pub comment: String,
}

impl TransferCmd {
    #[must_use]
    pub fn new(user_id: i64, target_id: i64, amount: i64) -> Self {
        Self {
            user_id,
            target_id,
            amount,
            comment: String::new(),
        }
    }

    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// Current balance of an account, optionally converted for display.
#[derive(Clone, Debug)]
pub struct BalanceQuery {
    pub user_id: i64,
    pub currency: Option<String>,
}

impl BalanceQuery {
    #[must_use]
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            currency: None,
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }
}

/// One page of an account's transaction history.
///
/// `page` is 1-based. `change_sort` takes precedence over `time_sort`.
#[derive(Clone, Debug)]
pub struct HistoryQuery {
    pub user_id: i64,
    pub page: i64,
    pub per_page: i64,
    pub change_sort: bool,
    pub time_sort: bool,
}

impl HistoryQuery {
    #[must_use]
    pub fn new(user_id: i64, page: i64, per_page: i64) -> Self {
        Self {
            user_id,
            page,
            per_page,
            change_sort: false,
            time_sort: false,
        }
    }

    #[must_use]
    pub fn change_sort(mut self, enabled: bool) -> Self {
        self.change_sort = enabled;
        self
    }

    #[must_use]
    pub fn time_sort(mut self, enabled: bool) -> Self {
        self.time_sort = enabled;
        self
    }
}
