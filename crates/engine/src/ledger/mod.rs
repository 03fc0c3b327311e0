//! Ledger store: the durable authority for accounts and their transactions.
//!
//! Every operation is one serializable unit of work. An error raised halfway
//! through aborts the whole unit: no transaction row is appended and no
//! balance moves. Serialization failures surface as
//! [`EngineError::Conflict`], distinct from domain errors, so the caller can
//! decide to retry.

use async_trait::async_trait;

use crate::{
    AccountChange, ChangeBalanceCmd, EngineError, ResultEngine, Transaction, TransferCmd,
    TransferOutcome,
};

pub use database::SeaOrmLedger;
pub use memory::MemoryLedger;

mod database;
mod memory;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Apply `cmd.amount` to the account, opening it if needed.
    async fn apply_change(&self, cmd: ChangeBalanceCmd) -> ResultEngine<AccountChange>;

    /// Debit the source and credit (or open) the target in one unit of work.
    ///
    /// `cmd.amount` must already be validated as non-negative.
    async fn apply_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome>;

    async fn read_balance(&self, user_id: i64) -> ResultEngine<i64>;

    /// All transactions of the account, in store order.
    async fn read_transactions(&self, user_id: i64) -> ResultEngine<Vec<Transaction>>;
}

/// Decide the balance that results from applying `amount` to an account whose
/// current balance is `current` (`None` if the account does not exist yet).
///
/// Shared by every backend so they enforce the same rules:
/// - an account cannot be opened with a negative amount,
/// - no account may go below zero,
/// - overflow is rejected rather than wrapped.
pub(crate) fn next_balance(user_id: i64, current: Option<i64>, amount: i64) -> ResultEngine<i64> {
    let Some(current) = current else {
        if amount < 0 {
            return Err(EngineError::InvalidOperation(format!(
                "cannot open account {user_id} with a negative balance"
            )));
        }
        return Ok(amount);
    };

    let next = current.checked_add(amount).ok_or_else(|| {
        EngineError::InvalidOperation(format!("balance overflow on account {user_id}"))
    })?;
    if next < 0 {
        return Err(EngineError::InsufficientFunds(format!(
            "account {user_id} has {current}, cannot apply {amount}"
        )));
    }
    Ok(next)
}

/// Turn a decided balance move into the store's result variant.
pub(crate) fn account_change(user_id: i64, current: Option<i64>, balance: i64) -> AccountChange {
    match current {
        None => AccountChange::Created { user_id, balance },
        Some(previous) => AccountChange::Updated {
            user_id,
            previous,
            balance,
        },
    }
}
