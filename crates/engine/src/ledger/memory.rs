//! In-memory ledger used by tests and local runs without a database.
//!
//! One async mutex guards the whole state and is held for the full unit of
//! work, so operations are trivially serializable. Legs are decided first and
//! published only once every leg of the unit succeeded.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, AtomicU32, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use tokio::sync::Mutex;

use crate::{
    AccountChange, ChangeBalanceCmd, EngineError, ResultEngine, Transaction, TransferCmd,
    TransferOutcome,
};

use super::{LedgerStore, account_change, next_balance};

#[derive(Debug, Default)]
struct State {
    balances: HashMap<i64, i64>,
    transactions: Vec<Transaction>,
}

impl State {
    fn balance(&self, user_id: i64) -> Option<i64> {
        self.balances.get(&user_id).copied()
    }

    fn publish(&mut self, change: AccountChange, tx: Transaction) {
        self.balances.insert(change.user_id(), change.balance());
        self.transactions.push(tx);
    }
}

/// Decide one leg without touching the state.
fn stage(
    user_id: i64,
    current: Option<i64>,
    amount: i64,
    source: &str,
    comment: &str,
    change_time: DateTime<Utc>,
) -> ResultEngine<(AccountChange, Transaction)> {
    let balance = next_balance(user_id, current, amount)?;
    let tx = Transaction::new(
        user_id,
        current.unwrap_or(0),
        amount,
        change_time,
        source,
        comment,
    );
    Ok((account_change(user_id, current, balance), tx))
}

#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
    offline: AtomicBool,
    pending_conflicts: AtomicU32,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every operation fails with [`EngineError::Store`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `count` mutations abort with [`EngineError::Conflict`].
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of transactions recorded across all accounts.
    pub async fn transaction_count(&self) -> usize {
        self.state.lock().await.transactions.len()
    }

    fn ensure_online(&self) -> ResultEngine<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(EngineError::Store(DbErr::Custom(
                "memory ledger is offline".to_string(),
            )));
        }
        Ok(())
    }

    fn take_conflict(&self) -> ResultEngine<()> {
        let took = self
            .pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if took {
            return Err(EngineError::Conflict(
                "injected serialization failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn apply_change(&self, cmd: ChangeBalanceCmd) -> ResultEngine<AccountChange> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        self.take_conflict()?;

        let (change, tx) = stage(
            cmd.user_id,
            state.balance(cmd.user_id),
            cmd.amount,
            &cmd.source,
            &cmd.comment,
            Utc::now(),
        )?;
        state.publish(change, tx);
        Ok(change)
    }

    async fn apply_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        self.ensure_online()?;
        let mut state = self.state.lock().await;
        self.take_conflict()?;

        let Some(source_balance) = state.balance(cmd.user_id) else {
            return Err(EngineError::AccountNotFound(cmd.user_id));
        };
        let change_time = Utc::now();
        let (source, debit) = stage(
            cmd.user_id,
            Some(source_balance),
            -cmd.amount,
            &cmd.target_id.to_string(),
            &cmd.comment,
            change_time,
        )?;
        // The credit leg observes the debit when both legs hit one account.
        let target_balance = if cmd.target_id == cmd.user_id {
            Some(source.balance())
        } else {
            state.balance(cmd.target_id)
        };
        let (target, credit) = stage(
            cmd.target_id,
            target_balance,
            cmd.amount,
            &cmd.user_id.to_string(),
            &cmd.comment,
            change_time,
        )?;

        state.publish(source, debit);
        state.publish(target, credit);
        Ok(TransferOutcome { source, target })
    }

    async fn read_balance(&self, user_id: i64) -> ResultEngine<i64> {
        self.ensure_online()?;
        self.state
            .lock()
            .await
            .balance(user_id)
            .ok_or(EngineError::AccountNotFound(user_id))
    }

    async fn read_transactions(&self, user_id: i64) -> ResultEngine<Vec<Transaction>> {
        self.ensure_online()?;
        Ok(self
            .state
            .lock()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect())
    }
}
