//! SQL ledger backed by sea-orm (SQLite or PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, IsolationLevel, QueryFilter, QueryOrder, TransactionTrait,
    sea_query::Expr,
};

use crate::{
    AccountChange, ChangeBalanceCmd, EngineError, ResultEngine, Transaction, TransferCmd,
    TransferOutcome, accounts, transactions,
};

use super::{LedgerStore, account_change, next_balance};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
///
/// An early `?` or `return` drops the transaction, which rolls it back.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

#[derive(Clone, Debug)]
pub struct SeaOrmLedger {
    database: DatabaseConnection,
}

impl SeaOrmLedger {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    /// Begin a serializable unit of work.
    ///
    /// SQLite transactions are always serializable and sea-orm cannot set the
    /// level there, so it is only requested on PostgreSQL.
    async fn begin(&self) -> ResultEngine<DatabaseTransaction> {
        let isolation = matches!(self.database.get_database_backend(), DbBackend::Postgres)
            .then_some(IsolationLevel::Serializable);
        Ok(self.database.begin_with_config(isolation, None).await?)
    }

    async fn current_balance(
        db_tx: &DatabaseTransaction,
        user_id: i64,
    ) -> ResultEngine<Option<i64>> {
        Ok(accounts::Entity::find_by_id(user_id)
            .one(db_tx)
            .await?
            .map(|account| account.balance))
    }

    /// Atomically add `amount` to the stored balance and return the new value.
    async fn increment(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        amount: i64,
    ) -> ResultEngine<i64> {
        let updated = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(amount),
            )
            .filter(accounts::Column::UserId.eq(user_id))
            .exec_with_returning(db_tx)
            .await?;
        updated
            .into_iter()
            .next()
            .map(|account| account.balance)
            .ok_or(EngineError::AccountNotFound(user_id))
    }

    /// Open or update one account and append its transaction row.
    async fn apply_leg(
        db_tx: &DatabaseTransaction,
        user_id: i64,
        current: Option<i64>,
        amount: i64,
        change_time: DateTime<Utc>,
        source: &str,
        comment: &str,
    ) -> ResultEngine<AccountChange> {
        let expected = next_balance(user_id, current, amount)?;
        let balance = match current {
            None => {
                accounts::ActiveModel::opening(user_id, expected)
                    .insert(db_tx)
                    .await?;
                tracing::trace!("opened account {user_id} with {expected}");
                expected
            }
            Some(_) => Self::increment(db_tx, user_id, amount).await?,
        };
        if balance != expected {
            return Err(EngineError::Conflict(format!(
                "account {user_id} changed during the unit of work"
            )));
        }

        let tx = Transaction::new(
            user_id,
            current.unwrap_or(0),
            amount,
            change_time,
            source,
            comment,
        );
        transactions::ActiveModel::from(&tx).insert(db_tx).await?;
        tracing::trace!("inserted transaction {tx:?}");

        Ok(account_change(user_id, current, balance))
    }
}

#[async_trait]
impl LedgerStore for SeaOrmLedger {
    async fn apply_change(&self, cmd: ChangeBalanceCmd) -> ResultEngine<AccountChange> {
        let ChangeBalanceCmd {
            user_id,
            amount,
            comment,
            source,
        } = cmd;
        with_tx!(self, |db_tx| {
            let current = Self::current_balance(&db_tx, user_id).await?;
            let change = Self::apply_leg(
                &db_tx,
                user_id,
                current,
                amount,
                Utc::now(),
                &source,
                &comment,
            )
            .await?;
            Ok(change)
        })
    }

    async fn apply_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        let TransferCmd {
            user_id,
            target_id,
            amount,
            comment,
        } = cmd;
        with_tx!(self, |db_tx| {
            let change_time = Utc::now();
            let Some(source_balance) = Self::current_balance(&db_tx, user_id).await? else {
                return Err(EngineError::AccountNotFound(user_id));
            };
            let source = Self::apply_leg(
                &db_tx,
                user_id,
                Some(source_balance),
                -amount,
                change_time,
                &target_id.to_string(),
                &comment,
            )
            .await?;

            let target_balance = Self::current_balance(&db_tx, target_id).await?;
            let target = Self::apply_leg(
                &db_tx,
                target_id,
                target_balance,
                amount,
                change_time,
                &user_id.to_string(),
                &comment,
            )
            .await?;
            Ok(TransferOutcome { source, target })
        })
    }

    async fn read_balance(&self, user_id: i64) -> ResultEngine<i64> {
        accounts::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(|account| account.balance)
            .ok_or(EngineError::AccountNotFound(user_id))
    }

    async fn read_transactions(&self, user_id: i64) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Transaction::from).collect())
    }
}
