use crate::{
    AccountChange, BalanceQuery, ChangeBalanceCmd, Currency, EngineError, ResultEngine,
    TransferCmd, TransferOutcome,
    cache::{CacheError, CacheKey},
};

use super::{Engine, ensure_user_id};

/// Balance of one account, in minor units of `currency`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BalanceView {
    pub user_id: i64,
    pub balance: i64,
    pub currency: Currency,
}

impl Engine {
    /// Deposit or withdraw on one account, opening it on first use.
    pub async fn change_balance(&self, cmd: ChangeBalanceCmd) -> ResultEngine<AccountChange> {
        ensure_user_id(cmd.user_id)?;

        self.invalidate_balance(cmd.user_id).await;
        let change = self
            .retry_conflicts("change_balance", || self.ledger.apply_change(cmd.clone()))
            .await?;
        // A reader may have cached the old balance while the change was in flight.
        self.invalidate_balance(cmd.user_id).await;

        tracing::debug!(
            "account {} balance {} -> {}",
            change.user_id(),
            change.previous(),
            change.balance()
        );
        Ok(change)
    }

    /// Move `cmd.amount` from `cmd.user_id` to `cmd.target_id`.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferOutcome> {
        ensure_user_id(cmd.user_id)?;
        ensure_user_id(cmd.target_id)?;
        if cmd.amount < 0 {
            return Err(EngineError::InvalidOperation(format!(
                "transfer amount must be non-negative, got {}",
                cmd.amount
            )));
        }
        if cmd.user_id == cmd.target_id {
            return Err(EngineError::InvalidOperation(format!(
                "cannot transfer from account {} to itself",
                cmd.user_id
            )));
        }

        self.invalidate_balance(cmd.user_id).await;
        self.invalidate_balance(cmd.target_id).await;
        let outcome = self
            .retry_conflicts("transfer", || self.ledger.apply_transfer(cmd.clone()))
            .await?;
        self.invalidate_balance(cmd.user_id).await;
        self.invalidate_balance(cmd.target_id).await;

        tracing::debug!(
            "transferred {} from {} to {}",
            cmd.amount,
            cmd.user_id,
            cmd.target_id
        );
        Ok(outcome)
    }

    /// Current balance, converted to `query.currency` when one is given.
    pub async fn balance(&self, query: BalanceQuery) -> ResultEngine<BalanceView> {
        ensure_user_id(query.user_id)?;
        let currency = query
            .currency
            .as_deref()
            .map(Currency::try_from)
            .transpose()?;

        let balance = self.stored_balance(query.user_id).await?;
        let Some(currency) = currency else {
            return Ok(BalanceView {
                user_id: query.user_id,
                balance,
                currency: Currency::base(),
            });
        };

        let rate = self.rates.resolve(&currency).await?;
        // `as` saturates on values outside the i64 range.
        let converted = (balance as f64 * rate).round() as i64;
        Ok(BalanceView {
            user_id: query.user_id,
            balance: converted,
            currency,
        })
    }

    /// Read-through lookup of the base currency balance.
    async fn stored_balance(&self, user_id: i64) -> ResultEngine<i64> {
        let key = CacheKey::Balance(user_id).to_string();
        match self.cache.get(&key).await {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(balance) => {
                    tracing::debug!("balance cache hit {key}");
                    return Ok(balance);
                }
                Err(_) => tracing::warn!("ignoring malformed cached balance {key}: {raw:?}"),
            },
            Err(CacheError::Miss) => tracing::debug!("balance cache miss {key}"),
            Err(err) => tracing::warn!("balance cache lookup for {key} failed: {err}"),
        }

        let balance = self.ledger.read_balance(user_id).await?;
        if let Err(err) = self
            .cache
            .set(&key, balance.to_string(), self.balance_ttl)
            .await
        {
            tracing::warn!("failed to cache {key}: {err}");
        }
        Ok(balance)
    }
}
