use crate::{
    EngineError, HistoryQuery, ResultEngine, Transaction,
    history::{HistoryOrder, paginate, sort_transactions},
};

use super::{Engine, ensure_user_id};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryPage {
    pub user_id: i64,
    pub transactions: Vec<Transaction>,
}

fn page_arg(value: i64, label: &str) -> ResultEngine<usize> {
    usize::try_from(value)
        .ok()
        .filter(|value| *value >= 1)
        .ok_or_else(|| EngineError::InvalidOperation(format!("{label} must be >= 1, got {value}")))
}

impl Engine {
    /// One page of the account's transactions. An unknown account has an
    /// empty history.
    pub async fn history(&self, query: HistoryQuery) -> ResultEngine<HistoryPage> {
        ensure_user_id(query.user_id)?;
        let page = page_arg(query.page, "page")?;
        let per_page = page_arg(query.per_page, "per_page")?;

        let mut transactions = self.ledger.read_transactions(query.user_id).await?;
        sort_transactions(
            &mut transactions,
            HistoryOrder::from_flags(query.change_sort, query.time_sort),
        );

        Ok(HistoryPage {
            user_id: query.user_id,
            transactions: paginate(&transactions, page, per_page).to_vec(),
        })
    }
}
