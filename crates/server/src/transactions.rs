//! Transactions API endpoints

use api_types::transaction::{TransactionList, TransactionListResponse, TransactionView};
use axum::{
    Json,
    extract::{Path, State},
};
use engine::HistoryQuery;

use crate::{ServerError, server::ServerState};

pub async fn list(
    Path(user_id): Path<i64>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let query = HistoryQuery::new(user_id, payload.page, payload.per_page)
        .change_sort(payload.change_sort)
        .time_sort(payload.time_sort);
    let page = state.engine.history(query).await?;

    let transactions = page
        .transactions
        .into_iter()
        .map(|tx| TransactionView {
            init_balance: tx.init_balance,
            change: tx.change,
            change_time: tx.change_time,
            source: tx.source,
            comment: tx.comment,
        })
        .collect();

    Ok(Json(TransactionListResponse {
        user_id: page.user_id,
        transactions,
    }))
}
