//! Balance API endpoints

use api_types::balance::{
    Balance, BalanceGet, BalanceView, ChangeBalance, Transfer, TransferResult,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use engine::{AccountChange, BalanceQuery, ChangeBalanceCmd, TransferCmd};

use crate::{ServerError, server::ServerState};

fn to_balance(change: AccountChange) -> Balance {
    Balance {
        user_id: change.user_id(),
        balance: change.balance(),
    }
}

pub async fn change(
    Path(user_id): Path<i64>,
    State(state): State<ServerState>,
    Json(payload): Json<ChangeBalance>,
) -> Result<Json<Balance>, ServerError> {
    let change = state
        .engine
        .change_balance(
            ChangeBalanceCmd::new(user_id, payload.change)
                .comment(payload.comment)
                .source(payload.source),
        )
        .await?;
    if change.is_created() {
        tracing::info!("opened account {user_id}");
    }
    Ok(Json(to_balance(change)))
}

pub async fn transfer(
    Path(user_id): Path<i64>,
    State(state): State<ServerState>,
    Json(payload): Json<Transfer>,
) -> Result<Json<TransferResult>, ServerError> {
    let outcome = state
        .engine
        .transfer(
            TransferCmd::new(user_id, payload.target_id, payload.change).comment(payload.comment),
        )
        .await?;
    Ok(Json(TransferResult {
        source: to_balance(outcome.source),
        target: to_balance(outcome.target),
    }))
}

pub async fn get(
    Path(user_id): Path<i64>,
    State(state): State<ServerState>,
    Query(params): Query<BalanceGet>,
) -> Result<Json<BalanceView>, ServerError> {
    let mut query = BalanceQuery::new(user_id);
    // `?currency=` with no value means no conversion.
    if let Some(currency) = params.currency.filter(|code| !code.trim().is_empty()) {
        query = query.currency(currency);
    }
    let view = state.engine.balance(query).await?;
    Ok(Json(BalanceView {
        user_id: view.user_id,
        balance: view.balance,
        currency: view.currency.into(),
    }))
}
