use std::{sync::Arc, time::Duration};

use engine::{
    AccountChange, BalanceQuery, ChangeBalanceCmd, Engine, EngineError, HistoryQuery,
    TransferCmd,
    cache::{CacheGateway, MemoryCache},
    ledger::MemoryLedger,
    rates::StaticRates,
};

struct Harness {
    engine: Engine,
    ledger: Arc<MemoryLedger>,
    cache: Arc<MemoryCache>,
    rates: Arc<StaticRates>,
}

async fn harness_with_retries(retries: u32) -> Harness {
    let ledger = Arc::new(MemoryLedger::new());
    let cache = Arc::new(MemoryCache::new());
    let rates = Arc::new(StaticRates::new([("USD", 0.5), ("EUR", 0.25)]));
    let engine = Engine::builder()
        .ledger(ledger.clone())
        .cache(cache.clone())
        .rates(rates.clone())
        .max_conflict_retries(retries)
        .build()
        .await
        .unwrap();
    Harness {
        engine,
        ledger,
        cache,
        rates,
    }
}

async fn harness() -> Harness {
    harness_with_retries(3).await
}

async fn balance_of(engine: &Engine, user_id: i64) -> i64 {
    engine
        .balance(BalanceQuery::new(user_id))
        .await
        .unwrap()
        .balance
}

#[tokio::test]
async fn build_requires_every_collaborator() {
    let err = Engine::builder()
        .cache(Arc::new(MemoryCache::new()))
        .rates(Arc::new(StaticRates::new([("USD", 0.5)])))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}

#[tokio::test]
async fn end_to_end_scenario() {
    let h = harness().await;

    let created = h
        .engine
        .change_balance(ChangeBalanceCmd::new(0, 400).comment("salary"))
        .await
        .unwrap();
    assert_eq!(
        created,
        AccountChange::Created {
            user_id: 0,
            balance: 400
        }
    );

    let withdrawn = h
        .engine
        .change_balance(ChangeBalanceCmd::new(0, -200))
        .await
        .unwrap();
    assert_eq!(withdrawn.previous(), 400);
    assert_eq!(withdrawn.balance(), 200);

    let outcome = h
        .engine
        .transfer(TransferCmd::new(0, 1, 200).comment("rent"))
        .await
        .unwrap();
    assert_eq!(outcome.source.balance(), 0);
    assert_eq!(outcome.target.balance(), 200);
    assert!(outcome.target.is_created());

    let view = h.engine.balance(BalanceQuery::new(0)).await.unwrap();
    assert_eq!(view.user_id, 0);
    assert_eq!(view.balance, 0);
    assert_eq!(view.currency.code(), "RUB");

    let page = h.engine.history(HistoryQuery::new(1, 1, 1)).await.unwrap();
    assert_eq!(page.user_id, 1);
    assert_eq!(page.transactions.len(), 1);
    assert_eq!(page.transactions[0].change, 200);
    assert_eq!(page.transactions[0].source, "0");
    assert_eq!(page.transactions[0].init_balance, 0);
}

#[tokio::test]
async fn mutation_replaces_a_cached_balance() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(7, 100))
        .await
        .unwrap();

    assert_eq!(balance_of(&h.engine, 7).await, 100);
    assert_eq!(h.cache.peek("balance:7").as_deref(), Some("100"));

    h.engine
        .change_balance(ChangeBalanceCmd::new(7, 50))
        .await
        .unwrap();
    assert_eq!(h.cache.peek("balance:7"), None);
    assert_eq!(balance_of(&h.engine, 7).await, 150);
}

#[tokio::test]
async fn stale_entry_written_before_a_change_is_dropped() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(3, 10))
        .await
        .unwrap();
    h.cache
        .set("balance:3", "999".to_string(), Duration::from_secs(60))
        .await
        .unwrap();

    h.engine
        .change_balance(ChangeBalanceCmd::new(3, 5))
        .await
        .unwrap();
    assert_eq!(balance_of(&h.engine, 3).await, 15);
}

#[tokio::test]
async fn cache_hit_skips_the_ledger() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(2, 80))
        .await
        .unwrap();
    assert_eq!(balance_of(&h.engine, 2).await, 80);

    // Served from the cache while the store is down.
    h.ledger.set_offline(true);
    assert_eq!(balance_of(&h.engine, 2).await, 80);
    assert_eq!(h.cache.hits(), 1);
}

#[tokio::test]
async fn cache_outage_does_not_break_reads_or_writes() {
    let h = harness().await;
    h.cache.set_offline(true);

    h.engine
        .change_balance(ChangeBalanceCmd::new(4, 300))
        .await
        .unwrap();
    h.engine
        .transfer(TransferCmd::new(4, 5, 100))
        .await
        .unwrap();
    assert_eq!(balance_of(&h.engine, 4).await, 200);
    assert_eq!(balance_of(&h.engine, 5).await, 100);
}

#[tokio::test]
async fn conflicts_are_retried() {
    let h = harness().await;
    h.ledger.inject_conflicts(3);

    let change = h
        .engine
        .change_balance(ChangeBalanceCmd::new(1, 10))
        .await
        .unwrap();
    assert_eq!(change.balance(), 10);
    assert_eq!(h.ledger.transaction_count().await, 1);
}

#[tokio::test]
async fn conflicts_surface_once_retries_are_exhausted() {
    let h = harness_with_retries(1).await;
    h.ledger.inject_conflicts(2);

    let err = h
        .engine
        .change_balance(ChangeBalanceCmd::new(1, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    assert_eq!(h.ledger.transaction_count().await, 0);

    // The injected conflicts are used up.
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 10))
        .await
        .unwrap();
}

#[tokio::test]
async fn domain_errors_are_not_retried() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 10))
        .await
        .unwrap();

    let err = h
        .engine
        .change_balance(ChangeBalanceCmd::new(1, -11))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));
    assert_eq!(balance_of(&h.engine, 1).await, 10);
}

#[tokio::test]
async fn negative_transfer_is_rejected_without_side_effects() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(0, 100))
        .await
        .unwrap();

    let err = h
        .engine
        .transfer(TransferCmd::new(0, 1, -50))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
    assert_eq!(balance_of(&h.engine, 0).await, 100);
    assert_eq!(h.ledger.transaction_count().await, 1);
}

#[tokio::test]
async fn self_transfer_is_rejected() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(0, 100))
        .await
        .unwrap();
    let err = h
        .engine
        .transfer(TransferCmd::new(0, 0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}

#[tokio::test]
async fn transfer_from_unknown_account_fails() {
    let h = harness().await;
    let err = h
        .engine
        .transfer(TransferCmd::new(9, 1, 10))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AccountNotFound(9));
}

#[tokio::test]
async fn negative_ids_are_rejected() {
    let h = harness().await;
    assert!(matches!(
        h.engine
            .change_balance(ChangeBalanceCmd::new(-1, 10))
            .await,
        Err(EngineError::InvalidOperation(_))
    ));
    assert!(matches!(
        h.engine.balance(BalanceQuery::new(-1)).await,
        Err(EngineError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn balance_of_unknown_account_is_not_found() {
    let h = harness().await;
    assert_eq!(
        h.engine.balance(BalanceQuery::new(42)).await,
        Err(EngineError::AccountNotFound(42))
    );
}

#[tokio::test]
async fn balance_is_converted_and_rounded() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 3))
        .await
        .unwrap();

    let view = h
        .engine
        .balance(BalanceQuery::new(1).currency("usd"))
        .await
        .unwrap();
    assert_eq!(view.currency.code(), "USD");
    // 3 * 0.5 = 1.5 rounds away from zero.
    assert_eq!(view.balance, 2);

    h.engine
        .balance(BalanceQuery::new(1).currency("USD"))
        .await
        .unwrap();
    assert_eq!(h.rates.fetches(), 1);
}

#[tokio::test]
async fn base_currency_is_not_converted() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 1234))
        .await
        .unwrap();
    let view = h
        .engine
        .balance(BalanceQuery::new(1).currency("rub"))
        .await
        .unwrap();
    assert_eq!(view.balance, 1234);
    assert_eq!(h.rates.fetches(), 0);
}

#[tokio::test]
async fn invalid_currency_is_rejected_before_any_lookup() {
    let h = harness().await;
    let err = h
        .engine
        .balance(BalanceQuery::new(1).currency("DOLLAR"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));
}

#[tokio::test]
async fn unreachable_rate_source_fails_the_read() {
    let h = harness().await;
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 100))
        .await
        .unwrap();
    h.rates.set_offline(true);

    let err = h
        .engine
        .balance(BalanceQuery::new(1).currency("EUR"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RateUnavailable(_)));
}

#[tokio::test]
async fn store_outage_is_reported() {
    let h = harness().await;
    h.ledger.set_offline(true);
    let err = h
        .engine
        .change_balance(ChangeBalanceCmd::new(1, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Store(_)));
    assert!(!err.is_client_fault());
}

#[tokio::test]
async fn history_is_sorted_then_paginated() {
    let h = harness().await;
    for amount in [300, -200, 100, 50] {
        h.engine
            .change_balance(ChangeBalanceCmd::new(1, amount))
            .await
            .unwrap();
    }

    let changes = |page: engine::HistoryPage| {
        page.transactions
            .iter()
            .map(|tx| tx.change)
            .collect::<Vec<_>>()
    };

    let store_order = h.engine.history(HistoryQuery::new(1, 1, 10)).await.unwrap();
    assert_eq!(changes(store_order), [300, -200, 100, 50]);

    let by_change = h
        .engine
        .history(HistoryQuery::new(1, 1, 3).change_sort(true).time_sort(true))
        .await
        .unwrap();
    assert_eq!(changes(by_change), [50, 100, -200]);

    let clamped = h
        .engine
        .history(HistoryQuery::new(1, 999, 3).change_sort(true))
        .await
        .unwrap();
    assert_eq!(changes(clamped), [300]);
}

#[tokio::test]
async fn history_rejects_empty_pages() {
    let h = harness().await;
    for query in [HistoryQuery::new(1, 0, 3), HistoryQuery::new(1, 1, 0)] {
        assert!(matches!(
            h.engine.history(query).await,
            Err(EngineError::InvalidOperation(_))
        ));
    }
}

#[tokio::test]
async fn unknown_account_has_empty_history() {
    let h = harness().await;
    let page = h.engine.history(HistoryQuery::new(5, 1, 3)).await.unwrap();
    assert!(page.transactions.is_empty());
}

#[tokio::test]
async fn concurrent_withdrawals_never_overdraw() {
    let h = Arc::new(harness().await);
    h.engine
        .change_balance(ChangeBalanceCmd::new(1, 100))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            h.engine
                .change_balance(ChangeBalanceCmd::new(1, -30))
                .await
                .is_ok()
        }));
    }
    let mut succeeded = 0;
    for task in tasks {
        if task.await.unwrap() {
            succeeded += 1;
        }
    }

    assert_eq!(succeeded, 3);
    assert_eq!(balance_of(&h.engine, 1).await, 10);
}
