pub use accounts::{AccountChange, TransferOutcome};
pub use commands::{BalanceQuery, ChangeBalanceCmd, HistoryQuery, TransferCmd};
pub use currency::{BASE_CURRENCY, Currency};
pub use error::EngineError;
pub use ops::{
    BalanceView, DEFAULT_BALANCE_TTL, DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_RATE_TTL, Engine,
    EngineBuilder, HistoryPage,
};
pub use transactions::Transaction;

pub mod cache;
pub mod history;
pub mod ledger;
pub mod rates;

mod accounts;
mod commands;
mod currency;
mod error;
mod ops;
mod transactions;

pub type ResultEngine<T> = Result<T, EngineError>;
