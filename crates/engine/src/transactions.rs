//! Transaction primitives.
//!
//! A `Transaction` is an immutable, append-only record of one balance change.
//! It is created exactly once per mutating operation and never updated or
//! deleted. A transfer produces two of them (debit and credit) sharing the
//! same `change_time`.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub user_id: i64,
    /// Balance of the account immediately before `change` was applied.
    pub init_balance: i64,
    pub change: i64,
    pub change_time: DateTime<Utc>,
    /// Counterparty account id for transfer legs, free-text origin otherwise.
    pub source: String,
    pub comment: String,
}

impl Transaction {
    pub fn new(
        user_id: i64,
        init_balance: i64,
        change: i64,
        change_time: DateTime<Utc>,
        source: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            init_balance,
            change,
            change_time,
            source: source.into(),
            comment: comment.into(),
        }
    }

    /// Balance of the account right after this transaction.
    #[must_use]
    pub fn balance_after(&self) -> i64 {
        self.init_balance + self.change
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub init_balance: i64,
    pub change: i64,
    pub change_time: DateTimeUtc,
    pub source: String,
    pub comment: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::UserId",
        to = "super::accounts::Column::UserId",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(tx.user_id),
            init_balance: ActiveValue::Set(tx.init_balance),
            change: ActiveValue::Set(tx.change),
            change_time: ActiveValue::Set(tx.change_time),
            source: ActiveValue::Set(tx.source.clone()),
            comment: ActiveValue::Set(tx.comment.clone()),
        }
    }
}

impl From<Model> for Transaction {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            init_balance: model.init_balance,
            change: model.change,
            change_time: model.change_time,
            source: model.source,
            comment: model.comment,
        }
    }
}
