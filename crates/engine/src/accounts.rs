//! Account rows and the result of mutating them.

use sea_orm::{ActiveValue, entity::prelude::*};

/// Outcome of applying one balance change to an account.
///
/// Accounts are created implicitly by their first transaction, so the store
/// reports whether the change opened the account or updated an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountChange {
    Created { user_id: i64, balance: i64 },
    Updated { user_id: i64, previous: i64, balance: i64 },
}

impl AccountChange {
    #[must_use]
    pub fn user_id(&self) -> i64 {
        match self {
            Self::Created { user_id, .. } | Self::Updated { user_id, .. } => *user_id,
        }
    }

    /// Balance after the change.
    #[must_use]
    pub fn balance(&self) -> i64 {
        match self {
            Self::Created { balance, .. } | Self::Updated { balance, .. } => *balance,
        }
    }

    /// Balance before the change (0 for a newly opened account).
    #[must_use]
    pub fn previous(&self) -> i64 {
        match self {
            Self::Created { .. } => 0,
            Self::Updated { previous, .. } => *previous,
        }
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Both legs of a committed transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferOutcome {
    pub source: AccountChange,
    pub target: AccountChange,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    pub balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn opening(user_id: i64, balance: i64) -> Self {
        Self {
            user_id: ActiveValue::Set(user_id),
            balance: ActiveValue::Set(balance),
        }
    }
}
