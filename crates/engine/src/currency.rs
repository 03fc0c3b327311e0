use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Code of the currency every stored amount is expressed in.
pub const BASE_CURRENCY: &str = "RUB";

/// ISO-4217-like currency code used for display conversion.
///
/// The ledger is mono-currency: balances are stored as an `i64` number of
/// **minor units** of [`BASE_CURRENCY`] (kopecks). Any other currency only
/// exists at read time, when a balance is multiplied by a resolved rate and
/// returned to the caller. Nothing converted is ever written back.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    #[must_use]
    pub fn base() -> Self {
        Self(BASE_CURRENCY.to_string())
    }

    /// Canonical (upper case) currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let code = value.trim().to_ascii_uppercase();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(EngineError::InvalidOperation(format!(
                "invalid currency code: {value:?}"
            )));
        }
        Ok(Self(code))
    }
}

impl TryFrom<String> for Currency {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}
