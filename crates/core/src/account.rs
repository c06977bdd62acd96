use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bank account owned by the business. Imported transactions always hang
/// off exactly one account; duplicate detection never crosses accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: Option<AccountId>,
    pub name: String,
    /// Last four digits of the external account number, display only.
    pub number_suffix: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl BankAccount {
    pub fn new(name: &str) -> Self {
        BankAccount {
            id: None,
            name: name.to_string(),
            number_suffix: None,
            created_at: None,
        }
    }
}
