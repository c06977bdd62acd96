pub mod account;
pub mod money;
pub mod period;
pub mod store;
pub mod transaction;

pub use account::{AccountId, BankAccount};
pub use money::Money;
pub use period::DateRange;
pub use store::{LedgerStore, StoreError};
pub use transaction::{
    Direction, LedgerTransaction, NormalizedRow, PendingTransaction, RowField, StatementRow,
    ValidationError,
};
