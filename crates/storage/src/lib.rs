pub mod db;
pub mod mem;

pub use db::{create_account, create_db, create_db_in_memory, get_account, DbPool, SqliteLedger};
pub use mem::MemoryLedger;
