pub mod memory_ledger;
pub mod mysql_ledger;
pub mod transaction_ledger;

pub use memory_ledger::InMemoryLedger;
pub use mysql_ledger::MySqlLedger;
pub use transaction_ledger::{AppendOutcome, TransactionLedger};
