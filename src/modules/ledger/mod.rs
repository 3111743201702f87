pub mod models;
pub mod repositories;

pub use models::{
    AllocationTarget, Payment, PaymentMethod, PaymentResolution, PaymentStatus, Receipt,
    ReceiptLine, TrancheAllocation,
};
pub use repositories::{AppendOutcome, InMemoryLedger, MySqlLedger, TransactionLedger};
