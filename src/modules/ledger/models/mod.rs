pub mod payment;
pub mod receipt;

pub use payment::{
    AllocationTarget, Payment, PaymentMethod, PaymentResolution, PaymentStatus, TrancheAllocation,
};
pub use receipt::{Receipt, ReceiptLine};
