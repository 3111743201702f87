pub mod allocation;
pub mod submission;

pub use allocation::{Allocation, TrancheOutstanding};
pub use submission::{
    AllocationResult, CallbackOutcome, CallbackStatus, ProviderCallback, SubmissionOutcome,
    SubmitPaymentRequest,
};
