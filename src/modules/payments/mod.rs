pub mod controllers;
pub mod models;
pub mod services;

pub use models::{
    Allocation, AllocationResult, CallbackOutcome, CallbackStatus, ProviderCallback,
    SubmissionOutcome, SubmitPaymentRequest, TrancheOutstanding,
};
pub use services::{
    CallbackProvider, CallbackVerifier, ChargeOutcome, ChargeRequest, PaymentAllocator,
    PaymentProvider, PaymentService, PreAuthorizedProvider,
};
