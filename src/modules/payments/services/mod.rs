pub mod callback_signature;
pub mod payment_allocator;
pub mod payment_service;
pub mod provider;

pub use callback_signature::CallbackVerifier;
pub use payment_allocator::PaymentAllocator;
pub use payment_service::PaymentService;
pub use provider::{
    CallbackProvider, ChargeOutcome, ChargeRequest, PaymentProvider, PreAuthorizedProvider,
};
