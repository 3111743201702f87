pub mod clock;
pub mod currency;
pub mod error;
pub mod locks;

pub use clock::SchoolClock;
pub use currency::{Currency, MinorUnits};
pub use error::{AllocationError, AppError, Result};
pub use locks::EnrollmentLocks;
