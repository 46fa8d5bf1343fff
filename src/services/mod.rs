pub mod availability_service;
pub mod booking_service;
pub mod payment_service;

pub use availability_service::AvailabilityLedger;
pub use booking_service::{
    BookingLifecycleService, CaptureOutcome, CompletionOutcome, CreateBookingRequest,
    RefundOutcome,
};
pub use payment_service::{CaptureResult, FailureResult, PaymentLedger, RefundResult};
