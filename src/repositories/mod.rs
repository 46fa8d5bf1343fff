//! Storage abstraction for the engine's three durable aggregates plus the
//! customer accounts. Persistence technology is a deployment concern; the
//! in-memory implementations here are the reference stores and what the
//! test suite runs against.

pub mod booking_repository;
pub mod customer_repository;
pub mod payment_repository;
pub mod vehicle_repository;

pub use booking_repository::{BookingRepository, InMemoryBookingRepository};
pub use customer_repository::{CustomerRepository, InMemoryCustomerRepository};
pub use payment_repository::{InMemoryPaymentRepository, PaymentRepository};
pub use vehicle_repository::{InMemoryVehicleRepository, VehicleRepository};
