pub mod booking;
pub mod customer;
pub mod payment;
pub mod vehicle;

pub use booking::{rental_days, Booking, BookingStatus, PaymentState};
pub use customer::{Customer, Role};
pub use payment::{PaymentRecord, PaymentStatus};
pub use vehicle::{Vehicle, VehicleStatus};
