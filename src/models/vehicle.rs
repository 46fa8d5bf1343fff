use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Availability of a rentable vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleStatus {
    Available,
    Rented,
    Maintenance,
    Inactive,
}

impl VehicleStatus {
    /// Returns true if a new booking may take a hold on the vehicle.
    pub fn is_bookable(&self) -> bool {
        matches!(self, VehicleStatus::Available)
    }
}

/// A rentable unit with an availability flag.
///
/// `status` and `held_by` are mutated exclusively by the lifecycle service as
/// a side effect of booking transitions, never by direct client request while
/// a booking holds the vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub registration_no: String,
    pub price_per_day: Decimal,
    pub status: VehicleStatus,
    /// Booking currently holding the vehicle, if any.
    pub held_by: Option<Uuid>,
    pub location: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(
        name: String,
        registration_no: String,
        price_per_day: Decimal,
        location: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            registration_no,
            price_per_day,
            status: VehicleStatus::Available,
            held_by: None,
            location,
            created_at: now,
            updated_at: now,
        }
    }
}
