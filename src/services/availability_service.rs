use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Vehicle;
use crate::repositories::VehicleRepository;

/// Tracks whether a vehicle is bookable.
///
/// Only the booking lifecycle service calls into this ledger, and only as a
/// side effect of a validated status transition, so the availability flag
/// can never drift from the set of active bookings.
pub struct AvailabilityLedger {
    vehicles: Arc<dyn VehicleRepository>,
}

impl AvailabilityLedger {
    pub fn new(vehicles: Arc<dyn VehicleRepository>) -> Self {
        Self { vehicles }
    }

    /// Takes the hold for a booking. Fails with `VehicleUnavailable` unless
    /// the vehicle is currently `Available`; the check-and-set is atomic in
    /// the repository.
    pub async fn hold(&self, vehicle_id: Uuid, booking_id: Uuid) -> Result<Vehicle> {
        let vehicle = self.vehicles.try_hold(vehicle_id, booking_id).await?;
        debug!(%vehicle_id, %booking_id, "vehicle held");
        Ok(vehicle)
    }

    /// Returns the vehicle to `Available`. Idempotent: releasing an
    /// already-available vehicle is a no-op, not an error.
    pub async fn release(&self, vehicle_id: Uuid) -> Result<Vehicle> {
        let vehicle = self.vehicles.release(vehicle_id).await?;
        debug!(%vehicle_id, "vehicle released");
        Ok(vehicle)
    }

    pub async fn is_available(&self, vehicle_id: Uuid) -> Result<bool> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("vehicle '{}' not found", vehicle_id)))?;
        Ok(vehicle.status.is_bookable())
    }
}
