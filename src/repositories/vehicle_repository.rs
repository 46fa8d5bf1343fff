use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Vehicle, VehicleStatus};

/// Repository for Vehicle records.
///
/// `try_hold` and `release` are the only mutation paths for the availability
/// flag and must be atomic: the check and the write happen under one guard so
/// an observer can never see a vehicle `Rented` without a holding booking or
/// two bookings winning the same hold.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>>;
    async fn update(&self, vehicle: Vehicle) -> Result<Vehicle>;
    /// Compare-and-set hold: fails with `VehicleUnavailable` unless the
    /// vehicle is currently `Available`.
    async fn try_hold(&self, vehicle_id: Uuid, booking_id: Uuid) -> Result<Vehicle>;
    /// Unconditionally returns the vehicle to `Available`. Idempotent:
    /// releasing an already-available vehicle is a no-op.
    async fn release(&self, vehicle_id: Uuid) -> Result<Vehicle>;
}

/// In-memory vehicle store.
#[derive(Default)]
pub struct InMemoryVehicleRepository {
    records: RwLock<HashMap<Uuid, Vehicle>>,
}

impl InMemoryVehicleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, vehicle: Vehicle) -> Result<Vehicle> {
        let mut records = self.records.write().await;
        records.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Vehicle>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn update(&self, vehicle: Vehicle) -> Result<Vehicle> {
        let mut records = self.records.write().await;
        if !records.contains_key(&vehicle.id) {
            return Err(AppError::NotFound(format!(
                "vehicle '{}' not found",
                vehicle.id
            )));
        }
        records.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn try_hold(&self, vehicle_id: Uuid, booking_id: Uuid) -> Result<Vehicle> {
        let mut records = self.records.write().await;
        let vehicle = records
            .get_mut(&vehicle_id)
            .ok_or_else(|| AppError::NotFound(format!("vehicle '{}' not found", vehicle_id)))?;
        if !vehicle.status.is_bookable() {
            return Err(AppError::VehicleUnavailable(vehicle_id));
        }
        vehicle.status = VehicleStatus::Rented;
        vehicle.held_by = Some(booking_id);
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn release(&self, vehicle_id: Uuid) -> Result<Vehicle> {
        let mut records = self.records.write().await;
        let vehicle = records
            .get_mut(&vehicle_id)
            .ok_or_else(|| AppError::NotFound(format!("vehicle '{}' not found", vehicle_id)))?;
        if vehicle.status != VehicleStatus::Available {
            vehicle.status = VehicleStatus::Available;
            vehicle.held_by = None;
            vehicle.updated_at = Utc::now();
        }
        Ok(vehicle.clone())
    }
}
