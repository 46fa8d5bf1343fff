use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::Booking;

/// Repository for Booking records.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: Booking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>>;
    /// Replaces the stored record. Fails with `NotFound` for unknown ids.
    async fn update(&self, booking: Booking) -> Result<Booking>;
    /// Bookings on a vehicle that still hold it (non-ended statuses).
    async fn find_holding_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Booking>>;
    /// Next value of the monotonic booking-code sequence.
    async fn next_sequence(&self) -> Result<u64>;
}

/// In-memory booking store.
#[derive(Default)]
pub struct InMemoryBookingRepository {
    records: RwLock<HashMap<Uuid, Booking>>,
    sequence: AtomicU64,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, booking: Booking) -> Result<Booking> {
        let mut records = self.records.write().await;
        records.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Booking>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .find(|b| b.code == code)
            .cloned())
    }

    async fn update(&self, booking: Booking) -> Result<Booking> {
        let mut records = self.records.write().await;
        if !records.contains_key(&booking.id) {
            return Err(AppError::NotFound(format!(
                "booking '{}' not found",
                booking.id
            )));
        }
        records.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn find_holding_vehicle(&self, vehicle_id: Uuid) -> Result<Vec<Booking>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .filter(|b| b.vehicle_id == vehicle_id && b.status.holds_vehicle())
            .cloned()
            .collect())
    }

    async fn next_sequence(&self) -> Result<u64> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
