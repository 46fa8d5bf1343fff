use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Lifecycle status of a booking.
///
/// Transitions between statuses are governed exclusively by the state graph;
/// nothing else may move a booking between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Reservation accepted, payment not yet requested.
    Draft,
    /// A gateway order is open; waiting for capture confirmation.
    PendingPayment,
    /// Payment captured and verified.
    Confirmed,
    /// A driver has been assigned to the booking.
    Assigned,
    /// Trip in progress.
    Ongoing,
    /// Trip finished; vehicle released, customer stats recorded.
    Completed,
    /// Booking cancelled before completion; vehicle released.
    Cancelled,
    /// Captured funds returned. Terminal.
    Refunded,
}

impl BookingStatus {
    /// All statuses, in lifecycle order. Used to enumerate transition pairs.
    pub const ALL: [BookingStatus; 8] = [
        BookingStatus::Draft,
        BookingStatus::PendingPayment,
        BookingStatus::Confirmed,
        BookingStatus::Assigned,
        BookingStatus::Ongoing,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
        BookingStatus::Refunded,
    ];

    /// Returns true while the booking keeps its vehicle held.
    ///
    /// The hold is taken at creation and kept through the whole active span,
    /// so a vehicle can never be double-booked during the payment window.
    pub fn holds_vehicle(&self) -> bool {
        matches!(
            self,
            BookingStatus::Draft
                | BookingStatus::PendingPayment
                | BookingStatus::Confirmed
                | BookingStatus::Assigned
                | BookingStatus::Ongoing
        )
    }

    /// Returns true once the booking has reached an end-of-life status.
    pub fn has_ended(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::Refunded
        )
    }

    /// Maps a status string from the pre-state-machine data model.
    pub fn from_legacy(legacy: &str) -> BookingStatus {
        match legacy {
            "Pending" => BookingStatus::PendingPayment,
            "Confirmed" => BookingStatus::Confirmed,
            "Active" => BookingStatus::Ongoing,
            "Completed" => BookingStatus::Completed,
            "Cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Draft,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Draft => "Draft",
            BookingStatus::PendingPayment => "Pending Payment",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Assigned => "Driver Assigned",
            BookingStatus::Ongoing => "Trip in Progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Refunded => "Refunded",
        };
        f.write_str(label)
    }
}

/// Denormalized payment snapshot carried on the booking for fast reads.
/// The authoritative record is the payment ledger; the lifecycle service is
/// solely responsible for keeping this field consistent with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    Unpaid,
    PartiallyPaid,
    Paid,
    Refunded,
}

/// A single reservation of a vehicle for a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    /// Human-readable booking code, monotonically issued (`BKG-2026-00042`).
    pub code: String,
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: DateTime<Utc>,
    pub pickup_location: String,
    pub dropoff_location: String,
    /// Whole rental days, ceiling of the window, never less than 1.
    pub duration_days: i64,
    pub total_amount: Decimal,
    pub payment_state: PaymentState,
    pub status: BookingStatus,
    pub services: Vec<String>,
    pub assigned_driver_id: Option<Uuid>,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whole rental days for a window: ceiling of elapsed time over 24h,
/// minimum one day. Callers must have validated `dropoff > pickup`.
pub fn rental_days(pickup: DateTime<Utc>, dropoff: DateTime<Utc>) -> i64 {
    let secs = (dropoff - pickup).num_seconds();
    let days = (secs + 86_399) / 86_400;
    days.max(1)
}

impl Booking {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: String,
        customer_id: Uuid,
        vehicle_id: Uuid,
        pickup_time: DateTime<Utc>,
        dropoff_time: DateTime<Utc>,
        pickup_location: String,
        dropoff_location: String,
        price_per_day: Decimal,
        services: Vec<String>,
    ) -> Self {
        let duration_days = rental_days(pickup_time, dropoff_time);
        let total_amount = Decimal::from(duration_days) * price_per_day;
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code,
            customer_id,
            vehicle_id,
            pickup_time,
            dropoff_time,
            pickup_location,
            dropoff_location,
            duration_days,
            total_amount,
            payment_state: PaymentState::Unpaid,
            status: BookingStatus::Draft,
            services,
            assigned_driver_id: None,
            actual_start_time: None,
            actual_end_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable duration, mirroring the booking code in customer views.
    pub fn duration_label(&self) -> String {
        if self.duration_days == 1 {
            "1 day".to_string()
        } else {
            format!("{} days", self.duration_days)
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn window(hours: i64) -> (DateTime<Utc>, DateTime<Utc>) {
        let pickup = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        (pickup, pickup + chrono::Duration::hours(hours))
    }

    #[test]
    fn test_rental_days_exact_days() {
        let (pickup, dropoff) = window(72);
        assert_eq!(rental_days(pickup, dropoff), 3);
    }

    #[test]
    fn test_rental_days_rounds_up() {
        let (pickup, dropoff) = window(60);
        assert_eq!(rental_days(pickup, dropoff), 3);
    }

    #[test]
    fn test_rental_days_minimum_one() {
        let (pickup, dropoff) = window(4);
        assert_eq!(rental_days(pickup, dropoff), 1);
    }

    #[test]
    fn test_new_booking_pricing() {
        let (pickup, dropoff) = window(72);
        let booking = Booking::new(
            "BKG-2026-00001".to_string(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            pickup,
            dropoff,
            "Airport".to_string(),
            "Downtown".to_string(),
            dec!(2500),
            vec![],
        );
        assert_eq!(booking.duration_days, 3);
        assert_eq!(booking.total_amount, dec!(7500));
        assert_eq!(booking.status, BookingStatus::Draft);
        assert_eq!(booking.payment_state, PaymentState::Unpaid);
        assert_eq!(booking.duration_label(), "3 days");
    }

    #[test]
    fn test_holds_vehicle_span() {
        assert!(BookingStatus::Draft.holds_vehicle());
        assert!(BookingStatus::PendingPayment.holds_vehicle());
        assert!(BookingStatus::Ongoing.holds_vehicle());
        assert!(!BookingStatus::Completed.holds_vehicle());
        assert!(!BookingStatus::Cancelled.holds_vehicle());
        assert!(!BookingStatus::Refunded.holds_vehicle());
    }

    #[test]
    fn test_legacy_status_mapping() {
        assert_eq!(
            BookingStatus::from_legacy("Pending"),
            BookingStatus::PendingPayment
        );
        assert_eq!(
            BookingStatus::from_legacy("Active"),
            BookingStatus::Ongoing
        );
        assert_eq!(BookingStatus::from_legacy("garbage"), BookingStatus::Draft);
    }

    #[test]
    fn test_status_serde_wire_form() {
        let json = serde_json::to_string(&BookingStatus::PendingPayment).unwrap();
        assert_eq!(json, "\"pending_payment\"");
        let back: BookingStatus = serde_json::from_str("\"ongoing\"").unwrap();
        assert_eq!(back, BookingStatus::Ongoing);
    }
}
