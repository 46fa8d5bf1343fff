use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a customer account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Vendor,
    Admin,
}

impl Role {
    /// Vendors and admins operate bookings (driver assignment, trip control).
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Vendor | Role::Admin)
    }
}

/// A customer account with aggregate booking statistics.
///
/// The stats are mutated exactly once per booking reaching completion, by the
/// lifecycle service. Payment events never touch them, so a retried webhook
/// can never double-count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub total_bookings: i64,
    pub total_spent: Decimal,
    pub last_booking_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: String, email: String, phone: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            role,
            total_bookings: 0,
            total_spent: Decimal::ZERO,
            last_booking_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the one-time stat update for a completed booking.
    pub fn record_completed_booking(&mut self, amount: Decimal) {
        self.total_bookings += 1;
        self.total_spent += amount;
        let now = Utc::now();
        self.last_booking_date = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_record_completed_booking() {
        let mut c = Customer::new(
            "Asha".to_string(),
            "asha@example.com".to_string(),
            "+91-9000000000".to_string(),
            Role::User,
        );
        c.record_completed_booking(dec!(7500));
        c.record_completed_booking(dec!(2500));
        assert_eq!(c.total_bookings, 2);
        assert_eq!(c.total_spent, dec!(10000));
        assert!(c.last_booking_date.is_some());
    }

    #[test]
    fn test_staff_roles() {
        assert!(!Role::User.is_staff());
        assert!(Role::Vendor.is_staff());
        assert!(Role::Admin.is_staff());
    }
}
