use uuid::Uuid;

use crate::models::BookingStatus;

/// Application error taxonomy.
///
/// Every operation returns one of these as a structured result; nothing is
/// retried or swallowed inside the engine. Idempotent re-deliveries are not
/// errors and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested status change is not an edge of the state graph. Carries
    /// the full allowed set so callers can self-correct without guessing.
    #[error("cannot transition from '{}' to '{}' (allowed: {})", .from, .to, format_allowed(.allowed))]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
        allowed: Vec<BookingStatus>,
    },

    #[error("vehicle '{0}' is not available for booking")]
    VehicleUnavailable(Uuid),

    #[error("an open payment already exists for booking '{0}'")]
    PaymentAlreadyOpen(Uuid),

    #[error("payment '{0}' has already been refunded")]
    PaymentAlreadyRefunded(String),

    /// Signature or proof verification failed. Must never be accompanied by
    /// any ledger mutation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The external gateway could not be reached or is unconfigured.
    /// Operational, not a security failure.
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for logs and API mappings.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::VehicleUnavailable(_) => "VEHICLE_UNAVAILABLE",
            AppError::PaymentAlreadyOpen(_) => "PAYMENT_ALREADY_OPEN",
            AppError::PaymentAlreadyRefunded(_) => "PAYMENT_ALREADY_REFUNDED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::GatewayUnavailable(_) => "GATEWAY_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

fn format_allowed(allowed: &[BookingStatus]) -> String {
    if allowed.is_empty() {
        return "none".to_string();
    }
    allowed
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, AppError>;
