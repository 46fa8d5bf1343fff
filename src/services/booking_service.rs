use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::gateway::ReconciliationGateway;
use crate::models::{Booking, BookingStatus, PaymentRecord, PaymentState, Role};
use crate::observability::EngineMetrics;
use crate::repositories::{
    BookingRepository, CustomerRepository, PaymentRepository, VehicleRepository,
};
use crate::services::availability_service::AvailabilityLedger;
use crate::services::payment_service::{CaptureResult, FailureResult, PaymentLedger};
use crate::state_graph::StateGraph;

/// Request to create a booking.
#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub customer_id: Uuid,
    pub vehicle_id: Uuid,
    pub pickup_time: DateTime<Utc>,
    pub dropoff_time: DateTime<Utc>,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub services: Vec<String>,
}

/// Outcome of a capture-driven confirmation.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub booking: Booking,
    pub payment: PaymentRecord,
    /// False when the capture was a duplicate delivery and no side effect ran.
    pub newly_captured: bool,
}

/// Outcome of a refund.
#[derive(Debug, Clone)]
pub struct RefundOutcome {
    pub booking: Booking,
    pub payment: PaymentRecord,
    pub newly_refunded: bool,
}

/// Outcome of completing a trip.
#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub booking: Booking,
    /// False when the booking was already completed and nothing ran again.
    pub newly_completed: bool,
}

/// Per-booking mutual exclusion.
///
/// Concurrent transition attempts on the same booking identity serialize on
/// one async mutex; different bookings proceed fully in parallel. Guards are
/// owned so they can be held across awaits inside an operation.
#[derive(Default)]
struct BookingLocks {
    registry: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl BookingLocks {
    async fn acquire(&self, booking_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut registry = self.registry.lock().await;
            registry.entry(booking_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Orchestrates the booking lifecycle.
///
/// Every public operation validates the requested edge against the state
/// graph, applies the side effects belonging to the target status exactly
/// once, and writes booking, payment, and vehicle changes as one logical
/// unit under the per-booking lock.
pub struct BookingLifecycleService {
    bookings: Arc<dyn BookingRepository>,
    customers: Arc<dyn CustomerRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    availability: AvailabilityLedger,
    ledger: PaymentLedger,
    locks: BookingLocks,
    metrics: Arc<EngineMetrics>,
}

impl BookingLifecycleService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        payments: Arc<dyn PaymentRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        customers: Arc<dyn CustomerRepository>,
        gateway: Arc<dyn ReconciliationGateway>,
        currency: String,
    ) -> Self {
        let metrics = Arc::new(EngineMetrics::new());
        Self {
            bookings,
            customers,
            vehicles: vehicles.clone(),
            availability: AvailabilityLedger::new(vehicles),
            ledger: PaymentLedger::new(payments, gateway, currency, metrics.clone()),
            locks: BookingLocks::default(),
            metrics,
        }
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    /// Creates a booking in `draft` and takes the vehicle hold immediately,
    /// so the vehicle cannot be double-booked during the payment window.
    pub async fn create_booking(&self, request: CreateBookingRequest) -> Result<Booking> {
        if request.dropoff_time <= request.pickup_time {
            return Err(AppError::Validation(
                "dropoff must be after pickup".to_string(),
            ));
        }

        let customer = self
            .customers
            .find_by_id(request.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("customer '{}' not found", request.customer_id))
            })?;

        let vehicle = self
            .vehicles
            .find_by_id(request.vehicle_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("vehicle '{}' not found", request.vehicle_id))
            })?;
        if !vehicle.status.is_bookable() {
            return Err(AppError::VehicleUnavailable(vehicle.id));
        }

        let sequence = self.bookings.next_sequence().await?;
        let code = format!("BKG-{}-{:05}", Utc::now().year(), sequence);
        let booking = Booking::new(
            code,
            customer.id,
            vehicle.id,
            request.pickup_time,
            request.dropoff_time,
            request.pickup_location,
            request.dropoff_location,
            vehicle.price_per_day,
            request.services,
        );

        // The hold is the authoritative gate; the bookable check above only
        // gives a friendlier error under no contention.
        self.availability.hold(vehicle.id, booking.id).await?;
        let booking = match self.bookings.create(booking).await {
            Ok(booking) => booking,
            Err(e) => {
                self.availability.release(vehicle.id).await?;
                return Err(e);
            }
        };

        info!(code = %booking.code, vehicle = %vehicle.registration_no, amount = %booking.total_amount, "booking created");
        Ok(booking)
    }

    /// Opens a gateway order and moves the booking into `pending_payment`.
    pub async fn open_payment(
        &self,
        booking_id: Uuid,
        payer_id: Uuid,
    ) -> Result<(Booking, PaymentRecord)> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load_booking(booking_id).await?;

        match booking.status {
            BookingStatus::Draft | BookingStatus::PendingPayment => {}
            other => {
                self.metrics.record_transition_rejected();
                return Err(AppError::InvalidTransition {
                    from: other,
                    to: BookingStatus::PendingPayment,
                    allowed: StateGraph::allowed(other).to_vec(),
                });
            }
        }

        let payment = self.ledger.open_order(&booking, payer_id).await?;

        let booking = if booking.status == BookingStatus::Draft {
            self.apply_transition(booking, BookingStatus::PendingPayment)
                .await?
        } else {
            booking
        };

        Ok((booking, payment))
    }

    /// Client-side payment verification. Safe to call twice with the same
    /// proof: the second call observes the already-captured payment and the
    /// already-confirmed booking and performs no duplicate side effect.
    pub async fn confirm_payment(
        &self,
        booking_id: Uuid,
        order_id: &str,
        gateway_payment_id: &str,
        signature: &str,
    ) -> Result<CaptureOutcome> {
        let _guard = self.locks.acquire(booking_id).await;

        let payment = self
            .ledger
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for order '{}'", order_id)))?;
        if payment.booking_id != booking_id {
            return Err(AppError::Validation(format!(
                "order '{}' does not belong to booking '{}'",
                order_id, booking_id
            )));
        }

        // Proof verification happens inside the ledger, before any mutation.
        let capture = self
            .ledger
            .verify_and_capture(order_id, gateway_payment_id, signature)
            .await?;
        self.finish_capture(capture).await
    }

    /// Webhook-driven capture. Races freely with `confirm_payment`; the
    /// ledger's idempotent capture resolves whichever arrives second.
    pub async fn handle_capture_event(
        &self,
        order_id: &str,
        gateway_payment_id: &str,
        method: Option<String>,
    ) -> Result<CaptureOutcome> {
        let payment = self
            .ledger
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for order '{}'", order_id)))?;

        let _guard = self.locks.acquire(payment.booking_id).await;
        let capture = self
            .ledger
            .apply_capture(order_id, gateway_payment_id, method)
            .await?;
        self.finish_capture(capture).await
    }

    /// Webhook-driven failure. The booking stays in `pending_payment`; an
    /// external reconciliation sweep decides whether to cancel it.
    pub async fn handle_failure_event(&self, order_id: &str) -> Result<FailureResult> {
        let payment = self
            .ledger
            .find_by_order_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no payment for order '{}'", order_id)))?;

        let _guard = self.locks.acquire(payment.booking_id).await;
        self.ledger.apply_failure(order_id).await
    }

    /// Webhook-driven refund. The ledger records the refund first; the
    /// booking transitions to `refunded` only when the graph allows it,
    /// otherwise only the payment snapshot flips.
    pub async fn handle_refund_event(
        &self,
        gateway_payment_id: &str,
        refund_id: &str,
        amount: Decimal,
    ) -> Result<RefundOutcome> {
        let payment = self
            .ledger
            .find_by_gateway_payment_id(gateway_payment_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no payment '{}' found", gateway_payment_id))
            })?;

        let _guard = self.locks.acquire(payment.booking_id).await;
        let refund = self
            .ledger
            .apply_refund(gateway_payment_id, refund_id, amount)
            .await?;

        let mut booking = self.load_booking(refund.payment.booking_id).await?;
        if refund.newly_refunded {
            if StateGraph::can_transition(booking.status, BookingStatus::Refunded) {
                booking = self
                    .apply_transition(booking, BookingStatus::Refunded)
                    .await?;
            } else {
                warn!(
                    code = %booking.code,
                    status = %booking.status,
                    "refund recorded without a status transition"
                );
                booking.payment_state = PaymentState::Refunded;
                booking.touch();
                booking = self.bookings.update(booking).await?;
            }
        }

        Ok(RefundOutcome {
            booking,
            payment: refund.payment,
            newly_refunded: refund.newly_refunded,
        })
    }

    /// Assigns a staff driver to a confirmed booking.
    pub async fn assign_driver(&self, booking_id: Uuid, driver_id: Uuid) -> Result<Booking> {
        let _guard = self.locks.acquire(booking_id).await;
        let mut booking = self.load_booking(booking_id).await?;

        self.validate_edge(booking.status, BookingStatus::Assigned)?;

        let driver = self
            .customers
            .find_by_id(driver_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("driver '{}' not found", driver_id)))?;
        if !driver.role.is_staff() {
            return Err(AppError::Validation(
                "driver must be a vendor or admin account".to_string(),
            ));
        }

        booking.assigned_driver_id = Some(driver.id);
        self.apply_transition(booking, BookingStatus::Assigned).await
    }

    /// Starts the trip and stamps the actual start time.
    pub async fn start_trip(&self, booking_id: Uuid) -> Result<Booking> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load_booking(booking_id).await?;
        self.apply_transition(booking, BookingStatus::Ongoing).await
    }

    /// Completes the trip: stamps the end time, releases the vehicle, and
    /// updates customer statistics exactly once. Re-entry on an
    /// already-completed booking is a no-op, not a repeated increment.
    pub async fn complete_trip(&self, booking_id: Uuid) -> Result<CompletionOutcome> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load_booking(booking_id).await?;

        if booking.status == BookingStatus::Completed {
            return Ok(CompletionOutcome {
                booking,
                newly_completed: false,
            });
        }

        let booking = self
            .apply_transition(booking, BookingStatus::Completed)
            .await?;
        Ok(CompletionOutcome {
            booking,
            newly_completed: true,
        })
    }

    /// Cancels a booking. The authorization check precedes the state check;
    /// the vehicle hold is released if one exists.
    pub async fn cancel_booking(&self, booking_id: Uuid, requester_id: Uuid) -> Result<Booking> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load_booking(booking_id).await?;

        let requester = self
            .customers
            .find_by_id(requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer '{}' not found", requester_id)))?;
        if requester.id != booking.customer_id && requester.role != Role::Admin {
            return Err(AppError::Forbidden(
                "not authorized to cancel this booking".to_string(),
            ));
        }

        self.apply_transition(booking, BookingStatus::Cancelled).await
    }

    /// Refunds a completed or cancelled booking through the gateway.
    pub async fn refund_booking(
        &self,
        booking_id: Uuid,
        amount: Option<Decimal>,
    ) -> Result<RefundOutcome> {
        let _guard = self.locks.acquire(booking_id).await;
        let booking = self.load_booking(booking_id).await?;

        // Fail before touching the gateway if the edge is invalid.
        self.validate_edge(booking.status, BookingStatus::Refunded)?;

        let payment = self
            .ledger
            .payment_for_booking(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no payment found for booking '{}'", booking_id))
            })?;
        let gateway_payment_id = payment.gateway_payment_id.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "payment for booking '{}' was never captured",
                booking_id
            ))
        })?;

        let refund = self
            .ledger
            .initiate_refund(&gateway_payment_id, amount)
            .await?;
        let booking = self
            .apply_transition(booking, BookingStatus::Refunded)
            .await?;

        Ok(RefundOutcome {
            booking,
            payment: refund.payment,
            newly_refunded: refund.newly_refunded,
        })
    }

    /// Generic escape hatch: validates the edge and applies the same side
    /// effects as the specific operation for the target status.
    pub async fn admin_set_status(
        &self,
        booking_id: Uuid,
        target: BookingStatus,
    ) -> Result<Booking> {
        match target {
            BookingStatus::Ongoing => self.start_trip(booking_id).await,
            BookingStatus::Completed => Ok(self.complete_trip(booking_id).await?.booking),
            BookingStatus::Refunded => Ok(self.refund_booking(booking_id, None).await?.booking),
            _ => {
                let _guard = self.locks.acquire(booking_id).await;
                let booking = self.load_booking(booking_id).await?;
                self.apply_transition(booking, target).await
            }
        }
    }

    /// Allowed next statuses for a booking, for caller affordance.
    pub async fn allowed_transitions(&self, booking_id: Uuid) -> Result<Vec<BookingStatus>> {
        let booking = self.load_booking(booking_id).await?;
        Ok(StateGraph::allowed(booking.status).to_vec())
    }

    /// Loads a booking with an ownership check: plain users may only see
    /// their own bookings.
    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        requester_id: Uuid,
    ) -> Result<(Booking, Vec<BookingStatus>)> {
        let booking = self.load_booking(booking_id).await?;
        let requester = self
            .customers
            .find_by_id(requester_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("customer '{}' not found", requester_id)))?;
        if requester.role == Role::User && booking.customer_id != requester.id {
            return Err(AppError::Forbidden(
                "not authorized to access this booking".to_string(),
            ));
        }
        let allowed = StateGraph::allowed(booking.status).to_vec();
        Ok((booking, allowed))
    }

    /// Most recent payment for a booking.
    pub async fn payment_for_booking(&self, booking_id: Uuid) -> Result<PaymentRecord> {
        self.ledger
            .payment_for_booking(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no payment found for booking '{}'", booking_id))
            })
    }

    async fn load_booking(&self, booking_id: Uuid) -> Result<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking '{}' not found", booking_id)))
    }

    fn validate_edge(&self, from: BookingStatus, to: BookingStatus) -> Result<()> {
        StateGraph::validate(from, to).map_err(|e| {
            self.metrics.record_transition_rejected();
            e
        })
    }

    /// Applies a capture result to the booking. The transition fires while
    /// the booking still awaits confirmation, so a re-delivered capture also
    /// heals a booking whose earlier confirmation write was lost; on a
    /// booking past that point the delivery changes nothing.
    async fn finish_capture(&self, capture: CaptureResult) -> Result<CaptureOutcome> {
        let booking = self.load_booking(capture.payment.booking_id).await?;

        let booking = if booking.status == BookingStatus::PendingPayment {
            self.apply_transition(booking, BookingStatus::Confirmed)
                .await?
        } else {
            if capture.newly_captured {
                warn!(
                    code = %booking.code,
                    status = %booking.status,
                    "capture recorded for a booking no longer awaiting payment"
                );
            }
            booking
        };

        Ok(CaptureOutcome {
            booking,
            payment: capture.payment,
            newly_captured: capture.newly_captured,
        })
    }

    /// The single place where a validated transition mutates the booking and
    /// runs the side effects owned by the target status. Callers hold the
    /// per-booking lock.
    async fn apply_transition(
        &self,
        mut booking: Booking,
        target: BookingStatus,
    ) -> Result<Booking> {
        self.validate_edge(booking.status, target)?;

        match target {
            BookingStatus::Confirmed => {
                booking.payment_state = PaymentState::Paid;
            }
            BookingStatus::Ongoing => {
                booking.actual_start_time = Some(Utc::now());
            }
            BookingStatus::Completed => {
                booking.actual_end_time = Some(Utc::now());
            }
            BookingStatus::Refunded => {
                booking.payment_state = PaymentState::Refunded;
            }
            _ => {}
        }

        let from = booking.status;
        booking.status = target;
        booking.touch();
        let booking = self.bookings.update(booking).await?;

        match target {
            BookingStatus::Completed => {
                self.availability.release(booking.vehicle_id).await?;
                let mut customer = self
                    .customers
                    .find_by_id(booking.customer_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("customer '{}' not found", booking.customer_id))
                    })?;
                customer.record_completed_booking(booking.total_amount);
                self.customers.update(customer).await?;
            }
            BookingStatus::Cancelled => {
                self.availability.release(booking.vehicle_id).await?;
            }
            _ => {}
        }

        self.metrics.record_transition_applied();
        info!(code = %booking.code, %from, to = %target, "booking transitioned");
        Ok(booking)
    }
}
