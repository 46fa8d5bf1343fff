//! The booking status transition table.
//!
//! The graph is encoded as static data rather than procedural checks, so a
//! test can enumerate every status pair and assert validity against the
//! table, and no status can ever be skipped.

use crate::error::{AppError, Result};
use crate::models::BookingStatus;

/// Fixed directed graph over booking statuses. Pure, no I/O.
#[derive(Debug, Clone, Copy)]
pub struct StateGraph;

impl StateGraph {
    /// Statuses reachable in one step from `from`.
    pub fn allowed(from: BookingStatus) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match from {
            Draft => &[PendingPayment, Cancelled],
            PendingPayment => &[Confirmed, Cancelled],
            Confirmed => &[Assigned, Cancelled],
            Assigned => &[Ongoing, Cancelled],
            Ongoing => &[Completed],
            Completed => &[Refunded],
            Cancelled => &[Refunded],
            Refunded => &[],
        }
    }

    /// Total over all status pairs; never panics.
    pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
        Self::allowed(from).contains(&to)
    }

    /// Returns true if no transition leaves `status`.
    pub fn is_terminal(status: BookingStatus) -> bool {
        Self::allowed(status).is_empty()
    }

    /// Validates an edge, reporting the full allowed set on rejection so the
    /// caller can surface it to the requester.
    pub fn validate(from: BookingStatus, to: BookingStatus) -> Result<()> {
        if Self::can_transition(from, to) {
            Ok(())
        } else {
            Err(AppError::InvalidTransition {
                from,
                to,
                allowed: Self::allowed(from).to_vec(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BookingStatus::*;

    #[test]
    fn test_happy_path_edges() {
        assert!(StateGraph::can_transition(Draft, PendingPayment));
        assert!(StateGraph::can_transition(PendingPayment, Confirmed));
        assert!(StateGraph::can_transition(Confirmed, Assigned));
        assert!(StateGraph::can_transition(Assigned, Ongoing));
        assert!(StateGraph::can_transition(Ongoing, Completed));
        assert!(StateGraph::can_transition(Completed, Refunded));
    }

    #[test]
    fn test_no_self_edges() {
        for status in BookingStatus::ALL {
            assert!(
                !StateGraph::can_transition(status, status),
                "self edge on {status:?}"
            );
        }
    }

    #[test]
    fn test_refunded_is_terminal() {
        assert!(StateGraph::is_terminal(Refunded));
        for status in BookingStatus::ALL {
            assert!(!StateGraph::can_transition(Refunded, status));
        }
    }

    #[test]
    fn test_no_skip_from_draft() {
        assert!(!StateGraph::can_transition(Draft, Confirmed));
        assert!(!StateGraph::can_transition(Draft, Ongoing));
        assert!(!StateGraph::can_transition(Draft, Completed));
        assert!(!StateGraph::can_transition(PendingPayment, Ongoing));
    }

    #[test]
    fn test_validate_reports_allowed_set() {
        let err = StateGraph::validate(Confirmed, Completed).unwrap_err();
        match err {
            AppError::InvalidTransition { from, to, allowed } => {
                assert_eq!(from, Confirmed);
                assert_eq!(to, Completed);
                assert_eq!(allowed, vec![Assigned, Cancelled]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
