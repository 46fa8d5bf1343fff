use booking_engine::error::AppError;
use booking_engine::models::BookingStatus;
use booking_engine::state_graph::StateGraph;

use BookingStatus::*;

/// The complete edge table. Tests enumerate every status pair against it.
const EDGES: [(BookingStatus, BookingStatus); 11] = [
    (Draft, PendingPayment),
    (Draft, Cancelled),
    (PendingPayment, Confirmed),
    (PendingPayment, Cancelled),
    (Confirmed, Assigned),
    (Confirmed, Cancelled),
    (Assigned, Ongoing),
    (Assigned, Cancelled),
    (Ongoing, Completed),
    (Completed, Refunded),
    (Cancelled, Refunded),
];

fn is_edge(from: BookingStatus, to: BookingStatus) -> bool {
    EDGES.contains(&(from, to))
}

#[test]
fn transition_totality_over_all_64_pairs() {
    for from in BookingStatus::ALL {
        for to in BookingStatus::ALL {
            let expected = is_edge(from, to);
            assert_eq!(
                StateGraph::can_transition(from, to),
                expected,
                "pair ({from:?}, {to:?})"
            );
            match StateGraph::validate(from, to) {
                Ok(()) => assert!(expected, "validate accepted non-edge ({from:?}, {to:?})"),
                Err(AppError::InvalidTransition {
                    from: f,
                    to: t,
                    allowed,
                }) => {
                    assert!(!expected, "validate rejected edge ({from:?}, {to:?})");
                    assert_eq!(f, from);
                    assert_eq!(t, to);
                    assert_eq!(allowed, StateGraph::allowed(from).to_vec());
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
    }
}

#[test]
fn allowed_sets_match_edge_table() {
    for from in BookingStatus::ALL {
        let allowed = StateGraph::allowed(from);
        for to in BookingStatus::ALL {
            assert_eq!(allowed.contains(&to), is_edge(from, to));
        }
    }
}

#[test]
fn graph_is_a_dag_toward_terminal_states() {
    // Every walk from every status terminates: the graph has no cycles, so
    // repeatedly taking any allowed edge must reach a terminal status within
    // the number of statuses.
    for start in BookingStatus::ALL {
        let mut frontier = vec![start];
        for _ in 0..BookingStatus::ALL.len() {
            frontier = frontier
                .into_iter()
                .flat_map(|s| StateGraph::allowed(s).iter().copied())
                .collect();
        }
        assert!(
            frontier.is_empty(),
            "walk from {start:?} did not terminate"
        );
    }
}

#[test]
fn ongoing_is_only_reachable_through_the_full_chain() {
    // Breadth-first over the edge table: the unique path from draft to
    // ongoing must pass pending_payment, confirmed, and assigned in order.
    let mut path = vec![Draft];
    let mut current = Draft;
    while current != Ongoing {
        let next = StateGraph::allowed(current)
            .iter()
            .copied()
            .find(|s| !s.has_ended())
            .expect("active chain broken");
        path.push(next);
        current = next;
    }
    assert_eq!(
        path,
        vec![Draft, PendingPayment, Confirmed, Assigned, Ongoing]
    );
}

#[test]
fn terminal_statuses() {
    assert!(StateGraph::is_terminal(Refunded));
    for status in BookingStatus::ALL {
        if status != Refunded {
            assert!(!StateGraph::is_terminal(status), "{status:?}");
        }
    }
}

#[test]
fn cancellation_is_reachable_from_every_pre_trip_status() {
    for from in [Draft, PendingPayment, Confirmed, Assigned] {
        assert!(StateGraph::can_transition(from, Cancelled), "{from:?}");
    }
    assert!(!StateGraph::can_transition(Ongoing, Cancelled));
    assert!(!StateGraph::can_transition(Completed, Cancelled));
}
