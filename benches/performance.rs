use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rust_decimal::Decimal;

use booking_engine::gateway::signature;
use booking_engine::models::{rental_days, BookingStatus};
use booking_engine::state_graph::StateGraph;

fn benchmark_transition_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("state_graph");

    group.bench_function("validate_all_pairs", |b| {
        b.iter(|| {
            let mut accepted = 0u32;
            for from in BookingStatus::ALL {
                for to in BookingStatus::ALL {
                    if StateGraph::can_transition(black_box(from), black_box(to)) {
                        accepted += 1;
                    }
                }
            }
            black_box(accepted)
        });
    });

    group.finish();
}

fn benchmark_signature_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");

    let sig = signature::client_proof_signature("bench-secret", "order_bench", "pay_bench");

    group.bench_function("client_proof_sign", |b| {
        b.iter(|| {
            black_box(signature::client_proof_signature(
                black_box("bench-secret"),
                black_box("order_bench"),
                black_box("pay_bench"),
            ))
        });
    });

    group.bench_function("client_proof_verify", |b| {
        b.iter(|| {
            black_box(signature::verify_client_proof(
                black_box("bench-secret"),
                black_box("order_bench"),
                black_box("pay_bench"),
                black_box(&sig),
            ))
        });
    });

    group.finish();
}

fn benchmark_pricing(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");

    let pickup = Utc::now();
    let dropoff = pickup + Duration::hours(60);
    let price_per_day = Decimal::from(2500);

    group.bench_function("rental_total", |b| {
        b.iter(|| {
            let days = rental_days(black_box(pickup), black_box(dropoff));
            black_box(Decimal::from(days) * price_per_day)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_transition_table,
    benchmark_signature_verification,
    benchmark_pricing
);
criterion_main!(benches);
