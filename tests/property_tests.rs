use chrono::NaiveDate;
use hedge_engine::core::cargo::{Cargo, Direction};
use hedge_engine::core::trade::PaperTrade;
use hedge_engine::optimization::allocation::{AllocationEngine, AllocationPolicy, DirectionPolicy};
use hedge_engine::optimization::netting::NettingEngine;
use proptest::prelude::*;
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Commodity names from a small pool so groups collide often.
fn arb_commodity() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["BRENT", "DUBAI", "WTI MIDLAND"])
}

/// Contract months from a small pool.
fn arb_month() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["JAN 24", "FEB 24", "MAR 24"])
}

/// A trade date in early 2024, or missing.
fn arb_date() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::weighted(0.9, 0u64..60).prop_map(|offset| {
        offset.and_then(|d| {
            NaiveDate::from_ymd_opt(2024, 1, 1).map(|start| start + chrono::Duration::days(d as i64))
        })
    })
}

/// Signed volume, zero excluded.
fn arb_volume() -> impl Strategy<Value = Decimal> {
    (1i64..5_000, any::<bool>()).prop_map(|(v, short)| {
        let v = Decimal::from(v);
        if short {
            -v
        } else {
            v
        }
    })
}

/// Generate a paper ledger of 1..60 tickets.
fn arb_paper() -> impl Strategy<Value = Vec<PaperTrade>> {
    prop::collection::vec((arb_commodity(), arb_month(), arb_date(), arb_volume()), 1..60).prop_map(
        |rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (commodity, month, date, volume))| {
                    PaperTrade::new(format!("T{}", i), date, commodity, month, volume, Decimal::from(80))
                })
                .collect()
        },
    )
}

/// Generate a physical ledger of 0..15 cargoes.
fn arb_cargoes() -> impl Strategy<Value = Vec<Cargo>> {
    prop::collection::vec(
        (
            prop::sample::select(vec!["BRENT", "DUBAI", "WTI"]),
            arb_month(),
            arb_date(),
            arb_volume(),
            any::<bool>(),
            prop::option::of(prop::sample::select(vec!["DATED BRENT", "JCC", "WTI"])),
        ),
        0..15,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (proxy, month, date, volume, sell, benchmark))| {
                let direction = if sell { Direction::Sell } else { Direction::Buy };
                let mut cargo = Cargo::new(format!("C{:02}", i), volume, proxy, month)
                    .with_direction(direction)
                    .with_designation_date(date);
                if let Some(benchmark) = benchmark {
                    cargo = cargo.with_benchmark(benchmark);
                }
                cargo
            })
            .collect()
    })
}

fn arb_direction() -> impl Strategy<Value = DirectionPolicy> {
    prop::sample::select(vec![DirectionPolicy::Ignore, DirectionPolicy::RequireOpposite])
}

proptest! {
    // ===================================================================
    // INVARIANT 1: Netting conserves volume per ticket.
    //
    // Every ticket's volume splits exactly into what stays open and what
    // was closed, and the open part never flips sign.
    // ===================================================================
    #[test]
    fn netting_conserves_volume(paper in arb_paper()) {
        let result = NettingEngine::net_positions(&paper);
        prop_assert!(result.is_conserved());
        for trade in result.trades() {
            prop_assert_eq!(
                trade.volume().abs(),
                trade.net_open_volume().abs() + trade.closed_volume()
            );
            prop_assert!(trade.net_open_volume().is_zero()
                || trade.net_open_volume().signum() == trade.volume().signum());
        }
    }

    // ===================================================================
    // INVARIANT 2: Each group nets to its algebraic sum.
    //
    // After FIFO matching the open volume left in a group equals the sum
    // of its signed volumes, and only one side can still be open.
    // ===================================================================
    #[test]
    fn group_open_equals_sum(paper in arb_paper()) {
        let result = NettingEngine::net_positions(&paper);
        let mut sums: HashMap<String, Decimal> = HashMap::new();
        let mut signs: HashMap<String, Vec<Decimal>> = HashMap::new();
        for trade in result.trades() {
            let key = trade.group_key().as_str().to_string();
            *sums.entry(key.clone()).or_default() += trade.volume();
            if !trade.net_open_volume().is_zero() {
                signs.entry(key).or_default().push(trade.net_open_volume().signum());
            }
        }
        for group in result.groups() {
            prop_assert_eq!(group.net_open, sums[group.key.as_str()]);
        }
        for side in signs.values() {
            prop_assert!(side.windows(2).all(|w| w[0] == w[1]));
        }
    }

    // ===================================================================
    // INVARIANT 3: Netting is idempotent.
    //
    // Running the engine over its own output changes nothing.
    // ===================================================================
    #[test]
    fn netting_is_idempotent(paper in arb_paper()) {
        let once = NettingEngine::net_positions(&paper);
        let twice = NettingEngine::net_positions(once.trades());
        for (a, b) in once.trades().iter().zip(twice.trades()) {
            prop_assert_eq!(a.net_open_volume(), b.net_open_volume());
            prop_assert_eq!(a.closed_volume(), b.closed_volume());
            prop_assert_eq!(a.close_events(), b.close_events());
        }
    }

    // ===================================================================
    // INVARIANT 4: Allocation conserves each cargo's volume.
    //
    // What a cargo received plus what it still needs adds back up to its
    // size, and the residual never grows or changes sign.
    // ===================================================================
    #[test]
    fn allocation_conserves_cargo_volume(
        paper in arb_paper(),
        cargoes in arb_cargoes(),
        direction in arb_direction(),
    ) {
        let netted = NettingEngine::net_positions(&paper);
        let engine = AllocationEngine::new(AllocationPolicy { direction, ..Default::default() });
        let result = engine.allocate(&cargoes, netted.trades());

        for cargo in &result.cargoes {
            let received: Decimal = result
                .relations_for_cargo(cargo.id().as_str())
                .map(|r| r.allocated_volume.abs())
                .sum();
            prop_assert_eq!(received + cargo.unhedged_volume().abs(), cargo.volume().abs());
            prop_assert!(cargo.unhedged_volume().abs() <= cargo.volume().abs());
            prop_assert!(cargo.unhedged_volume().is_zero()
                || cargo.unhedged_volume().signum() == cargo.volume().signum());
        }
    }

    // ===================================================================
    // INVARIANT 5: Paper is never over-allocated.
    //
    // A ticket's total assignment is bounded by its net-open volume and
    // carries the same sign.
    // ===================================================================
    #[test]
    fn allocation_bounded_by_net_open(
        paper in arb_paper(),
        cargoes in arb_cargoes(),
        direction in arb_direction(),
    ) {
        let netted = NettingEngine::net_positions(&paper);
        let engine = AllocationEngine::new(AllocationPolicy { direction, ..Default::default() });
        let result = engine.allocate(&cargoes, netted.trades());

        for trade in &result.paper {
            let assigned: Decimal = result
                .relations_for_ticket(trade.ticket())
                .map(|r| r.allocated_volume)
                .sum();
            prop_assert_eq!(assigned, trade.allocated_to_physical());
            prop_assert!(trade.allocated_to_physical().abs() <= trade.net_open_volume().abs());
            prop_assert!(trade.allocated_to_physical().is_zero()
                || trade.allocated_to_physical().signum() == trade.net_open_volume().signum());
        }
    }

    // ===================================================================
    // INVARIANT 6: Every relation respects the matching rules.
    //
    // Month matches exactly and the paper commodity contains the proxy.
    // ===================================================================
    #[test]
    fn relations_match_proxy_and_month(paper in arb_paper(), cargoes in arb_cargoes()) {
        let netted = NettingEngine::net_positions(&paper);
        let result = AllocationEngine::default().allocate(&cargoes, netted.trades());

        for rel in &result.relations {
            let trade = result.trade(&rel.ticket).unwrap();
            let cargo = result.cargo(rel.cargo_id.as_str()).unwrap();
            prop_assert_eq!(trade.month(), cargo.target_month());
            prop_assert!(trade.commodity().contains(cargo.hedge_proxy()));
            prop_assert!(!rel.allocated_volume.is_zero());
        }
    }

    // ===================================================================
    // INVARIANT 7: The pipeline is deterministic.
    //
    // Same inputs, same relations in the same order.
    // ===================================================================
    #[test]
    fn pipeline_is_deterministic(paper in arb_paper(), cargoes in arb_cargoes()) {
        let run = || {
            let netted = NettingEngine::net_positions(&paper);
            AllocationEngine::default().allocate(&cargoes, netted.trades()).relations
        };
        prop_assert_eq!(run(), run());
    }
}
