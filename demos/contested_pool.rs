//! Several cargoes competing for one pool of paper.
//!
//! Shows how benchmark tiers and the direction policy change who gets
//! hedged first.

use chrono::NaiveDate;
use hedge_engine::core::cargo::{Cargo, Direction};
use hedge_engine::core::trade::PaperTrade;
use hedge_engine::optimization::allocation::{
    AllocationEngine, AllocationPolicy, AllocationResult, BenchmarkTiers, DirectionPolicy,
};
use hedge_engine::optimization::netting::NettingEngine;
use rust_decimal_macros::dec;

fn report(label: &str, result: &AllocationResult) {
    println!("━━━ {} ━━━\n", label);
    for cargo in &result.cargoes {
        let fills: Vec<String> = result
            .relations_for_cargo(cargo.id().as_str())
            .map(|r| format!("Tkt#{} {}", r.ticket, r.allocated_volume))
            .collect();
        println!(
            "  {:<10} {:<12} need {:>6} left {:>6}  [{}]",
            cargo.id().as_str(),
            cargo.benchmark().unwrap_or("-"),
            cargo.volume(),
            cargo.unhedged_volume(),
            fills.join(", ")
        );
    }
    println!();
}

fn main() {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  hedge-engine: Contested Paper Pool           ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 5, d);

    let paper = vec![
        PaperTrade::new("A1", day(2), "DUBAI", "JUL 24", dec!(-600), dec!(83.2)),
        PaperTrade::new("A2", day(8), "DUBAI", "JUL 24", dec!(-300), dec!(84.0)),
        PaperTrade::new("A3", day(14), "DUBAI", "JUL 24", dec!(400), dec!(82.6)),
    ];
    let netted = NettingEngine::net_positions(&paper);
    println!("{}", netted);

    let cargoes = vec![
        Cargo::new("CG-JCC", dec!(500), "DUBAI", "JUL 24")
            .with_direction(Direction::Buy)
            .with_designation_date(day(20))
            .with_benchmark("JCC"),
        Cargo::new("CG-BRENT", dec!(300), "DUBAI", "JUL 24")
            .with_direction(Direction::Buy)
            .with_designation_date(day(25))
            .with_benchmark("Dated Brent"),
        Cargo::new("CG-HH", dec!(400), "DUBAI", "JUL 24")
            .with_direction(Direction::Sell)
            .with_designation_date(day(1))
            .with_benchmark("Henry Hub"),
    ];

    let default_run = AllocationEngine::default().allocate(&cargoes, netted.trades());
    report("Brent first, direction ignored", &default_run);

    let jcc_run = AllocationEngine::new(AllocationPolicy {
        benchmarks: BenchmarkTiers::brent_jcc(),
        ..Default::default()
    })
    .allocate(&cargoes, netted.trades());
    report("Brent, then JCC", &jcc_run);

    let strict_run = AllocationEngine::new(AllocationPolicy {
        direction: DirectionPolicy::RequireOpposite,
        benchmarks: BenchmarkTiers::brent_jcc(),
        ..Default::default()
    })
    .allocate(&cargoes, netted.trades());
    report("Brent, then JCC, opposite direction only", &strict_run);
}
