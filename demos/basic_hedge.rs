//! FIFO netting of a small paper book, then allocation to two cargoes.

use chrono::NaiveDate;
use hedge_engine::core::cargo::{Cargo, Direction};
use hedge_engine::core::trade::PaperTrade;
use hedge_engine::optimization::allocation::AllocationEngine;
use hedge_engine::optimization::exposure::ExposureReport;
use hedge_engine::optimization::netting::NettingEngine;
use rust_decimal_macros::dec;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  hedge-engine: Basic Hedge Example       ║");
    println!("╚══════════════════════════════════════════╝\n");

    let day = |m: u32, d: u32| NaiveDate::from_ymd_opt(2024, m, d);

    // --- Stage 1: FIFO netting ---
    println!("━━━ Stage 1: FIFO Netting ━━━\n");

    let paper = vec![
        PaperTrade::new("1001", day(1, 2), "Brent", "Mar-24", dec!(1000), dec!(80.10))
            .with_mtm_price(dec!(82.40))
            .with_total_pl(dec!(2300)),
        PaperTrade::new("1002", day(1, 9), "Brent", "MAR 24", dec!(-400), dec!(81.00))
            .with_mtm_price(dec!(82.40))
            .with_total_pl(dec!(-560)),
        PaperTrade::new("1003", day(1, 15), "Brent", "Mar 24", dec!(-250), dec!(81.75))
            .with_mtm_price(dec!(82.40))
            .with_total_pl(dec!(-162.50)),
        PaperTrade::new("1004", day(1, 22), "Brent", "Mar 24", dec!(500), dec!(79.90))
            .with_mtm_price(dec!(82.40))
            .with_total_pl(dec!(1250)),
    ];

    let netted = NettingEngine::net_positions(&paper);
    println!("{}", netted);

    for trade in netted.trades() {
        println!(
            "  Tkt#{:<6} vol {:>6}  open {:>6}  closed {:>6}  {}",
            trade.ticket(),
            trade.volume(),
            trade.net_open_volume(),
            trade.closed_volume(),
            trade.close_path().description
        );
    }
    println!();

    // --- Stage 2: Allocation ---
    println!("━━━ Stage 2: Allocation to Cargoes ━━━\n");

    let cargoes = vec![
        Cargo::new("LNG-2024-07", dec!(500), "BRENT", "MAR 24")
            .with_direction(Direction::Buy)
            .with_designation_date(day(1, 3))
            .with_benchmark("Dated Brent"),
        Cargo::new("LNG-2024-11", dec!(700), "BRENT", "MAR 24")
            .with_direction(Direction::Buy)
            .with_designation_date(day(1, 20)),
    ];

    let result = AllocationEngine::default().allocate(&cargoes, netted.trades());
    for rel in &result.relations {
        println!(
            "  {:<12} <- Tkt#{:<6} {:>6}  lag {:>4}  mtm {:>10}  pl {:>10}",
            rel.cargo_id.as_str(),
            rel.ticket,
            rel.allocated_volume,
            rel.time_lag_days.map(|d| d.to_string()).unwrap_or_default(),
            rel.unrealized_mtm,
            rel.allocated_pl
        );
    }
    println!();

    println!("{}", ExposureReport::from_allocation(&result));
}
