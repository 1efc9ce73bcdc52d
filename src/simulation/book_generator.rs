//! Random paper/physical books for load testing and demos.

use crate::core::cargo::{Cargo, Direction};
use crate::core::contract::ContractMonth;
use crate::core::trade::PaperTrade;
use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;
use rust_decimal::Decimal;

/// Configuration for generating a random book.
#[derive(Debug, Clone)]
pub struct BookConfig {
    /// Number of paper tickets.
    pub trade_count: usize,
    /// Number of physical cargoes.
    pub cargo_count: usize,
    /// Paper commodity names; cargo proxies are drawn from the same list.
    pub commodities: Vec<String>,
    /// Benchmarks assigned to cargoes (`None` entries leave it blank).
    pub benchmarks: Vec<Option<String>>,
    /// First trade date.
    pub start_date: NaiveDate,
    /// Trade and designation dates fall within this many days of the start.
    pub span_days: i64,
    /// Number of consecutive contract months starting at `start_date`.
    pub month_count: u32,
    /// Largest ticket or cargo size, in whole units.
    pub max_lot: i64,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            trade_count: 200,
            cargo_count: 20,
            commodities: vec!["BRENT".to_string(), "DUBAI".to_string(), "WTI".to_string()],
            benchmarks: vec![
                Some("DATED BRENT".to_string()),
                Some("JCC".to_string()),
                Some("WTI".to_string()),
                None,
            ],
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            span_days: 180,
            month_count: 6,
            max_lot: 1_000,
        }
    }
}

/// A generated paper ledger and physical ledger.
#[derive(Debug, Clone)]
pub struct Book {
    pub paper: Vec<PaperTrade>,
    pub cargoes: Vec<Cargo>,
}

/// Generate a random book for testing.
pub fn generate_book(config: &BookConfig) -> Book {
    let mut rng = rand::thread_rng();

    let months: Vec<ContractMonth> = (0..config.month_count.max(1))
        .map(|offset| {
            let total = config.start_date.month0() + offset;
            ContractMonth::from_year_month(config.start_date.year() + (total / 12) as i32, total % 12 + 1)
        })
        .collect();
    let span = config.span_days.max(1);
    let max_lot = config.max_lot.max(1);

    let paper = (0..config.trade_count)
        .map(|i| {
            let commodity = &config.commodities[rng.gen_range(0..config.commodities.len())];
            let month = &months[rng.gen_range(0..months.len())];
            let date = config.start_date + Duration::days(rng.gen_range(0..span));
            let mut volume = Decimal::from(rng.gen_range(1..=max_lot));
            if rng.gen_bool(0.5) {
                volume = -volume;
            }
            let price = Decimal::new(rng.gen_range(6_000..9_000), 2);
            let mtm_price = price + Decimal::new(rng.gen_range(-500..500), 2);
            let total_pl = (mtm_price - price) * volume;
            PaperTrade::new(
                format!("TKT-{:05}", i),
                Some(date),
                commodity,
                month.as_str(),
                volume,
                price,
            )
            .with_mtm_price(mtm_price)
            .with_total_pl(total_pl)
        })
        .collect();

    let cargoes = (0..config.cargo_count)
        .map(|i| {
            let proxy = &config.commodities[rng.gen_range(0..config.commodities.len())];
            let month = &months[rng.gen_range(0..months.len())];
            let direction = if rng.gen_bool(0.5) {
                Direction::Buy
            } else {
                Direction::Sell
            };
            let designation = if rng.gen_bool(0.8) {
                Some(config.start_date + Duration::days(rng.gen_range(0..span)))
            } else {
                None
            };
            let mut cargo = Cargo::new(
                format!("CARGO-{:03}", i),
                Decimal::from(rng.gen_range(1..=max_lot)),
                proxy,
                month.as_str(),
            )
            .with_direction(direction)
            .with_designation_date(designation);
            if !config.benchmarks.is_empty() {
                if let Some(benchmark) = &config.benchmarks[rng.gen_range(0..config.benchmarks.len())] {
                    cargo = cargo.with_benchmark(benchmark.as_str());
                }
            }
            cargo
        })
        .collect();

    Book { paper, cargoes }
}
