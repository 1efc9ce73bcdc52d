use crate::core::contract::{normalize_commodity, ContractMonth, UNKNOWN_TOKEN};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a physical cargo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CargoId(String);

impl CargoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CargoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CargoId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Physical side of a cargo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Buy,
    Sell,
}

impl Direction {
    /// Read a free-text direction. Anything not recognisably a sale is a buy.
    pub fn parse(raw: &str) -> Self {
        let token = raw.trim().to_uppercase();
        if token.contains("SELL") || token.contains("SHORT") || token == "S" {
            Direction::Sell
        } else {
            Direction::Buy
        }
    }

    /// Sign of the paper net-open position that offsets this side:
    /// a physical purchase is hedged by short paper, a sale by long paper.
    pub fn hedging_sign(self) -> Decimal {
        match self {
            Direction::Buy => Decimal::NEGATIVE_ONE,
            Direction::Sell => Decimal::ONE,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Buy => write!(f, "Buy"),
            Direction::Sell => write!(f, "Sell"),
        }
    }
}

/// A physical cargo position that needs hedging.
///
/// `unhedged_volume` starts at the full volume and only shrinks in
/// magnitude as the allocation engine assigns paper to the cargo.
///
/// # Examples
///
/// ```
/// use hedge_engine::core::cargo::{Cargo, Direction};
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let cargo = Cargo::new("C1", dec!(600), "brent", "Jan 24")
///     .with_direction(Direction::Buy)
///     .with_designation_date(NaiveDate::from_ymd_opt(2024, 1, 1))
///     .with_benchmark("Dated Brent");
///
/// assert_eq!(cargo.hedge_proxy(), "BRENT");
/// assert_eq!(cargo.unhedged_volume(), dec!(600));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cargo {
    id: CargoId,
    volume: Decimal,
    direction: Direction,
    hedge_proxy: String,
    target_month: ContractMonth,
    designation_date: Option<NaiveDate>,
    benchmark: Option<String>,
    pub(crate) unhedged_volume: Decimal,
}

impl Cargo {
    pub fn new(id: impl Into<String>, volume: Decimal, hedge_proxy: &str, target_month: &str) -> Self {
        Self {
            id: CargoId::new(id),
            volume,
            direction: Direction::default(),
            hedge_proxy: normalize_commodity(hedge_proxy),
            target_month: ContractMonth::parse(target_month),
            designation_date: None,
            benchmark: None,
            unhedged_volume: volume,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_designation_date(mut self, date: Option<NaiveDate>) -> Self {
        self.designation_date = date;
        self
    }

    pub fn with_benchmark(mut self, benchmark: impl Into<String>) -> Self {
        let benchmark = benchmark.into();
        self.benchmark = if benchmark.trim().is_empty() {
            None
        } else {
            Some(benchmark.trim().to_uppercase())
        };
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> &CargoId {
        &self.id
    }

    pub fn volume(&self) -> Decimal {
        self.volume
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Normalized substring matched against paper commodities.
    pub fn hedge_proxy(&self) -> &str {
        &self.hedge_proxy
    }

    pub fn has_known_proxy(&self) -> bool {
        self.hedge_proxy != UNKNOWN_TOKEN
    }

    pub fn target_month(&self) -> &ContractMonth {
        &self.target_month
    }

    pub fn designation_date(&self) -> Option<NaiveDate> {
        self.designation_date
    }

    /// Uppercased pricing benchmark, if any.
    pub fn benchmark(&self) -> Option<&str> {
        self.benchmark.as_deref()
    }

    pub fn unhedged_volume(&self) -> Decimal {
        self.unhedged_volume
    }

    /// Magnitude already covered by paper.
    pub fn hedged_volume(&self) -> Decimal {
        self.volume.abs() - self.unhedged_volume.abs()
    }
}
