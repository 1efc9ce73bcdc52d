use crate::core::cargo::{Cargo, CargoId};
use crate::core::contract::ContractMonth;
use crate::core::trade::PaperTrade;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One slice of a paper trade's net-open volume assigned to a cargo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HedgeRelation {
    pub cargo_id: CargoId,
    pub proxy: String,
    pub designation_date: Option<NaiveDate>,
    /// Trade date of the paper ticket.
    pub open_date: Option<NaiveDate>,
    /// `open_date - designation_date` in days; `None` if either is missing.
    pub time_lag_days: Option<i64>,
    pub ticket: String,
    pub month: ContractMonth,
    /// Signed like the paper position it was carved from.
    pub allocated_volume: Decimal,
    pub trade_volume: Decimal,
    pub trade_net_open: Decimal,
    pub trade_closed_volume: Decimal,
    pub open_price: Decimal,
    pub mtm_price: Decimal,
    pub unrealized_mtm: Decimal,
    pub allocated_pl: Decimal,
    pub close_path: String,
    pub avg_close_price: Decimal,
}

impl HedgeRelation {
    /// Build the relation row for `allocated` volume of `trade` assigned to `cargo`.
    pub fn new(cargo: &Cargo, trade: &PaperTrade, allocated: Decimal) -> Self {
        let time_lag_days = match (trade.trade_date(), cargo.designation_date()) {
            (Some(opened), Some(designated)) => Some((opened - designated).num_days()),
            _ => None,
        };

        let unrealized_mtm = (trade.mtm_price() - trade.price()) * allocated;
        let allocated_pl = if trade.volume().is_zero() {
            Decimal::ZERO
        } else {
            trade.total_pl() * (allocated.abs() / trade.volume().abs())
        };

        let close_path = trade.close_path();

        Self {
            cargo_id: cargo.id().clone(),
            proxy: cargo.hedge_proxy().to_string(),
            designation_date: cargo.designation_date(),
            open_date: trade.trade_date(),
            time_lag_days,
            ticket: trade.ticket().to_string(),
            month: trade.month().clone(),
            allocated_volume: allocated,
            trade_volume: trade.volume(),
            trade_net_open: trade.net_open_volume(),
            trade_closed_volume: trade.closed_volume(),
            open_price: trade.price(),
            mtm_price: trade.mtm_price(),
            unrealized_mtm: unrealized_mtm.round_dp(2),
            allocated_pl: allocated_pl.round_dp(2),
            close_path: close_path.description,
            avg_close_price: close_path.weighted_price,
        }
    }
}
