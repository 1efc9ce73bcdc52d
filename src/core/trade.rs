use crate::core::contract::{normalize_commodity, ContractMonth, GroupKey};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Volumes whose magnitude is below this are treated as zero.
pub const EPSILON: Decimal = rust_decimal_macros::dec!(0.0001);

/// One offset of a trade's volume by a later, opposite-signed ticket.
///
/// Recorded on the trade that was closed; `ticket`, `date` and `price`
/// describe the ticket that closed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseEvent {
    pub ticket: String,
    pub date: Option<NaiveDate>,
    /// Unsigned volume offset.
    pub volume: Decimal,
    pub price: Decimal,
}

/// Human-readable closure provenance of a trade.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClosePath {
    /// `[date Tkt#ref Vol:n @price]` segments joined with ` -> `.
    pub description: String,
    /// Volume-weighted price of the closing tickets (zero if never closed).
    pub weighted_price: Decimal,
    /// Total volume closed.
    pub volume: Decimal,
}

/// A paper (derivative) ticket.
///
/// Identity fields are fixed at construction. The netting fields
/// (`net_open_volume`, `closed_volume`, `close_events`) are written by
/// [`NettingEngine`](crate::optimization::netting::NettingEngine) and
/// `allocated_to_physical` by
/// [`AllocationEngine`](crate::optimization::allocation::AllocationEngine).
///
/// # Examples
///
/// ```
/// use hedge_engine::core::trade::PaperTrade;
/// use chrono::NaiveDate;
/// use rust_decimal_macros::dec;
///
/// let trade = PaperTrade::new(
///     "T-1",
///     NaiveDate::from_ymd_opt(2024, 1, 2),
///     "Brent",
///     "Jan-24",
///     dec!(1000),
///     dec!(78.50),
/// );
///
/// assert_eq!(trade.commodity(), "BRENT");
/// assert_eq!(trade.month().as_str(), "JAN 24");
/// assert_eq!(trade.net_open_volume(), dec!(1000));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperTrade {
    ticket: String,
    trade_date: Option<NaiveDate>,
    raw_commodity: String,
    commodity: String,
    month: ContractMonth,
    /// Signed: positive is long, negative is short.
    volume: Decimal,
    price: Decimal,
    mtm_price: Decimal,
    /// P/L for the full booked volume.
    total_pl: Decimal,
    pub(crate) net_open_volume: Decimal,
    pub(crate) closed_volume: Decimal,
    pub(crate) close_events: Vec<CloseEvent>,
    pub(crate) allocated_to_physical: Decimal,
}

impl PaperTrade {
    pub fn new(
        ticket: impl Into<String>,
        trade_date: Option<NaiveDate>,
        commodity: &str,
        month: &str,
        volume: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            ticket: ticket.into(),
            trade_date,
            raw_commodity: commodity.to_string(),
            commodity: normalize_commodity(commodity),
            month: ContractMonth::parse(month),
            volume,
            price,
            mtm_price: Decimal::ZERO,
            total_pl: Decimal::ZERO,
            net_open_volume: volume,
            closed_volume: Decimal::ZERO,
            close_events: Vec::new(),
            allocated_to_physical: Decimal::ZERO,
        }
    }

    pub fn with_mtm_price(mut self, mtm_price: Decimal) -> Self {
        self.mtm_price = mtm_price;
        self
    }

    pub fn with_total_pl(mut self, total_pl: Decimal) -> Self {
        self.total_pl = total_pl;
        self
    }

    /// Clear everything the engines derive, back to the un-netted state.
    pub(crate) fn reset_derived(&mut self) {
        self.net_open_volume = self.volume;
        self.closed_volume = Decimal::ZERO;
        self.close_events.clear();
        self.allocated_to_physical = Decimal::ZERO;
    }

    // --- Accessors ---

    pub fn ticket(&self) -> &str {
        &self.ticket
    }

    pub fn trade_date(&self) -> Option<NaiveDate> {
        self.trade_date
    }

    pub fn raw_commodity(&self) -> &str {
        &self.raw_commodity
    }

    /// Normalized commodity token.
    pub fn commodity(&self) -> &str {
        &self.commodity
    }

    pub fn month(&self) -> &ContractMonth {
        &self.month
    }

    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.commodity, &self.month)
    }

    pub fn volume(&self) -> Decimal {
        self.volume
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn mtm_price(&self) -> Decimal {
        self.mtm_price
    }

    pub fn total_pl(&self) -> Decimal {
        self.total_pl
    }

    pub fn net_open_volume(&self) -> Decimal {
        self.net_open_volume
    }

    pub fn closed_volume(&self) -> Decimal {
        self.closed_volume
    }

    pub fn close_events(&self) -> &[CloseEvent] {
        &self.close_events
    }

    pub fn allocated_to_physical(&self) -> Decimal {
        self.allocated_to_physical
    }

    /// Net-open volume not yet allocated to any cargo.
    pub fn unallocated_volume(&self) -> Decimal {
        self.net_open_volume - self.allocated_to_physical
    }

    /// Describe how this trade was closed out by later tickets.
    pub fn close_path(&self) -> ClosePath {
        if self.close_events.is_empty() {
            return ClosePath::default();
        }

        let mut events: Vec<&CloseEvent> = self.close_events.iter().collect();
        events.sort_by_key(|e| e.date);

        let mut total_volume = Decimal::ZERO;
        let mut total_value = Decimal::ZERO;
        let segments: Vec<String> = events
            .iter()
            .map(|e| {
                total_volume += e.volume;
                total_value += e.volume * e.price;
                let date = e
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                format!(
                    "[{} Tkt#{} Vol:{:.0} @{}]",
                    date,
                    e.ticket,
                    e.volume,
                    e.price.normalize()
                )
            })
            .collect();

        let weighted_price = if total_volume > Decimal::ZERO {
            total_value / total_volume
        } else {
            Decimal::ZERO
        };

        ClosePath {
            description: segments.join(" -> "),
            weighted_price,
            volume: total_volume,
        }
    }
}
