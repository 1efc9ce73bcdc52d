use crate::core::contract::GroupKey;
use crate::core::trade::{CloseEvent, PaperTrade, EPSILON};
use rust_decimal::prelude::Signed;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Result of FIFO netting over a paper book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NettingResult {
    /// Trades in processing order (trade date ascending, undated last).
    trades: Vec<PaperTrade>,
    /// Per-group breakdown in first-seen order.
    groups: Vec<GroupSummary>,
}

impl NettingResult {
    pub fn trades(&self) -> &[PaperTrade] {
        &self.trades
    }

    pub fn into_trades(self) -> Vec<PaperTrade> {
        self.trades
    }

    pub fn groups(&self) -> &[GroupSummary] {
        &self.groups
    }

    pub fn group(&self, key: &GroupKey) -> Option<&GroupSummary> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Sum of |volume| over all trades.
    pub fn gross_volume(&self) -> Decimal {
        self.groups.iter().map(|g| g.gross_volume).sum()
    }

    /// Sum of |net_open_volume| over all trades.
    pub fn open_volume(&self) -> Decimal {
        self.groups.iter().map(|g| g.open_volume).sum()
    }

    /// Check `|closed| + |net_open| == |volume|` for every trade.
    pub fn is_conserved(&self) -> bool {
        self.trades.iter().all(|t| {
            (t.closed_volume().abs() + t.net_open_volume().abs() - t.volume().abs()).abs() < EPSILON
        })
    }
}

/// Netting outcome for one commodity/contract-month group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub key: GroupKey,
    pub trade_count: usize,
    pub gross_volume: Decimal,
    /// Signed sum of net-open volume: the group's residual exposure.
    pub net_open: Decimal,
    pub open_volume: Decimal,
    /// Volume offset inside the group, counted once per pair.
    pub closed_volume: Decimal,
}

/// A still-open remainder of a trade waiting to be offset.
#[derive(Debug, Clone, Copy)]
struct OpenLot {
    trade: usize,
    remaining: Decimal,
    sign: Decimal,
}

/// FIFO netting of paper trades.
pub struct NettingEngine;

impl NettingEngine {
    /// Offset opposite-signed trades within each commodity/month group.
    ///
    /// # Algorithm
    ///
    /// 1. Stable-sort by trade date; undated trades go last.
    /// 2. Partition by [`GroupKey`], keeping date order inside each group.
    /// 3. Per group, keep a FIFO queue of open lots. An incoming trade
    ///    consumes front lots of the opposite sign until it is exhausted or
    ///    the front lot shares its sign. Each offset records a
    ///    [`CloseEvent`] on the lot's trade.
    /// 4. Any residual is pushed onto the back of the queue.
    ///
    /// Derived fields are recomputed from the booked volumes, so netting
    /// already-netted trades gives the same answer.
    pub fn net_positions(trades: &[PaperTrade]) -> NettingResult {
        let start = Instant::now();

        let mut trades = trades.to_vec();
        trades.sort_by_key(|t| (t.trade_date().is_none(), t.trade_date()));
        for trade in &mut trades {
            trade.reset_derived();
        }

        let mut group_index: HashMap<GroupKey, usize> = HashMap::new();
        let mut groups: Vec<(GroupKey, Vec<usize>)> = Vec::new();
        for (idx, trade) in trades.iter().enumerate() {
            let key = trade.group_key();
            let slot = *group_index.entry(key.clone()).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(idx);
        }
        log::debug!("partitioned {} trades into {} groups", trades.len(), groups.len());

        for (_, indices) in &groups {
            Self::net_group(&mut trades, indices);
        }

        let summaries = groups
            .into_iter()
            .map(|(key, indices)| summarize(key, &trades, &indices))
            .collect();

        log::info!(
            "netted {} paper trades in {:.2?}",
            trades.len(),
            start.elapsed()
        );

        NettingResult {
            trades,
            groups: summaries,
        }
    }

    fn net_group(trades: &mut [PaperTrade], indices: &[usize]) {
        let mut queue: VecDeque<OpenLot> = VecDeque::new();

        for &idx in indices {
            let volume = trades[idx].volume();
            if volume.abs() < EPSILON {
                trades[idx].net_open_volume = Decimal::ZERO;
                continue;
            }
            let sign = volume.signum();
            let mut remaining = volume;

            while let Some(front) = queue.front_mut() {
                if front.sign == sign {
                    break;
                }

                let offset = remaining.abs().min(front.remaining.abs());
                remaining -= sign * offset;
                front.remaining -= front.sign * offset;
                let lot = *front;

                let event = CloseEvent {
                    ticket: trades[idx].ticket().to_string(),
                    date: trades[idx].trade_date(),
                    volume: offset,
                    price: trades[idx].price(),
                };
                let closed = &mut trades[lot.trade];
                closed.close_events.push(event);
                closed.closed_volume += offset;
                closed.net_open_volume = lot.remaining;

                let incoming = &mut trades[idx];
                incoming.closed_volume += offset;
                incoming.net_open_volume = remaining;

                if lot.remaining.abs() < EPSILON {
                    queue.pop_front();
                }
                if remaining.abs() < EPSILON {
                    break;
                }
            }

            if remaining.abs() >= EPSILON {
                queue.push_back(OpenLot {
                    trade: idx,
                    remaining,
                    sign,
                });
            }
        }
    }
}

fn summarize(key: GroupKey, trades: &[PaperTrade], indices: &[usize]) -> GroupSummary {
    let mut summary = GroupSummary {
        key,
        trade_count: indices.len(),
        gross_volume: Decimal::ZERO,
        net_open: Decimal::ZERO,
        open_volume: Decimal::ZERO,
        closed_volume: Decimal::ZERO,
    };
    for &idx in indices {
        let trade = &trades[idx];
        summary.gross_volume += trade.volume().abs();
        summary.net_open += trade.net_open_volume();
        summary.open_volume += trade.net_open_volume().abs();
        summary.closed_volume += trade.close_events().iter().map(|e| e.volume).sum::<Decimal>();
    }
    summary
}

impl std::fmt::Display for NettingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Netting Result ===")?;
        writeln!(f, "Trades:         {}", self.trades.len())?;
        writeln!(f, "Groups:         {}", self.groups.len())?;
        writeln!(f, "Gross Volume:   {}", self.gross_volume())?;
        writeln!(f, "Open Volume:    {}", self.open_volume())?;
        writeln!(f, "Conserved:      {}", self.is_conserved())?;

        for group in &self.groups {
            writeln!(f, "\n--- {} ---", group.key)?;
            writeln!(f, "  Trades:   {}", group.trade_count)?;
            writeln!(f, "  Gross:    {}", group.gross_volume)?;
            writeln!(f, "  Closed:   {}", group.closed_volume)?;
            writeln!(f, "  Net Open: {}", group.net_open)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn trade(ticket: &str, day: u32, commodity: &str, volume: Decimal) -> PaperTrade {
        PaperTrade::new(
            ticket,
            NaiveDate::from_ymd_opt(2024, 1, day),
            commodity,
            "JAN 24",
            volume,
            Decimal::from(70 + day),
        )
    }

    fn by_ticket<'a>(result: &'a NettingResult, ticket: &str) -> &'a PaperTrade {
        result.trades().iter().find(|t| t.ticket() == ticket).unwrap()
    }

    #[test]
    fn test_fifo_partial_then_full() {
        let trades = vec![
            trade("D1", 1, "BRENT", dec!(100)),
            trade("D2", 2, "BRENT", dec!(-60)),
            trade("D3", 3, "BRENT", dec!(-50)),
        ];
        let result = NettingEngine::net_positions(&trades);

        let d1 = by_ticket(&result, "D1");
        assert_eq!(d1.net_open_volume(), Decimal::ZERO);
        assert_eq!(d1.closed_volume(), dec!(100));
        assert_eq!(d1.close_events().len(), 2);
        assert_eq!(d1.close_events()[0].ticket, "D2");
        assert_eq!(d1.close_events()[0].volume, dec!(60));
        assert_eq!(d1.close_events()[0].price, dec!(72));
        assert_eq!(d1.close_events()[1].ticket, "D3");
        assert_eq!(d1.close_events()[1].volume, dec!(40));

        let d2 = by_ticket(&result, "D2");
        assert_eq!(d2.net_open_volume(), Decimal::ZERO);
        assert_eq!(d2.closed_volume(), dec!(60));
        assert!(d2.close_events().is_empty());

        let d3 = by_ticket(&result, "D3");
        assert_eq!(d3.net_open_volume(), dec!(-10));
        assert_eq!(d3.closed_volume(), dec!(40));
        assert!(result.is_conserved());
    }

    #[test]
    fn test_input_order_irrelevant() {
        let trades = vec![
            trade("D3", 3, "BRENT", dec!(-50)),
            trade("D1", 1, "BRENT", dec!(100)),
            trade("D2", 2, "BRENT", dec!(-60)),
        ];
        let result = NettingEngine::net_positions(&trades);
        assert_eq!(by_ticket(&result, "D1").net_open_volume(), Decimal::ZERO);
        assert_eq!(by_ticket(&result, "D3").net_open_volume(), dec!(-10));
        let order: Vec<&str> = result.trades().iter().map(|t| t.ticket()).collect();
        assert_eq!(order, vec!["D1", "D2", "D3"]);
    }

    #[test]
    fn test_same_sign_lots_queue_up() {
        let trades = vec![
            trade("A", 1, "BRENT", dec!(30)),
            trade("B", 2, "BRENT", dec!(20)),
            trade("C", 3, "BRENT", dec!(-40)),
        ];
        let result = NettingEngine::net_positions(&trades);
        assert_eq!(by_ticket(&result, "A").net_open_volume(), Decimal::ZERO);
        assert_eq!(by_ticket(&result, "B").net_open_volume(), dec!(10));
        assert_eq!(by_ticket(&result, "B").closed_volume(), dec!(10));
        assert_eq!(by_ticket(&result, "C").net_open_volume(), Decimal::ZERO);
        assert_eq!(by_ticket(&result, "C").closed_volume(), dec!(40));
    }

    #[test]
    fn test_groups_do_not_cross() {
        let trades = vec![
            trade("B1", 1, "BRENT", dec!(100)),
            trade("W1", 2, "WTI", dec!(-100)),
            PaperTrade::new("B2", NaiveDate::from_ymd_opt(2024, 1, 3), "BRENT", "FEB 24", dec!(-100), dec!(1)),
        ];
        let result = NettingEngine::net_positions(&trades);
        assert_eq!(result.groups().len(), 3);
        for t in result.trades() {
            assert_eq!(t.net_open_volume(), t.volume());
            assert!(t.close_events().is_empty());
        }
    }

    #[test]
    fn test_zero_volume_skipped() {
        let trades = vec![
            trade("Z", 1, "BRENT", dec!(0.00001)),
            trade("L", 2, "BRENT", dec!(10)),
            trade("S", 3, "BRENT", dec!(-10)),
        ];
        let result = NettingEngine::net_positions(&trades);
        let z = by_ticket(&result, "Z");
        assert_eq!(z.net_open_volume(), Decimal::ZERO);
        assert_eq!(z.closed_volume(), Decimal::ZERO);
        assert!(z.close_events().is_empty());
        assert_eq!(by_ticket(&result, "L").net_open_volume(), Decimal::ZERO);
    }

    #[test]
    fn test_undated_trades_sort_last() {
        let undated = PaperTrade::new("U", None, "BRENT", "JAN 24", dec!(-100), dec!(1));
        let trades = vec![undated, trade("L1", 5, "BRENT", dec!(50)), trade("S1", 6, "BRENT", dec!(-20))];
        let result = NettingEngine::net_positions(&trades);
        assert_eq!(result.trades().last().unwrap().ticket(), "U");
        // S1 closes 20 of L1 first, the undated short takes the remaining 30.
        let l1 = by_ticket(&result, "L1");
        assert_eq!(l1.close_events()[0].ticket, "S1");
        assert_eq!(l1.close_events()[1].ticket, "U");
        assert_eq!(l1.close_events()[1].date, None);
        assert_eq!(by_ticket(&result, "U").net_open_volume(), dec!(-70));
    }

    #[test]
    fn test_close_path_lists_undated_closes_first() {
        let undated = PaperTrade::new("U", None, "BRENT", "JAN 24", dec!(-100), dec!(1));
        let trades = vec![undated, trade("L1", 5, "BRENT", dec!(50)), trade("S1", 6, "BRENT", dec!(-20))];
        let result = NettingEngine::net_positions(&trades);

        let path = by_ticket(&result, "L1").close_path();
        assert!(path.description.starts_with("[N/A Tkt#U"));
        assert_eq!(
            path.description,
            "[N/A Tkt#U Vol:30 @1] -> [2024-01-06 Tkt#S1 Vol:20 @76]"
        );
        assert_eq!(path.volume, dec!(50));
        // (30 * 1 + 20 * 76) / 50
        assert_eq!(path.weighted_price, dec!(31));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let trades = vec![
            trade("D1", 1, "BRENT", dec!(100)),
            trade("D2", 2, "BRENT", dec!(-60)),
            trade("D3", 3, "BRENT", dec!(-50)),
            trade("D4", 4, "DUBAI", dec!(25)),
        ];
        let first = NettingEngine::net_positions(&trades);
        let second = NettingEngine::net_positions(first.trades());
        for (a, b) in first.trades().iter().zip(second.trades()) {
            assert_eq!(a.net_open_volume(), b.net_open_volume());
            assert_eq!(a.closed_volume(), b.closed_volume());
            assert_eq!(a.close_events(), b.close_events());
        }
    }

    #[test]
    fn test_group_summary() {
        let trades = vec![
            trade("D1", 1, "BRENT", dec!(100)),
            trade("D2", 2, "BRENT", dec!(-60)),
            trade("D3", 3, "BRENT", dec!(-50)),
        ];
        let result = NettingEngine::net_positions(&trades);
        let group = &result.groups()[0];
        assert_eq!(group.key.as_str(), "BRENT_JAN 24");
        assert_eq!(group.trade_count, 3);
        assert_eq!(group.gross_volume, dec!(210));
        assert_eq!(group.closed_volume, dec!(100));
        assert_eq!(group.net_open, dec!(-10));
        assert_eq!(result.open_volume(), dec!(10));
    }

    #[test]
    fn test_empty_book() {
        let result = NettingEngine::net_positions(&[]);
        assert!(result.trades().is_empty());
        assert!(result.groups().is_empty());
        assert_eq!(result.gross_volume(), Decimal::ZERO);
        assert!(result.is_conserved());
    }
}
