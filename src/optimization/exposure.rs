use crate::core::cargo::CargoId;
use crate::core::trade::EPSILON;
use crate::optimization::allocation::AllocationResult;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Residual risk left after an allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureReport {
    /// Sum of |volume| over all cargoes.
    pub physical_volume: Decimal,
    /// Physical volume covered by paper.
    pub hedged_volume: Decimal,
    /// Physical volume still exposed.
    pub unhedged_volume: Decimal,
    pub relation_count: usize,
    /// Cargoes with remaining need, signed like the cargo.
    pub unhedged_cargoes: Vec<(CargoId, Decimal)>,
    /// Paper tickets with net-open volume not assigned to any cargo.
    pub open_paper: Vec<(String, Decimal)>,
}

impl ExposureReport {
    pub fn from_allocation(result: &AllocationResult) -> Self {
        let mut physical_volume = Decimal::ZERO;
        let mut unhedged_volume = Decimal::ZERO;
        let mut unhedged_cargoes = Vec::new();

        for cargo in &result.cargoes {
            physical_volume += cargo.volume().abs();
            unhedged_volume += cargo.unhedged_volume().abs();
            if cargo.unhedged_volume().abs() >= EPSILON {
                unhedged_cargoes.push((cargo.id().clone(), cargo.unhedged_volume()));
            }
        }

        let open_paper = result
            .paper
            .iter()
            .filter(|t| t.unallocated_volume().abs() >= EPSILON)
            .map(|t| (t.ticket().to_string(), t.unallocated_volume()))
            .collect();

        ExposureReport {
            physical_volume,
            hedged_volume: physical_volume - unhedged_volume,
            unhedged_volume,
            relation_count: result.relations.len(),
            unhedged_cargoes,
            open_paper,
        }
    }

    /// Share of physical volume that is hedged.
    pub fn hedge_ratio(&self) -> f64 {
        if self.physical_volume == Decimal::ZERO {
            return 0.0;
        }
        let ratio = self.hedged_volume / self.physical_volume;
        ratio.to_string().parse::<f64>().unwrap_or(0.0)
    }

    /// Net-open paper volume left over, summed by magnitude.
    pub fn open_paper_volume(&self) -> Decimal {
        self.open_paper.iter().map(|(_, v)| v.abs()).sum()
    }
}

impl std::fmt::Display for ExposureReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Exposure Report ===")?;
        writeln!(f, "Physical Volume:  {}", self.physical_volume)?;
        writeln!(f, "Hedged Volume:    {}", self.hedged_volume)?;
        writeln!(f, "Unhedged Volume:  {}", self.unhedged_volume)?;
        writeln!(f, "Hedge Ratio:      {:.1}%", self.hedge_ratio() * 100.0)?;
        writeln!(f, "Relations:        {}", self.relation_count)?;

        writeln!(f, "\nUnhedged Cargoes:")?;
        for (cargo, residual) in &self.unhedged_cargoes {
            writeln!(f, "  {} needs {}", cargo, residual)?;
        }

        writeln!(f, "\nOpen Paper:")?;
        for (ticket, residual) in &self.open_paper {
            writeln!(f, "  Tkt#{} has {} unallocated", ticket, residual)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cargo::Cargo;
    use crate::core::trade::PaperTrade;
    use crate::optimization::allocation::AllocationEngine;
    use crate::optimization::netting::NettingEngine;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_exposure_partial_hedge() {
        let paper = vec![
            PaperTrade::new("T1", NaiveDate::from_ymd_opt(2024, 1, 1), "BRENT", "JAN 24", dec!(300), dec!(80)),
            PaperTrade::new("T2", NaiveDate::from_ymd_opt(2024, 1, 2), "DUBAI", "JAN 24", dec!(-50), dec!(79)),
        ];
        let cargoes = vec![
            Cargo::new("C1", dec!(200), "BRENT", "JAN 24"),
            Cargo::new("C2", dec!(-200), "BRENT", "JAN 24"),
        ];

        let netted = NettingEngine::net_positions(&paper);
        let result = AllocationEngine::default().allocate(&cargoes, netted.trades());
        let report = ExposureReport::from_allocation(&result);

        assert_eq!(report.physical_volume, dec!(400));
        assert_eq!(report.hedged_volume, dec!(300));
        assert_eq!(report.unhedged_volume, dec!(100));
        assert_eq!(report.relation_count, 2);
        assert_eq!(report.unhedged_cargoes, vec![(CargoId::new("C2"), dec!(-100))]);
        assert_eq!(report.open_paper, vec![("T2".to_string(), dec!(-50))]);
        assert_eq!(report.open_paper_volume(), dec!(50));
        assert_relative_eq!(report.hedge_ratio(), 0.75, epsilon = 1e-9);
    }

    #[test]
    fn test_exposure_empty() {
        let result = AllocationEngine::default().allocate(&[], &[]);
        let report = ExposureReport::from_allocation(&result);
        assert_eq!(report.physical_volume, Decimal::ZERO);
        assert_eq!(report.hedge_ratio(), 0.0);
        assert!(report.unhedged_cargoes.is_empty());
        assert!(format!("{}", report).contains("Exposure Report"));
    }
}
