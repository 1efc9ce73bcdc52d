//! # hedge-engine
//!
//! Paper-to-physical hedge matching for a commodity back office.
//!
//! Given a ledger of paper (derivative) tickets and a ledger of physical
//! cargoes, this engine nets offsetting paper FIFO within each
//! commodity/contract-month group, then allocates the remaining open
//! paper to cargoes in priority order.
//!
//! ## Architecture
//!
//! - **core**: Domain types: paper trades, cargoes, hedge relations,
//!   contract-month normalization and the record-table boundary
//! - **optimization**: FIFO netting, hedge allocation, exposure reporting
//! - **simulation**: Random book generation for load testing

pub mod core;
pub mod optimization;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::cargo::{Cargo, CargoId, Direction};
    pub use crate::core::contract::ContractMonth;
    pub use crate::core::relation::HedgeRelation;
    pub use crate::core::trade::{CloseEvent, PaperTrade};
    pub use crate::optimization::allocation::{
        AllocationEngine, AllocationPolicy, AllocationResult, BenchmarkTiers, DirectionPolicy,
    };
    pub use crate::optimization::exposure::ExposureReport;
    pub use crate::optimization::netting::{NettingEngine, NettingResult};
}
