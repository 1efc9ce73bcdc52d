pub mod cargo;
pub mod contract;
pub mod relation;
pub mod table;
pub mod trade;
