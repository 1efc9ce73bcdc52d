pub mod allocation;
pub mod exposure;
pub mod netting;
