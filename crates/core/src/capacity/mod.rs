//! Capacity module - country x category allocation simulator based on
//! iterative proportional fitting.

mod capacity_model;
mod capacity_service;
mod ipf;

pub use capacity_model::*;
pub use capacity_service::*;
pub use ipf::*;
