//! Rebalancing module - gap classification, proportional distribution and the
//! three rebalancing policies.

mod distribution;
mod gap_calculator;
mod rebalancing_model;
mod rebalancing_service;

pub use distribution::*;
pub use gap_calculator::*;
pub use rebalancing_model::*;
pub use rebalancing_service::*;

#[cfg(test)]
mod rebalancing_service_tests;
