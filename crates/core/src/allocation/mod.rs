//! Allocation module - the full computation pipeline from snapshot to
//! per-portfolio, per-category and per-position actions.

mod aggregation;
mod allocation_model;
mod allocation_service;
mod allocator;

pub use aggregation::*;
pub use allocation_model::*;
pub use allocation_service::*;
pub use allocator::*;
