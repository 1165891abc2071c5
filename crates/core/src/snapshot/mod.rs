//! Portfolio snapshot module - input data model and providers.

mod snapshot_model;
mod snapshot_providers;
mod snapshot_traits;

pub use snapshot_model::*;
pub use snapshot_providers::*;
pub use snapshot_traits::*;

#[cfg(test)]
mod snapshot_model_tests;
