//! Target module - turns target weights into target values.

mod target_normalizer;
mod targets_model;

pub use target_normalizer::*;
pub use targets_model::*;

#[cfg(test)]
mod target_normalizer_tests;
