//! Capacity simulator input and output models.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_IPF_MAX_ITERATIONS, DEFAULT_IPF_TOLERANCE};
use crate::utils::{lenient_decimal, lenient_opt_decimal};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityPosition {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryExposure {
    pub country: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_invested: Decimal,
    #[serde(default)]
    pub positions: Vec<CapacityPosition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryExposure {
    pub category: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_invested: Decimal,
    #[serde(default)]
    pub positions: Vec<CapacityPosition>,
}

/// Concentration limits in percent of total investable capital.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityRules {
    #[serde(default, alias = "max_per_country", deserialize_with = "lenient_opt_decimal")]
    pub max_per_country: Option<Decimal>,
    #[serde(default, alias = "max_per_category", deserialize_with = "lenient_opt_decimal")]
    pub max_per_category: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapacityInput {
    #[serde(default)]
    pub countries: Vec<CountryExposure>,
    #[serde(default)]
    pub categories: Vec<CategoryExposure>,
    #[serde(default)]
    pub rules: CapacityRules,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_investable_capital: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub available_to_invest: Decimal,
}

/// The two independent slider vectors chosen by the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityTargets {
    #[serde(default)]
    pub country_targets: HashMap<String, Decimal>,
    #[serde(default)]
    pub category_targets: HashMap<String, Decimal>,
}

/// Iteration limits for the fitting loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpfConfig {
    pub max_iterations: usize,
    /// Stop once the largest single-cell change in a round drops below this.
    pub tolerance: Decimal,
}

impl Default for IpfConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_IPF_MAX_ITERATIONS,
            tolerance: DEFAULT_IPF_TOLERANCE,
        }
    }
}

/// Existing holdings at one country/category intersection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionCell {
    pub positions: Vec<String>,
    pub total_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityCell {
    pub country: String,
    pub category: String,
    pub amount: Decimal,
    /// False for intersections without any existing position; such cells are
    /// structurally zero.
    pub populated: bool,
    pub positions: Vec<String>,
}

/// One row or column of the simulation with its limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityLimit {
    pub name: String,
    pub current_invested: Decimal,
    /// `None` when no rule caps this dimension.
    pub max_allowed: Option<Decimal>,
    pub remaining_capacity: Option<Decimal>,
    /// Slider value after clamping to `[0, max_allowed]`.
    pub target: Decimal,
    /// Sum of the fitted cells in this row/column.
    pub allocated: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityMatrix {
    pub cells: Vec<CapacityCell>,
    pub countries: Vec<CapacityLimit>,
    pub categories: Vec<CapacityLimit>,
    pub country_total: Decimal,
    pub category_total: Decimal,
    pub total_allocated: Decimal,
    pub available_to_invest: Decimal,
    /// Country and category targets disagree; reported, not reconciled.
    pub totals_mismatch: bool,
    pub exceeds_available: bool,
    pub iterations: usize,
    pub converged: bool,
}

impl CapacityMatrix {
    pub fn cell(&self, country: &str, category: &str) -> Option<&CapacityCell> {
        self.cells
            .iter()
            .find(|c| c.country == country && c.category == category)
    }
}
