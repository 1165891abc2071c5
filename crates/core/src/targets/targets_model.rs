use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::{Category, Portfolio, Position};
use crate::utils::saturating_sum;

/// Where a position's target comes from, resolved once before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TargetSource {
    /// Absolute value already capped by the backend; final, never renormalized.
    BackendConstrained(Decimal),
    /// Raw percentage weight, subject to normalization.
    Derived(Decimal),
}

/// How a derived weight was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeightOrigin {
    Backend,
    Explicit,
    Builder,
    PlaceholderDefault,
    EqualShare,
}

/// Target of one portfolio in the across-portfolios view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTarget {
    pub name: String,
    pub current_value: Decimal,
    /// Weight after normalization across portfolios (percent).
    pub target_weight: Decimal,
    pub target_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct NormalizedPosition<'a> {
    pub position: &'a Position,
    pub source: TargetSource,
    pub origin: WeightOrigin,
    /// Percent of the portfolio target after normalization.
    pub target_allocation: Decimal,
    pub target_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct NormalizedCategory<'a> {
    pub category: &'a Category,
    pub positions: Vec<NormalizedPosition<'a>>,
}

impl NormalizedCategory<'_> {
    pub fn current_value(&self) -> Decimal {
        self.category.current_value()
    }

    pub fn target_allocation(&self) -> Decimal {
        saturating_sum(self.positions.iter().map(|p| p.target_allocation))
    }

    pub fn target_value(&self) -> Decimal {
        self.positions.iter().map(|p| p.target_value).sum()
    }

    /// Aggregate category gap (`target - current`).
    pub fn gap(&self) -> Decimal {
        self.target_value() - self.current_value()
    }
}

/// A portfolio with every position's target resolved.
#[derive(Debug, Clone)]
pub struct NormalizedPortfolio<'a> {
    pub portfolio: &'a Portfolio,
    pub target_value: Decimal,
    pub categories: Vec<NormalizedCategory<'a>>,
    pub has_backend_constrained_values: bool,
    /// Factor applied to derived weights; 1 when backend values are present.
    pub normalization_factor: Decimal,
    pub shows_missing_positions: bool,
}

impl<'a> NormalizedPortfolio<'a> {
    pub fn positions(&self) -> impl Iterator<Item = &NormalizedPosition<'a>> + '_ {
        self.categories.iter().flat_map(|c| c.positions.iter())
    }

    pub fn total_target_allocation(&self) -> Decimal {
        saturating_sum(self.categories.iter().map(|c| c.target_allocation()))
    }
}
