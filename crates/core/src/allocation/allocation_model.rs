//! Allocation request, state and result models.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::CATEGORY_KEY_SEPARATOR;
use crate::rebalancing::{ExcludedReason, RebalanceMode};
use crate::snapshot::InvestmentType;
use crate::targets::{TargetSource, WeightOrigin};

/// Everything the computation needs besides the snapshot.
///
/// `expanded_categories` is presentation state: it only toggles the
/// `is_expanded` flag on category results and never changes any number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorState {
    #[serde(default)]
    pub mode: RebalanceMode,
    #[serde(default)]
    pub investment_amount: Decimal,
    #[serde(default)]
    pub selected_portfolio: Option<String>,
    #[serde(default)]
    pub expanded_categories: BTreeSet<String>,
}

impl AllocatorState {
    pub fn new(mode: RebalanceMode, investment_amount: Decimal) -> Self {
        Self {
            mode,
            investment_amount,
            ..Default::default()
        }
    }
}

/// A batch of state changes applied with a single recomputation.
///
/// `selected_portfolio` distinguishes an absent field (keep the selection)
/// from an explicit `null` (reset to the first portfolio).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorUpdate {
    #[serde(default)]
    pub mode: Option<RebalanceMode>,
    #[serde(default)]
    pub investment_amount: Option<Decimal>,
    #[serde(default, with = "serde_with::rust::double_option")]
    pub selected_portfolio: Option<Option<String>>,
    #[serde(default)]
    pub toggle_category: Option<String>,
}

/// Opaque key identifying a category for expand/collapse.
pub fn category_key(portfolio: &str, category: &str) -> String {
    format!("{}{}{}", portfolio, CATEGORY_KEY_SEPARATOR, category)
}

/// Portfolio-level outcome in the across-portfolios view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioAction {
    pub name: String,
    pub current_value: Decimal,
    /// Normalized weight across portfolios (percent).
    pub target_weight: Decimal,
    pub target_value: Decimal,
    /// `target_value - current_value`
    pub discrepancy: Decimal,
    /// Signed capital movement: positive buys, negative sells.
    pub action: Decimal,
    pub value_after: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_reason: Option<ExcludedReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionAllocation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investment_type: Option<InvestmentType>,
    pub current_value: Decimal,
    /// Percent of the portfolio target.
    pub target_allocation: Decimal,
    pub calculated_target_value: Decimal,
    pub target_source: TargetSource,
    pub weight_origin: WeightOrigin,
    pub gap: Decimal,
    pub action: Decimal,
    pub value_after: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_reason: Option<ExcludedReason>,
    pub is_capped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unconstrained_target_value: Option<Decimal>,
    pub is_placeholder: bool,
    pub positions_remaining: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAllocation {
    pub key: String,
    pub name: String,
    pub is_missing_positions: bool,
    pub is_expanded: bool,
    pub current_value: Decimal,
    pub target_allocation: Decimal,
    pub calculated_target_value: Decimal,
    pub gap: Decimal,
    /// Sum of position actions.
    pub action: Decimal,
    /// Sum of position values after the actions.
    pub value_after: Decimal,
    pub positions: Vec<PositionAllocation>,
}

/// Raised when the position-level roll-up disagrees with the portfolio-level action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyWarning {
    pub portfolio: String,
    pub portfolio_action: Decimal,
    pub position_total: Decimal,
    pub difference: Decimal,
}

/// Position-level detail for the selected portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioBreakdown {
    pub name: String,
    pub current_value: Decimal,
    pub target_value: Decimal,
    pub has_backend_constrained_values: bool,
    pub normalization_factor: Decimal,
    pub shows_missing_positions: bool,
    pub categories: Vec<CategoryAllocation>,
    /// Sum of category actions, collapsed categories included.
    pub total_action: Decimal,
    pub total_value_after: Decimal,
    /// The independently computed portfolio-level action.
    pub portfolio_action: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    pub mode: RebalanceMode,
    pub investment_amount: Decimal,
    pub total_current_value: Decimal,
    pub total_target_value: Decimal,
    pub portfolios: Vec<PortfolioAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<PortfolioBreakdown>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConsistencyWarning>,
}

impl AllocationResult {
    pub fn portfolio(&self, name: &str) -> Option<&PortfolioAction> {
        self.portfolios.iter().find(|p| p.name == name)
    }
}
