use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, ValidationError};

/// Policy selecting which gaps are eligible and where capital comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RebalanceMode {
    /// Shift money between existing holdings; buys always equal sells.
    #[default]
    #[serde(alias = "existing", alias = "EXISTING_ONLY")]
    ExistingOnly,
    /// Invest new capital into under-weight items only; never sells.
    #[serde(alias = "new", alias = "NEW_ONLY")]
    NewOnly,
    /// Close every gap fully, buying and selling as needed.
    #[serde(alias = "NEW_WITH_SELLS")]
    NewWithSells,
}

impl RebalanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebalanceMode::ExistingOnly => "existing-only",
            RebalanceMode::NewOnly => "new-only",
            RebalanceMode::NewWithSells => "new-with-sells",
        }
    }

    /// Whether this mode brings the user's investment amount into play.
    pub fn uses_new_capital(&self) -> bool {
        !matches!(self, RebalanceMode::ExistingOnly)
    }
}

impl fmt::Display for RebalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "existing-only" | "existing" => Ok(RebalanceMode::ExistingOnly),
            "new-only" | "new" => Ok(RebalanceMode::NewOnly),
            "new-with-sells" => Ok(RebalanceMode::NewWithSells),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown rebalance mode '{}'",
                other
            )))),
        }
    }
}

/// Direction of a gap after applying the dead zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GapClass {
    Balanced,
    NeedsBuy,
    NeedsSell,
}

/// Why an item received no action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludedReason {
    /// Gap inside the dead zone.
    AtTarget,
    /// Under-weight position inside a category that is already at or above target.
    CategoryAboveTarget,
    /// Over-weight item in a mode that never sells.
    AtOrAboveTarget,
}

/// Input to the policy engine: one item with its current and target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyItem {
    pub current: Decimal,
    pub target: Decimal,
    /// False when an outer level (the category) forbids buying this item.
    pub buy_allowed: bool,
}

impl PolicyItem {
    pub fn new(current: Decimal, target: Decimal) -> Self {
        Self {
            current,
            target,
            buy_allowed: true,
        }
    }

    pub fn with_buy_allowed(mut self, allowed: bool) -> Self {
        self.buy_allowed = allowed;
        self
    }
}

/// Policy result for a single item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAction {
    pub gap: Decimal,
    pub class: GapClass,
    /// Signed amount: positive buys, negative sells.
    pub action: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excluded_reason: Option<ExcludedReason>,
}

/// Policy result for a whole pool of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyOutcome {
    pub mode: RebalanceMode,
    pub items: Vec<ItemAction>,
    pub total_positive_gap: Decimal,
    pub total_negative_gap: Decimal,
    /// Capital moved by the policy: the larger of the buy and sell totals in
    /// existing-only (`min(P, N)` without a parent flow), the new capital in
    /// new-only, the sum of buys in new-with-sells.
    pub distributed_amount: Decimal,
}

impl PolicyOutcome {
    pub fn total_action(&self) -> Decimal {
        self.items.iter().map(|i| i.action).sum()
    }

    pub fn total_buys(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.action > Decimal::ZERO)
            .map(|i| i.action)
            .sum()
    }

    pub fn total_sells(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.action < Decimal::ZERO)
            .map(|i| -i.action)
            .sum()
    }
}
