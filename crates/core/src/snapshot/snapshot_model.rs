//! Snapshot domain models as delivered by the external data provider.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{MAX_AMOUNT, MAX_WEIGHT, MISSING_POSITIONS_CATEGORY};
use crate::errors::{Error, Result, SnapshotError};
use crate::utils::{lenient_count, lenient_decimal, lenient_opt_decimal};

/// Instrument type of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentType {
    #[serde(alias = "stock", alias = "STOCK")]
    Stock,
    #[serde(rename = "ETF", alias = "etf", alias = "Etf")]
    Etf,
    #[serde(other)]
    Other,
}

/// A single holding inside a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_value: Decimal,
    #[serde(default, rename = "investment_type", alias = "investmentType")]
    pub investment_type: Option<InvestmentType>,
    /// Target weight in percent of the portfolio, user- or builder-supplied.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub target_allocation: Option<Decimal>,
    /// Absolute target already constrained by per-asset-class caps.
    #[serde(default, deserialize_with = "lenient_opt_decimal")]
    pub target_value: Option<Decimal>,
    #[serde(default, rename = "is_capped", alias = "isCapped")]
    pub is_capped: bool,
    #[serde(
        default,
        rename = "unconstrained_target_value",
        alias = "unconstrainedTargetValue",
        deserialize_with = "lenient_opt_decimal"
    )]
    pub unconstrained_target_value: Option<Decimal>,
    #[serde(default)]
    pub is_placeholder: bool,
    /// On a placeholder, the number of real future positions it stands for.
    #[serde(default, deserialize_with = "lenient_count")]
    pub positions_remaining: usize,
}

impl Position {
    pub fn new(name: &str, current_value: Decimal) -> Self {
        Self {
            name: name.to_string(),
            current_value,
            investment_type: None,
            target_allocation: None,
            target_value: None,
            is_capped: false,
            unconstrained_target_value: None,
            is_placeholder: false,
            positions_remaining: 0,
        }
    }
}

/// A named group of positions within a portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub positions: Vec<Position>,
}

impl Category {
    pub fn current_value(&self) -> Decimal {
        self.positions.iter().map(|p| p.current_value).sum()
    }

    /// Whether this is the reserved placeholder category.
    pub fn is_missing_positions(&self) -> bool {
        self.name == MISSING_POSITIONS_CATEGORY
    }
}

/// Reference weight from the external allocation builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuilderPosition {
    #[serde(default)]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub weight: Decimal,
    #[serde(default)]
    pub is_placeholder: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_value: Decimal,
    /// Target weight in percent across portfolios; 0 when unset.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub target_weight: Decimal,
    #[serde(default, deserialize_with = "lenient_count")]
    pub min_positions: usize,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub builder_positions: Vec<BuilderPosition>,
}

impl Portfolio {
    /// Sum of position values, falling back to the declared value for
    /// portfolios delivered without positions.
    pub fn effective_current_value(&self) -> Decimal {
        let has_positions = self.categories.iter().any(|c| !c.positions.is_empty());
        if has_positions {
            self.categories.iter().map(Category::current_value).sum()
        } else {
            self.current_value
        }
    }

    /// Number of real (non-placeholder) positions outside the placeholder category.
    pub fn real_position_count(&self) -> usize {
        self.categories
            .iter()
            .filter(|c| !c.is_missing_positions())
            .flat_map(|c| c.positions.iter())
            .filter(|p| !p.is_placeholder)
            .count()
    }

    /// Sum of builder weights that refer to real companies.
    pub fn real_builder_weight(&self) -> Decimal {
        self.builder_positions
            .iter()
            .filter(|b| !b.is_placeholder)
            .map(|b| b.weight)
            .sum()
    }

    pub fn builder_placeholder(&self) -> Option<&BuilderPosition> {
        self.builder_positions.iter().find(|b| b.is_placeholder)
    }

    /// Looks up a builder weight by company name (case-insensitive).
    pub fn builder_weight_for(&self, name: &str) -> Option<Decimal> {
        let needle = name.trim();
        self.builder_positions
            .iter()
            .filter(|b| !b.is_placeholder)
            .find(|b| b.company_name.trim().eq_ignore_ascii_case(needle))
            .map(|b| b.weight)
    }

}

/// A complete snapshot of every portfolio, loaded in one piece.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub portfolios: Vec<Portfolio>,
}

impl PortfolioSnapshot {
    pub fn new(portfolios: Vec<Portfolio>) -> Result<Self> {
        let snapshot = Self { portfolios };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Parses a JSON payload. Fails without side effects when the payload has
    /// no `portfolios` array or any portfolio is malformed.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        match value.get("portfolios") {
            Some(Value::Array(_)) => {}
            _ => return Err(SnapshotError::MissingPortfolios.into()),
        }
        let snapshot: PortfolioSnapshot = serde_json::from_value(value)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Rejects empty or duplicate portfolio names and any amount or weight
    /// outside the supported range.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for portfolio in &self.portfolios {
            if portfolio.name.trim().is_empty() {
                return Err(Error::Snapshot(SnapshotError::Malformed(
                    "Portfolio name cannot be empty".to_string(),
                )));
            }
            if !seen.insert(portfolio.name.as_str()) {
                return Err(Error::Snapshot(SnapshotError::Malformed(format!(
                    "Duplicate portfolio '{}'",
                    portfolio.name
                ))));
            }
            check_range(&portfolio.name, "currentValue", portfolio.current_value, MAX_AMOUNT)?;
            check_range(&portfolio.name, "targetWeight", portfolio.target_weight, MAX_WEIGHT)?;
            for builder in &portfolio.builder_positions {
                check_range(&builder.company_name, "weight", builder.weight, MAX_WEIGHT)?;
            }
            for position in portfolio.categories.iter().flat_map(|c| c.positions.iter()) {
                let name = position.name.as_str();
                check_range(name, "currentValue", position.current_value, MAX_AMOUNT)?;
                if let Some(allocation) = position.target_allocation {
                    check_range(name, "targetAllocation", allocation, MAX_WEIGHT)?;
                }
                if let Some(value) = position.target_value {
                    check_range(name, "targetValue", value, MAX_AMOUNT)?;
                }
                if let Some(value) = position.unconstrained_target_value {
                    check_range(name, "unconstrainedTargetValue", value, MAX_AMOUNT)?;
                }
            }
        }
        Ok(())
    }

    pub fn find_portfolio(&self, name: &str) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.name == name)
    }
}

fn check_range(owner: &str, field: &str, value: Decimal, limit: Decimal) -> Result<()> {
    if value.abs() > limit {
        return Err(Error::Snapshot(SnapshotError::Malformed(format!(
            "{} of '{}' is out of range: {}",
            field, owner, value
        ))));
    }
    Ok(())
}
