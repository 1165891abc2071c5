//! Hierarchical roll-up of position actions and the cross-level consistency check.

use log::warn;
use rust_decimal::Decimal;

use crate::constants::CONSISTENCY_TOLERANCE;
use crate::utils::format_currency;

use super::{CategoryAllocation, ConsistencyWarning, PositionAllocation};

/// Category-level totals derived from its positions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryTotals {
    pub action: Decimal,
    pub value_after: Decimal,
}

pub fn sum_positions(positions: &[PositionAllocation]) -> CategoryTotals {
    positions
        .iter()
        .fold(CategoryTotals::default(), |acc, p| CategoryTotals {
            action: acc.action + p.action,
            value_after: acc.value_after + p.value_after,
        })
}

/// Portfolio totals: every category counts, expanded or not.
pub fn sum_categories(categories: &[CategoryAllocation]) -> CategoryTotals {
    categories
        .iter()
        .fold(CategoryTotals::default(), |acc, c| CategoryTotals {
            action: acc.action + c.action,
            value_after: acc.value_after + c.value_after,
        })
}

/// Compares the position-level roll-up with the portfolio-level action.
///
/// A mismatch beyond [`CONSISTENCY_TOLERANCE`] is logged and returned; it
/// never stops the computation.
pub fn check_consistency(
    portfolio: &str,
    portfolio_action: Decimal,
    position_total: Decimal,
) -> Option<ConsistencyWarning> {
    let difference = (position_total - portfolio_action).abs();
    if difference <= CONSISTENCY_TOLERANCE {
        return None;
    }
    warn!(
        "Allocation mismatch for portfolio {}: positions total {} but portfolio action is {} (difference {})",
        portfolio,
        format_currency(Some(position_total), ""),
        format_currency(Some(portfolio_action), ""),
        format_currency(Some(difference), "")
    );
    Some(ConsistencyWarning {
        portfolio: portfolio.to_string(),
        portfolio_action,
        position_total,
        difference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_check_consistency_within_tolerance() {
        assert!(check_consistency("A", dec!(100), dec!(100.1)).is_none());
        assert!(check_consistency("A", dec!(100), dec!(99.95)).is_none());
    }

    #[test]
    fn test_check_consistency_reports_mismatch() {
        let warning = check_consistency("A", dec!(100), dec!(99.5)).unwrap();
        assert_eq!(warning.portfolio, "A");
        assert_eq!(warning.difference, dec!(0.5));
    }
}
