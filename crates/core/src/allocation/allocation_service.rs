//! The allocation pipeline.
//!
//! Stages run over an immutable snapshot, each producing a new structure:
//! portfolio targets -> portfolio-level policy -> position targets ->
//! position-level policy -> roll-up -> consistency check.

use log::debug;
use rust_decimal::Decimal;

use crate::constants::MAX_AMOUNT;
use crate::errors::{Error, Result, ValidationError};
use crate::rebalancing::{apply_nested_policy, apply_policy, PolicyItem, RebalanceMode};
use crate::snapshot::{Portfolio, PortfolioSnapshot};
use crate::targets::{normalize_portfolio, normalize_portfolio_targets, NormalizedPortfolio};

use super::{
    category_key, check_consistency, sum_categories, sum_positions, AllocationResult,
    AllocatorState, CategoryAllocation, PortfolioAction, PortfolioBreakdown, PositionAllocation,
};

/// Computes actions for every portfolio and the position-level breakdown of
/// `selected_portfolio` (the first portfolio when `None`).
pub fn compute_allocations(
    snapshot: &PortfolioSnapshot,
    mode: RebalanceMode,
    investment_amount: Decimal,
    selected_portfolio: Option<&str>,
) -> Result<AllocationResult> {
    let state = AllocatorState {
        mode,
        investment_amount,
        selected_portfolio: selected_portfolio.map(str::to_string),
        ..Default::default()
    };
    compute_with_state(snapshot, &state)
}

/// Rejects negative amounts and amounts above [`MAX_AMOUNT`].
pub fn validate_investment_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::Validation(ValidationError::NegativeAmount(
            amount.to_string(),
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "Investment amount {} exceeds the maximum of {}",
            amount, MAX_AMOUNT
        ))));
    }
    Ok(())
}

/// Same as [`compute_allocations`], driven by a full [`AllocatorState`].
pub fn compute_with_state(
    snapshot: &PortfolioSnapshot,
    state: &AllocatorState,
) -> Result<AllocationResult> {
    validate_investment_amount(state.investment_amount)?;
    snapshot.validate()?;

    let selected = match state.selected_portfolio.as_deref() {
        Some(name) => Some(snapshot.find_portfolio(name).ok_or_else(|| {
            Error::Validation(ValidationError::UnknownPortfolio(name.to_string()))
        })?),
        None => snapshot.portfolios.first(),
    };

    let portfolios = compute_portfolio_actions(snapshot, state.mode, state.investment_amount);

    let breakdown = match selected {
        Some(portfolio) => {
            let portfolio_action = portfolios
                .iter()
                .find(|p| p.name == portfolio.name)
                .ok_or_else(|| {
                    Error::Unexpected(format!("No portfolio action for {}", portfolio.name))
                })?;
            Some(compute_breakdown(portfolio, portfolio_action, state))
        }
        None => None,
    };

    let warnings = breakdown
        .as_ref()
        .and_then(|b| check_consistency(&b.name, b.portfolio_action, b.total_action))
        .into_iter()
        .collect();

    Ok(AllocationResult {
        mode: state.mode,
        investment_amount: state.investment_amount,
        total_current_value: portfolios.iter().map(|p| p.current_value).sum(),
        total_target_value: portfolios.iter().map(|p| p.target_value).sum(),
        portfolios,
        selected: breakdown,
        warnings,
    })
}

/// Runs the policy across portfolios.
pub fn compute_portfolio_actions(
    snapshot: &PortfolioSnapshot,
    mode: RebalanceMode,
    investment_amount: Decimal,
) -> Vec<PortfolioAction> {
    let targets = normalize_portfolio_targets(snapshot, mode, investment_amount);
    let items: Vec<PolicyItem> = targets
        .iter()
        .map(|t| PolicyItem::new(t.current_value, t.target_value))
        .collect();
    let outcome = apply_policy(mode, &items, investment_amount);

    targets
        .into_iter()
        .zip(outcome.items)
        .map(|(target, item)| PortfolioAction {
            value_after: target.current_value + item.action,
            name: target.name,
            current_value: target.current_value,
            target_weight: target.target_weight,
            target_value: target.target_value,
            discrepancy: item.gap,
            action: item.action,
            excluded_reason: item.excluded_reason,
        })
        .collect()
}

/// Position-level computation for one portfolio.
pub fn compute_breakdown(
    portfolio: &Portfolio,
    portfolio_action: &PortfolioAction,
    state: &AllocatorState,
) -> PortfolioBreakdown {
    let normalized = normalize_portfolio(portfolio, portfolio_action.target_value);
    let categories = allocate_positions(&normalized, state, portfolio_action.action);
    let totals = sum_categories(&categories);

    debug!(
        "Breakdown for {}: {} categories, total action {} vs portfolio action {}",
        portfolio.name,
        categories.len(),
        totals.action,
        portfolio_action.action
    );

    PortfolioBreakdown {
        name: portfolio.name.clone(),
        current_value: portfolio_action.current_value,
        target_value: normalized.target_value,
        has_backend_constrained_values: normalized.has_backend_constrained_values,
        normalization_factor: normalized.normalization_factor,
        shows_missing_positions: normalized.shows_missing_positions,
        categories,
        total_action: totals.action,
        total_value_after: totals.value_after,
        portfolio_action: portfolio_action.action,
    }
}

/// Applies the policy to every position of a normalized portfolio, nested under
/// the portfolio-level action.
///
/// Buys are blocked for positions whose category is already at or above its
/// target, whatever the mode.
fn allocate_positions(
    normalized: &NormalizedPortfolio<'_>,
    state: &AllocatorState,
    portfolio_action: Decimal,
) -> Vec<CategoryAllocation> {
    let items: Vec<PolicyItem> = normalized
        .categories
        .iter()
        .flat_map(|category| {
            let buy_allowed = category.gap() > Decimal::ZERO;
            category.positions.iter().map(move |p| {
                PolicyItem::new(p.position.current_value, p.target_value)
                    .with_buy_allowed(buy_allowed)
            })
        })
        .collect();

    let outcome = apply_nested_policy(state.mode, &items, portfolio_action);
    let mut actions = outcome.items.into_iter();

    normalized
        .categories
        .iter()
        .map(|category| {
            let positions: Vec<PositionAllocation> = category
                .positions
                .iter()
                .zip(actions.by_ref())
                .map(|(p, item)| PositionAllocation {
                    name: p.position.name.clone(),
                    investment_type: p.position.investment_type,
                    current_value: p.position.current_value,
                    target_allocation: p.target_allocation,
                    calculated_target_value: p.target_value,
                    target_source: p.source,
                    weight_origin: p.origin,
                    gap: item.gap,
                    action: item.action,
                    value_after: p.position.current_value + item.action,
                    excluded_reason: item.excluded_reason,
                    is_capped: p.position.is_capped,
                    unconstrained_target_value: p.position.unconstrained_target_value,
                    is_placeholder: p.position.is_placeholder,
                    positions_remaining: p.position.positions_remaining,
                })
                .collect();

            let totals = sum_positions(&positions);
            let key = category_key(&normalized.portfolio.name, &category.category.name);
            CategoryAllocation {
                is_expanded: state.expanded_categories.contains(&key),
                key,
                name: category.category.name.clone(),
                is_missing_positions: category.category.is_missing_positions(),
                current_value: category.current_value(),
                target_allocation: category.target_allocation(),
                calculated_target_value: category.target_value(),
                gap: category.gap(),
                action: totals.action,
                value_after: totals.value_after,
                positions,
            }
        })
        .collect()
}
