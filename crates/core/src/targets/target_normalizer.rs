//! Target normalization for portfolios and their positions.

use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::constants::ONE_HUNDRED;
use crate::rebalancing::RebalanceMode;
use crate::snapshot::{Portfolio, PortfolioSnapshot, Position};
use crate::utils::{percent_of, saturating_sum};

use super::{
    NormalizedCategory, NormalizedPortfolio, NormalizedPosition, PortfolioTarget, TargetSource,
    WeightOrigin,
};

/// Capital base the portfolio weights apply to.
pub fn target_base(snapshot: &PortfolioSnapshot, mode: RebalanceMode, investment: Decimal) -> Decimal {
    let current: Decimal = snapshot
        .portfolios
        .iter()
        .map(Portfolio::effective_current_value)
        .sum();
    if mode.uses_new_capital() {
        current + investment.max(Decimal::ZERO)
    } else {
        current
    }
}

/// Derives every portfolio's target value from its weight.
///
/// Weights are scaled to sum to 100%. When no portfolio has a weight, each
/// target equals the current value so that nothing moves.
pub fn normalize_portfolio_targets(
    snapshot: &PortfolioSnapshot,
    mode: RebalanceMode,
    investment: Decimal,
) -> Vec<PortfolioTarget> {
    let base = target_base(snapshot, mode, investment);
    let weight_sum: Decimal = snapshot
        .portfolios
        .iter()
        .map(|p| p.target_weight.max(Decimal::ZERO))
        .sum();

    snapshot
        .portfolios
        .iter()
        .map(|portfolio| {
            let current_value = portfolio.effective_current_value();
            if weight_sum.is_zero() {
                return PortfolioTarget {
                    name: portfolio.name.clone(),
                    current_value,
                    target_weight: Decimal::ZERO,
                    target_value: current_value,
                };
            }
            let target_weight = percent_of(portfolio.target_weight.max(Decimal::ZERO), weight_sum);
            PortfolioTarget {
                name: portfolio.name.clone(),
                current_value,
                target_weight,
                target_value: base * target_weight / ONE_HUNDRED,
            }
        })
        .collect()
}

/// Whether the synthetic "Missing Positions" category is part of the portfolio.
///
/// Both must hold: fewer real positions than the policy minimum, and builder
/// weights for real companies that round to less than 100%.
pub fn shows_missing_positions(portfolio: &Portfolio) -> bool {
    portfolio.real_position_count() < portfolio.min_positions
        && portfolio
            .real_builder_weight()
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            < ONE_HUNDRED
}

/// Resolves a raw weight for a position without a backend value.
fn resolve_weight(
    portfolio: &Portfolio,
    position: &Position,
    per_slot_placeholder_weight: Option<Decimal>,
) -> Option<(Decimal, WeightOrigin)> {
    if let Some(allocation) = position.target_allocation.filter(|a| *a > Decimal::ZERO) {
        return Some((allocation, WeightOrigin::Explicit));
    }
    if let Some(weight) = portfolio
        .builder_weight_for(&position.name)
        .filter(|w| *w > Decimal::ZERO)
    {
        return Some((weight, WeightOrigin::Builder));
    }
    per_slot_placeholder_weight.map(|per_slot| {
        let slots = if position.is_placeholder {
            position.positions_remaining.max(1)
        } else {
            1
        };
        (per_slot * Decimal::from(slots), WeightOrigin::PlaceholderDefault)
    })
}

/// Resolves and normalizes the targets of every position in `portfolio`.
///
/// Backend-constrained values are authoritative: if any position carries one,
/// no derived weight in the portfolio is rescaled.
pub fn normalize_portfolio<'a>(
    portfolio: &'a Portfolio,
    portfolio_target_value: Decimal,
) -> NormalizedPortfolio<'a> {
    let show_missing = shows_missing_positions(portfolio);
    let visible_categories: Vec<_> = portfolio
        .categories
        .iter()
        .filter(|c| show_missing || !c.is_missing_positions())
        .collect();

    let remaining_slots = portfolio
        .min_positions
        .saturating_sub(portfolio.real_position_count())
        .max(1);
    let per_slot_placeholder_weight = portfolio
        .builder_placeholder()
        .map(|b| b.weight)
        .filter(|w| *w > Decimal::ZERO)
        .map(|w| w / Decimal::from(remaining_slots));

    // Pass 1: resolve a source for every position; `None` awaits an equal share.
    let mut resolved: Vec<Vec<Option<(TargetSource, WeightOrigin)>>> =
        Vec::with_capacity(visible_categories.len());
    let mut explicit_sum = Decimal::ZERO;
    let mut unresolved = 0usize;
    for category in &visible_categories {
        let mut sources = Vec::with_capacity(category.positions.len());
        for position in &category.positions {
            let source = match position.target_value {
                Some(value) => {
                    explicit_sum =
                        explicit_sum.saturating_add(percent_of(value, portfolio_target_value));
                    Some((TargetSource::BackendConstrained(value), WeightOrigin::Backend))
                }
                None => resolve_weight(portfolio, position, per_slot_placeholder_weight).map(
                    |(weight, origin)| {
                        explicit_sum = explicit_sum.saturating_add(weight);
                        (TargetSource::Derived(weight), origin)
                    },
                ),
            };
            if source.is_none() {
                unresolved += 1;
            }
            sources.push(source);
        }
        resolved.push(sources);
    }

    // Pass 2: equal split of whatever the explicit allocations left over.
    let equal_share = if unresolved > 0 {
        (ONE_HUNDRED - explicit_sum).max(Decimal::ZERO) / Decimal::from(unresolved)
    } else {
        Decimal::ZERO
    };
    let resolved: Vec<Vec<(TargetSource, WeightOrigin)>> = resolved
        .into_iter()
        .map(|sources| {
            sources
                .into_iter()
                .map(|s| s.unwrap_or((TargetSource::Derived(equal_share), WeightOrigin::EqualShare)))
                .collect()
        })
        .collect();

    // Pass 3: normalization factor.
    let has_backend_constrained_values = resolved
        .iter()
        .flatten()
        .any(|(s, _)| matches!(s, TargetSource::BackendConstrained(_)));
    let raw_sum = saturating_sum(resolved.iter().flatten().filter_map(|(s, _)| match s {
        TargetSource::Derived(weight) => Some(*weight),
        TargetSource::BackendConstrained(_) => None,
    }));
    let rescale = !has_backend_constrained_values && !raw_sum.is_zero();
    let normalization_factor = if rescale {
        ONE_HUNDRED.checked_div(raw_sum).unwrap_or(Decimal::MAX)
    } else {
        Decimal::ONE
    };

    // Pass 4: target values.
    let categories: Vec<NormalizedCategory<'a>> = visible_categories
        .into_iter()
        .zip(resolved)
        .map(|(category, sources)| {
            let positions = category
                .positions
                .iter()
                .zip(sources)
                .map(|(position, (source, origin))| {
                    let (target_allocation, target_value) = match source {
                        TargetSource::BackendConstrained(value) => {
                            (percent_of(value, portfolio_target_value), value)
                        }
                        TargetSource::Derived(weight) => {
                            let pct = if rescale {
                                percent_of(weight, raw_sum)
                            } else {
                                weight
                            };
                            (pct, (pct / ONE_HUNDRED).saturating_mul(portfolio_target_value))
                        }
                    };
                    NormalizedPosition {
                        position,
                        source,
                        origin,
                        target_allocation,
                        target_value,
                    }
                })
                .collect();
            NormalizedCategory {
                category,
                positions,
            }
        })
        .collect();

    debug!(
        "Normalized portfolio {}: factor {}, backend values: {}, missing positions shown: {}",
        portfolio.name, normalization_factor, has_backend_constrained_values, show_missing
    );

    NormalizedPortfolio {
        portfolio,
        target_value: portfolio_target_value,
        categories,
        has_backend_constrained_values,
        normalization_factor,
        shows_missing_positions: show_missing,
    }
}
