//! Rebalancing policy engine.
//!
//! Runs at the portfolio level (across portfolios) and at the position level
//! (within one portfolio); callers decide what `current`, `target` and the
//! capital mean at their granularity.

use log::debug;
use rust_decimal::Decimal;

use super::{
    classify_gaps, distribute_proportionally, ExcludedReason, Gap, GapClass, ItemAction,
    PolicyItem, PolicyOutcome, RebalanceMode,
};

/// Computes a signed action for every item under `mode`.
///
/// `new_capital` is only read in [`RebalanceMode::NewOnly`]; existing-only moves
/// `min(Σbuys, Σsells)` and new-with-sells closes every gap outright.
pub fn apply_policy(
    mode: RebalanceMode,
    items: &[PolicyItem],
    new_capital: Decimal,
) -> PolicyOutcome {
    run_policy(mode, items, new_capital, Decimal::ZERO)
}

/// Policy for items nested in a parent that was already assigned `parent_action`.
///
/// New-only spends the parent's buy across the items. Existing-only rebalances
/// among the items and also moves the parent's net flow: buys total
/// `min(P, N) + max(parent_action, 0)` and sells `min(P, N) + max(-parent_action, 0)`,
/// each capped at its own pool, so item actions add up to `parent_action`
/// whenever the pools can absorb it.
pub fn apply_nested_policy(
    mode: RebalanceMode,
    items: &[PolicyItem],
    parent_action: Decimal,
) -> PolicyOutcome {
    run_policy(mode, items, parent_action.max(Decimal::ZERO), parent_action)
}

fn excluded_reason(mode: RebalanceMode, item: &PolicyItem, gap: &Gap) -> Option<ExcludedReason> {
    match gap.class {
        GapClass::Balanced => Some(ExcludedReason::AtTarget),
        GapClass::NeedsBuy if !item.buy_allowed => Some(ExcludedReason::CategoryAboveTarget),
        GapClass::NeedsSell if mode == RebalanceMode::NewOnly => {
            Some(ExcludedReason::AtOrAboveTarget)
        }
        _ => None,
    }
}

fn run_policy(
    mode: RebalanceMode,
    items: &[PolicyItem],
    new_capital: Decimal,
    net_flow: Decimal,
) -> PolicyOutcome {
    let values: Vec<(Decimal, Decimal)> = items.iter().map(|i| (i.current, i.target)).collect();
    let (gaps, pools) = classify_gaps(&values, |index, gap| {
        excluded_reason(mode, &items[index], gap).is_none()
    });

    let mut actions: Vec<ItemAction> = items
        .iter()
        .zip(gaps.iter())
        .map(|(item, gap)| ItemAction {
            gap: gap.value,
            class: gap.class,
            action: Decimal::ZERO,
            excluded_reason: excluded_reason(mode, item, gap),
        })
        .collect();

    let total_positive_gap = pools.total_positive();
    let total_negative_gap = pools.total_negative();

    let distributed_amount = match mode {
        RebalanceMode::ExistingOnly => {
            let matched = total_positive_gap.min(total_negative_gap);
            let buy_amount = (matched + net_flow.max(Decimal::ZERO)).min(total_positive_gap);
            let sell_amount = (matched + (-net_flow).max(Decimal::ZERO)).min(total_negative_gap);
            for (index, share) in distribute_proportionally(&pools.positive, buy_amount) {
                actions[index].action = share;
            }
            for (index, share) in distribute_proportionally(&pools.negative, sell_amount) {
                actions[index].action = -share;
            }
            buy_amount.max(sell_amount)
        }
        RebalanceMode::NewOnly => {
            let amount = new_capital.max(Decimal::ZERO);
            for (index, share) in distribute_proportionally(&pools.positive, amount) {
                actions[index].action = share;
            }
            if pools.positive.is_empty() {
                Decimal::ZERO
            } else {
                amount
            }
        }
        RebalanceMode::NewWithSells => {
            for (index, _) in pools.positive.iter().chain(pools.negative.iter()) {
                actions[*index].action = actions[*index].gap;
            }
            total_positive_gap
        }
    };

    debug!(
        "Applied {} policy to {} items: +{} / -{} gap, {} distributed",
        mode,
        items.len(),
        total_positive_gap,
        total_negative_gap,
        distributed_amount
    );

    PolicyOutcome {
        mode,
        items: actions,
        total_positive_gap,
        total_negative_gap,
        distributed_amount,
    }
}
