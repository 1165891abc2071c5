//! Tests for the rebalancing policy engine.

#[cfg(test)]
mod tests {
    use crate::rebalancing::{
        apply_nested_policy, apply_policy, ExcludedReason, PolicyItem, RebalanceMode,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn two_portfolios() -> Vec<PolicyItem> {
        vec![
            PolicyItem::new(dec!(1000), dec!(1500)),
            PolicyItem::new(dec!(2000), dec!(1500)),
        ]
    }

    // ==================== Mode Scenarios ====================

    #[test]
    fn test_existing_only_moves_min_of_pools() {
        let outcome = apply_policy(RebalanceMode::ExistingOnly, &two_portfolios(), dec!(0));
        assert_eq!(outcome.distributed_amount, dec!(500));
        assert_eq!(outcome.items[0].action, dec!(500));
        assert_eq!(outcome.items[1].action, dec!(-500));
    }

    #[test]
    fn test_new_only_distributes_new_capital_to_buys() {
        let outcome = apply_policy(RebalanceMode::NewOnly, &two_portfolios(), dec!(300));
        assert_eq!(outcome.total_positive_gap, dec!(500));
        assert_eq!(outcome.items[0].action, dec!(300));
        assert_eq!(outcome.items[1].action, dec!(0));
        assert_eq!(
            outcome.items[1].excluded_reason,
            Some(ExcludedReason::AtOrAboveTarget)
        );
    }

    #[test]
    fn test_new_with_sells_applies_full_gap() {
        let outcome = apply_policy(RebalanceMode::NewWithSells, &two_portfolios(), dec!(300));
        assert_eq!(outcome.items[0].action, dec!(500));
        assert_eq!(outcome.items[1].action, dec!(-500));
    }

    #[test]
    fn test_existing_only_uneven_pools() {
        let items = vec![
            PolicyItem::new(dec!(0), dec!(300)),
            PolicyItem::new(dec!(0), dec!(100)),
            PolicyItem::new(dec!(500), dec!(400)),
        ];
        let outcome = apply_policy(RebalanceMode::ExistingOnly, &items, Decimal::ZERO);
        assert_eq!(outcome.distributed_amount, dec!(100));
        assert_eq!(outcome.items[0].action, dec!(75));
        assert_eq!(outcome.items[1].action, dec!(25));
        assert_eq!(outcome.items[2].action, dec!(-100));
        assert_eq!(outcome.total_buys(), outcome.total_sells());
    }

    // ==================== Exclusions ====================

    #[test]
    fn test_dead_zone_forces_zero_in_all_modes() {
        let items = vec![
            PolicyItem::new(dec!(100), dec!(100.005)),
            PolicyItem::new(dec!(0), dec!(50)),
        ];
        for mode in [
            RebalanceMode::ExistingOnly,
            RebalanceMode::NewOnly,
            RebalanceMode::NewWithSells,
        ] {
            let outcome = apply_policy(mode, &items, dec!(20));
            assert_eq!(outcome.items[0].action, Decimal::ZERO);
            assert_eq!(
                outcome.items[0].excluded_reason,
                Some(ExcludedReason::AtTarget)
            );
        }
    }

    #[test]
    fn test_buy_blocked_by_category_is_excluded() {
        let items = vec![
            PolicyItem::new(dec!(0), dec!(100)).with_buy_allowed(false),
            PolicyItem::new(dec!(0), dec!(100)),
        ];
        let outcome = apply_policy(RebalanceMode::NewOnly, &items, dec!(50));
        assert_eq!(outcome.items[0].action, Decimal::ZERO);
        assert_eq!(
            outcome.items[0].excluded_reason,
            Some(ExcludedReason::CategoryAboveTarget)
        );
        assert_eq!(outcome.items[1].action, dec!(50));
    }

    #[test]
    fn test_sell_is_not_blocked_by_category_flag() {
        // A category below target never blocks a sell of one of its positions.
        let items = vec![PolicyItem::new(dec!(100), dec!(90)).with_buy_allowed(false)];
        let outcome = apply_policy(RebalanceMode::NewWithSells, &items, Decimal::ZERO);
        assert_eq!(outcome.items[0].action, dec!(-10));
        assert_eq!(outcome.items[0].excluded_reason, None);
    }

    #[test]
    fn test_new_only_without_eligible_items_distributes_nothing() {
        let items = vec![PolicyItem::new(dec!(200), dec!(100))];
        let outcome = apply_policy(RebalanceMode::NewOnly, &items, dec!(1000));
        assert_eq!(outcome.distributed_amount, Decimal::ZERO);
        assert_eq!(outcome.total_action(), Decimal::ZERO);
    }

    // ==================== Nested Policy ====================

    #[test]
    fn test_nested_existing_only_moves_parent_buy() {
        let items = vec![
            PolicyItem::new(dec!(500), dec!(750)),
            PolicyItem::new(dec!(500), dec!(750)),
        ];
        let outcome = apply_nested_policy(RebalanceMode::ExistingOnly, &items, dec!(500));
        assert_eq!(outcome.items[0].action, dec!(250));
        assert_eq!(outcome.items[1].action, dec!(250));
        assert_eq!(outcome.total_action(), dec!(500));
        assert_eq!(outcome.distributed_amount, dec!(500));
    }

    #[test]
    fn test_nested_existing_only_adds_flow_to_matched_amount() {
        let items = vec![
            PolicyItem::new(dec!(0), dec!(300)),
            PolicyItem::new(dec!(0), dec!(100)),
            PolicyItem::new(dec!(500), dec!(400)),
        ];
        let outcome = apply_nested_policy(RebalanceMode::ExistingOnly, &items, dec!(50));
        assert_eq!(outcome.total_buys(), dec!(150));
        assert_eq!(outcome.total_sells(), dec!(100));
        assert_eq!(outcome.items[0].action, dec!(112.5));
        assert_eq!(outcome.items[1].action, dec!(37.5));
        assert_eq!(outcome.total_action(), dec!(50));
    }

    #[test]
    fn test_nested_existing_only_caps_at_pool() {
        let items = vec![
            PolicyItem::new(dec!(0), dec!(300)),
            PolicyItem::new(dec!(500), dec!(400)),
        ];
        // Sells can absorb at most the 100 of negative gap.
        let outcome = apply_nested_policy(RebalanceMode::ExistingOnly, &items, dec!(-50));
        assert_eq!(outcome.total_sells(), dec!(100));
        assert_eq!(outcome.total_buys(), dec!(100));
    }

    #[test]
    fn test_nested_new_only_spends_parent_action() {
        let items = vec![
            PolicyItem::new(dec!(0), dec!(100)),
            PolicyItem::new(dec!(0), dec!(300)),
        ];
        let outcome = apply_nested_policy(RebalanceMode::NewOnly, &items, dec!(200));
        assert_eq!(outcome.items[0].action, dec!(50));
        assert_eq!(outcome.items[1].action, dec!(150));

        let outcome = apply_nested_policy(RebalanceMode::NewOnly, &items, dec!(-200));
        assert_eq!(outcome.total_action(), Decimal::ZERO);
    }

    #[test]
    fn test_nested_without_flow_matches_top_level() {
        let items = two_portfolios();
        assert_eq!(
            apply_nested_policy(RebalanceMode::ExistingOnly, &items, Decimal::ZERO),
            apply_policy(RebalanceMode::ExistingOnly, &items, Decimal::ZERO)
        );
    }

    // ==================== Mode Parsing ====================

    #[test]
    fn test_mode_parsing_and_serde() {
        assert_eq!(
            RebalanceMode::from_str("new_with_sells").unwrap(),
            RebalanceMode::NewWithSells
        );
        assert_eq!(
            RebalanceMode::from_str("Existing").unwrap(),
            RebalanceMode::ExistingOnly
        );
        assert!(RebalanceMode::from_str("sideways").is_err());

        assert_eq!(
            serde_json::to_string(&RebalanceMode::NewOnly).unwrap(),
            "\"new-only\""
        );
        assert_eq!(
            serde_json::from_str::<RebalanceMode>("\"new-with-sells\"").unwrap(),
            RebalanceMode::NewWithSells
        );
    }
}
