//! Tests for target normalization.

#[cfg(test)]
mod tests {
    use crate::rebalancing::RebalanceMode;
    use crate::snapshot::{BuilderPosition, Category, Portfolio, PortfolioSnapshot, Position};
    use crate::targets::{
        normalize_portfolio, normalize_portfolio_targets, shows_missing_positions, TargetSource,
        WeightOrigin,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn position(name: &str, current: Decimal, allocation: Option<Decimal>) -> Position {
        let mut p = Position::new(name, current);
        p.target_allocation = allocation;
        p
    }

    fn portfolio(name: &str, categories: Vec<Category>) -> Portfolio {
        Portfolio {
            name: name.to_string(),
            current_value: Decimal::ZERO,
            target_weight: Decimal::ZERO,
            min_positions: 0,
            categories,
            builder_positions: Vec::new(),
        }
    }

    fn category(name: &str, positions: Vec<Position>) -> Category {
        Category {
            name: name.to_string(),
            positions,
        }
    }

    fn builder(name: &str, weight: Decimal, placeholder: bool) -> BuilderPosition {
        BuilderPosition {
            company_name: name.to_string(),
            weight,
            is_placeholder: placeholder,
        }
    }

    // ==================== Position Normalization ====================

    #[test]
    fn test_allocations_summing_to_100_are_unchanged() {
        let p = portfolio(
            "P",
            vec![category(
                "Tech",
                vec![
                    position("A", dec!(100), Some(dec!(60))),
                    position("B", dec!(100), Some(dec!(40))),
                ],
            )],
        );
        let normalized = normalize_portfolio(&p, dec!(1000));
        assert_eq!(normalized.normalization_factor, Decimal::ONE);
        let positions: Vec<_> = normalized.positions().collect();
        assert_eq!(positions[0].target_allocation, dec!(60));
        assert_eq!(positions[0].target_value, dec!(600));
        assert_eq!(positions[1].target_value, dec!(400));
    }

    #[test]
    fn test_allocations_are_scaled_to_100() {
        let p = portfolio(
            "P",
            vec![category(
                "Tech",
                vec![
                    position("A", dec!(0), Some(dec!(30))),
                    position("B", dec!(0), Some(dec!(20))),
                ],
            )],
        );
        let normalized = normalize_portfolio(&p, dec!(1000));
        assert_eq!(normalized.normalization_factor, dec!(2));
        assert_eq!(normalized.total_target_allocation(), dec!(100));
        let positions: Vec<_> = normalized.positions().collect();
        assert_eq!(positions[0].target_value, dec!(600));
        assert_eq!(positions[1].target_value, dec!(400));
    }

    #[test]
    fn test_backend_value_skips_normalization() {
        let mut capped = position("A", dec!(100), None);
        capped.target_value = Some(dec!(250));
        capped.is_capped = true;
        let p = portfolio(
            "P",
            vec![category(
                "Tech",
                vec![capped, position("B", dec!(100), Some(dec!(30)))],
            )],
        );
        let normalized = normalize_portfolio(&p, dec!(1000));
        assert!(normalized.has_backend_constrained_values);
        assert_eq!(normalized.normalization_factor, Decimal::ONE);

        let positions: Vec<_> = normalized.positions().collect();
        assert_eq!(positions[0].source, TargetSource::BackendConstrained(dec!(250)));
        assert_eq!(positions[0].target_value, dec!(250));
        assert_eq!(positions[0].target_allocation, dec!(25));
        assert_eq!(positions[1].target_allocation, dec!(30));
        assert_eq!(positions[1].target_value, dec!(300));
    }

    #[test]
    fn test_builder_weight_and_equal_share_fallbacks() {
        let mut p = portfolio(
            "P",
            vec![category(
                "Tech",
                vec![
                    position("A", dec!(0), Some(dec!(40))),
                    position("Beta Corp", dec!(0), None),
                    position("C", dec!(0), None),
                    position("D", dec!(0), None),
                ],
            )],
        );
        p.builder_positions = vec![builder("beta corp", dec!(20), false)];

        let normalized = normalize_portfolio(&p, dec!(1000));
        let positions: Vec<_> = normalized.positions().collect();
        assert_eq!(positions[1].origin, WeightOrigin::Builder);
        assert_eq!(positions[2].origin, WeightOrigin::EqualShare);
        // 100 - (40 + 20) = 40 split across C and D.
        assert_eq!(positions[2].target_allocation, dec!(20));
        assert_eq!(positions[3].target_allocation, dec!(20));
        assert_eq!(normalized.total_target_allocation(), dec!(100));
    }

    #[test]
    fn test_placeholder_default_weight() {
        let mut slot = position("Open slot", dec!(0), None);
        slot.is_placeholder = true;
        slot.positions_remaining = 2;

        let mut p = portfolio(
            "P",
            vec![
                category("Tech", vec![position("A", dec!(0), None)]),
                category("Missing Positions", vec![slot]),
            ],
        );
        p.min_positions = 3;
        p.builder_positions = vec![builder("Z", dec!(40), false), builder("", dec!(60), true)];

        assert!(shows_missing_positions(&p));
        let normalized = normalize_portfolio(&p, dec!(1000));
        assert!(normalized.shows_missing_positions);

        let positions: Vec<_> = normalized.positions().collect();
        // Two remaining slots share the 60% placeholder weight.
        assert_eq!(positions[0].origin, WeightOrigin::PlaceholderDefault);
        assert_eq!(positions[0].target_allocation.round_dp(6), dec!(33.333333));
        assert_eq!(positions[1].origin, WeightOrigin::PlaceholderDefault);
        assert_eq!(normalized.total_target_allocation().round_dp(8), dec!(100));
    }

    // ==================== Missing Positions Rule ====================

    #[test]
    fn test_missing_positions_hidden_when_enough_positions() {
        let mut slot = position("Open slot", dec!(0), Some(dec!(50)));
        slot.is_placeholder = true;
        let mut p = portfolio(
            "P",
            vec![
                category("Tech", vec![position("A", dec!(10), Some(dec!(50)))]),
                category("Missing Positions", vec![slot]),
            ],
        );
        p.min_positions = 1;

        assert!(!shows_missing_positions(&p));
        let normalized = normalize_portfolio(&p, dec!(100));
        assert_eq!(normalized.categories.len(), 1);
        assert_eq!(normalized.total_target_allocation(), dec!(100));
    }

    #[test]
    fn test_missing_positions_hidden_when_builder_complete() {
        let mut p = portfolio("P", vec![category("Tech", vec![position("A", dec!(10), None)])]);
        p.min_positions = 5;
        p.builder_positions = vec![
            builder("A", dec!(60), false),
            builder("B", dec!(39.6), false),
        ];
        assert!(!shows_missing_positions(&p));

        p.builder_positions[1].weight = dec!(39.4);
        assert!(shows_missing_positions(&p));
    }

    #[test]
    fn test_tiny_weights_scale_without_overflow() {
        let p = portfolio(
            "P",
            vec![category(
                "Tech",
                vec![position("A", dec!(0), Some(dec!(0.0000000000000000000000000001)))],
            )],
        );
        let normalized = normalize_portfolio(&p, dec!(1000));
        assert_eq!(normalized.normalization_factor, Decimal::MAX);
        let positions: Vec<_> = normalized.positions().collect();
        assert_eq!(positions[0].target_allocation, dec!(100));
        assert_eq!(positions[0].target_value, dec!(1000));
    }

    // ==================== Portfolio Targets ====================

    #[test]
    fn test_portfolio_targets_follow_weights() {
        let mut a = portfolio("A", Vec::new());
        a.current_value = dec!(1000);
        a.target_weight = dec!(50);
        let mut b = portfolio("B", Vec::new());
        b.current_value = dec!(2000);
        b.target_weight = dec!(50);
        let snapshot = PortfolioSnapshot::new(vec![a, b]).unwrap();

        let targets = normalize_portfolio_targets(&snapshot, RebalanceMode::ExistingOnly, dec!(300));
        assert_eq!(targets[0].target_value, dec!(1500));
        assert_eq!(targets[1].target_value, dec!(1500));

        let targets = normalize_portfolio_targets(&snapshot, RebalanceMode::NewOnly, dec!(300));
        assert_eq!(targets[0].target_value, dec!(1650));
        assert_eq!(targets[1].target_value, dec!(1650));
    }

    #[test]
    fn test_portfolio_targets_without_weights_keep_current() {
        let mut a = portfolio("A", Vec::new());
        a.current_value = dec!(700);
        let snapshot = PortfolioSnapshot::new(vec![a]).unwrap();
        let targets = normalize_portfolio_targets(&snapshot, RebalanceMode::NewWithSells, dec!(100));
        assert_eq!(targets[0].target_value, dec!(700));
        assert_eq!(targets[0].target_weight, Decimal::ZERO);
    }
}
