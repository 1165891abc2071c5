//! Tests for snapshot parsing and helpers.

#[cfg(test)]
mod tests {
    use crate::errors::{Error, SnapshotError};
    use crate::snapshot::{
        FileSnapshotProvider, InvestmentType, PortfolioSnapshot, SnapshotProvider,
        StaticSnapshotProvider,
    };
    use rust_decimal_macros::dec;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "portfolios": [
            {
                "name": "Growth",
                "currentValue": 1500,
                "targetWeight": "60",
                "minPositions": 4,
                "categories": [
                    {
                        "name": "Tech",
                        "positions": [
                            {"name": "Alpha", "currentValue": 1000, "investment_type": "Stock", "targetAllocation": 40},
                            {"name": "Beta", "currentValue": 500.5, "investment_type": "ETF", "targetValue": 900, "is_capped": true, "unconstrained_target_value": 1200}
                        ]
                    },
                    {
                        "name": "Missing Positions",
                        "positions": [
                            {"name": "Open slot", "currentValue": 0, "isPlaceholder": true, "positionsRemaining": 2}
                        ]
                    }
                ],
                "builderPositions": [
                    {"companyName": "alpha", "weight": 30},
                    {"companyName": "Missing", "weight": 40, "isPlaceholder": true}
                ]
            },
            {"name": "Income", "currentValue": null, "categories": []}
        ]
    }"#;

    #[test]
    fn test_parse_sample_snapshot() {
        let snapshot = PortfolioSnapshot::from_json(SAMPLE).unwrap();
        assert_eq!(snapshot.portfolios.len(), 2);

        let growth = snapshot.find_portfolio("Growth").unwrap();
        assert_eq!(growth.target_weight, dec!(60));
        assert_eq!(growth.min_positions, 4);
        assert_eq!(growth.effective_current_value(), dec!(1500.5));
        assert_eq!(growth.real_position_count(), 2);
        assert_eq!(growth.real_builder_weight(), dec!(30));
        assert_eq!(growth.builder_weight_for("ALPHA"), Some(dec!(30)));
        assert_eq!(growth.builder_placeholder().unwrap().weight, dec!(40));

        let beta = &growth.categories[0].positions[1];
        assert_eq!(beta.investment_type, Some(InvestmentType::Etf));
        assert_eq!(beta.target_value, Some(dec!(900)));
        assert!(beta.is_capped);
        assert_eq!(beta.unconstrained_target_value, Some(dec!(1200)));

        let slot = &growth.categories[1].positions[0];
        assert!(slot.is_placeholder);
        assert_eq!(slot.positions_remaining, 2);
        assert!(growth.categories[1].is_missing_positions());

        let income = snapshot.find_portfolio("Income").unwrap();
        assert_eq!(income.effective_current_value(), dec!(0));
        assert_eq!(income.target_weight, dec!(0));
    }

    #[test]
    fn test_unknown_investment_type_maps_to_other() {
        let raw = r#"{"portfolios":[{"name":"P","categories":[{"name":"C","positions":[{"name":"Bond","currentValue":1,"investment_type":"Bond"}]}]}]}"#;
        let snapshot = PortfolioSnapshot::from_json(raw).unwrap();
        assert_eq!(
            snapshot.portfolios[0].categories[0].positions[0].investment_type,
            Some(InvestmentType::Other)
        );
    }

    #[test]
    fn test_missing_portfolios_is_rejected() {
        let err = PortfolioSnapshot::from_json(r#"{"accounts": []}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::Snapshot(SnapshotError::MissingPortfolios)
        ));

        let err = PortfolioSnapshot::from_json(r#"{"portfolios": {}}"#).unwrap_err();
        assert!(matches!(
            err,
            Error::Snapshot(SnapshotError::MissingPortfolios)
        ));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = PortfolioSnapshot::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::Malformed(_))));
    }

    #[test]
    fn test_duplicate_portfolio_names_are_rejected() {
        let raw = r#"{"portfolios":[{"name":"A"},{"name":"A"}]}"#;
        let err = PortfolioSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::Malformed(_))));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        let raw = r#"{"portfolios":[{"name":"A","categories":[{"name":"Tech","positions":[
            {"name":"X","currentValue":5e28},
            {"name":"Y","currentValue":5e28}
        ]}]}]}"#;
        let err = PortfolioSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::Malformed(_))));

        let raw = r#"{"portfolios":[{"name":"A","targetWeight":1e20}]}"#;
        let err = PortfolioSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, Error::Snapshot(SnapshotError::Malformed(_))));

        let raw = r#"{"portfolios":[{"name":"A","currentValue":100000000000000}]}"#;
        assert!(PortfolioSnapshot::from_json(raw).is_ok());
    }

    #[tokio::test]
    async fn test_file_provider_reads_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let provider = FileSnapshotProvider::new(file.path());
        let snapshot = provider.fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.portfolios.len(), 2);
    }

    #[tokio::test]
    async fn test_file_provider_missing_file() {
        let provider = FileSnapshotProvider::new("/definitely/not/here.json");
        let result = provider.fetch_snapshot().await;
        assert!(matches!(
            result,
            Err(Error::Snapshot(SnapshotError::Fetch(_)))
        ));
    }

    #[tokio::test]
    async fn test_static_provider_returns_snapshot() {
        let snapshot = PortfolioSnapshot::from_json(SAMPLE).unwrap();
        let provider = StaticSnapshotProvider::new(snapshot.clone());
        assert_eq!(provider.fetch_snapshot().await.unwrap(), snapshot);
    }
}
