use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Gaps smaller than this (in currency units) are treated as balanced.
pub const BALANCE_DEAD_ZONE: Decimal = dec!(0.01);

/// Allowed difference between the position-level roll-up and the
/// portfolio-level action before a consistency warning is raised.
pub const CONSISTENCY_TOLERANCE: Decimal = dec!(0.10);

/// Reserved category name for synthetic placeholder slots.
pub const MISSING_POSITIONS_CATEGORY: &str = "Missing Positions";

pub const DEFAULT_IPF_MAX_ITERATIONS: usize = 50;

pub const DEFAULT_IPF_TOLERANCE: Decimal = dec!(0.01);

pub const ONE_HUNDRED: Decimal = dec!(100);

/// Largest magnitude accepted for a monetary amount (1e14).
pub const MAX_AMOUNT: Decimal = dec!(100000000000000);

/// Largest magnitude accepted for a percentage weight.
pub const MAX_WEIGHT: Decimal = dec!(1000000);

/// Separator used for intersection keys (`country|category`) in the capacity simulator.
pub const INTERSECTION_KEY_SEPARATOR: char = '|';

/// Separator used for expanded-category keys (`portfolio::category`).
pub const CATEGORY_KEY_SEPARATOR: &str = "::";
