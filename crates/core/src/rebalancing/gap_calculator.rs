//! Gap calculation and pool classification.

use rust_decimal::Decimal;

use crate::constants::BALANCE_DEAD_ZONE;

use super::GapClass;

/// `target - current`, classified with the dead zone applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    pub value: Decimal,
    pub class: GapClass,
}

impl Gap {
    pub fn between(current: Decimal, target: Decimal) -> Self {
        let value = target - current;
        let class = if value.abs() < BALANCE_DEAD_ZONE {
            GapClass::Balanced
        } else if value > Decimal::ZERO {
            GapClass::NeedsBuy
        } else {
            GapClass::NeedsSell
        };
        Self { value, class }
    }

    pub fn is_balanced(&self) -> bool {
        self.class == GapClass::Balanced
    }

    /// Pool weight: the gap magnitude.
    pub fn weight(&self) -> Decimal {
        self.value.abs()
    }
}

/// Indices of items needing a buy or a sell, weighted by gap magnitude.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapPools {
    pub positive: Vec<(usize, Decimal)>,
    pub negative: Vec<(usize, Decimal)>,
}

impl GapPools {
    pub fn push(&mut self, index: usize, gap: &Gap) {
        match gap.class {
            GapClass::NeedsBuy => self.positive.push((index, gap.weight())),
            GapClass::NeedsSell => self.negative.push((index, gap.weight())),
            GapClass::Balanced => {}
        }
    }

    pub fn total_positive(&self) -> Decimal {
        self.positive.iter().map(|(_, w)| *w).sum()
    }

    pub fn total_negative(&self) -> Decimal {
        self.negative.iter().map(|(_, w)| *w).sum()
    }
}

/// Computes the gap of every `(current, target)` pair and pools the ones
/// `eligible` accepts.
pub fn classify_gaps<F>(values: &[(Decimal, Decimal)], eligible: F) -> (Vec<Gap>, GapPools)
where
    F: Fn(usize, &Gap) -> bool,
{
    let mut pools = GapPools::default();
    let gaps = values
        .iter()
        .enumerate()
        .map(|(index, (current, target))| {
            let gap = Gap::between(*current, *target);
            if eligible(index, &gap) {
                pools.push(index, &gap);
            }
            gap
        })
        .collect();
    (gaps, pools)
}
