//! Iterative proportional fitting (raking) over a dense matrix.
//!
//! Rows and columns are rescaled alternately until the matrix matches both
//! marginal target vectors. Cells seeded at zero stay zero, so a row or column
//! with a positive target but an all-zero seed can never reach its target; it
//! simply stays at zero.

use log::{debug, warn};
use rust_decimal::Decimal;

use super::IpfConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct IpfOutcome {
    pub matrix: Vec<Vec<Decimal>>,
    pub iterations: usize,
    pub converged: bool,
}

impl IpfOutcome {
    pub fn row_totals(&self) -> Vec<Decimal> {
        self.matrix.iter().map(|row| row.iter().copied().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<Decimal> {
        let columns = self.matrix.first().map_or(0, Vec::len);
        (0..columns)
            .map(|c| self.matrix.iter().map(|row| row[c]).sum())
            .collect()
    }
}

/// Scales `seed` so that row sums approach `row_targets` and column sums
/// approach `column_targets`.
///
/// `seed` must be `row_targets.len()` x `column_targets.len()`.
pub fn fit(
    seed: &[Vec<Decimal>],
    row_targets: &[Decimal],
    column_targets: &[Decimal],
    config: &IpfConfig,
) -> IpfOutcome {
    let rows = row_targets.len();
    let columns = column_targets.len();
    let mut matrix: Vec<Vec<Decimal>> = (0..rows)
        .map(|r| {
            (0..columns)
                .map(|c| {
                    seed.get(r)
                        .and_then(|row| row.get(c))
                        .copied()
                        .unwrap_or(Decimal::ZERO)
                        .max(Decimal::ZERO)
                })
                .collect()
        })
        .collect();

    let row_sum: Decimal = row_targets.iter().copied().sum();
    let column_sum: Decimal = column_targets.iter().copied().sum();
    if row_sum.is_zero() && column_sum.is_zero() {
        return IpfOutcome {
            matrix: vec![vec![Decimal::ZERO; columns]; rows],
            iterations: 0,
            converged: true,
        };
    }

    let mut iterations = 0;
    let mut converged = false;
    while iterations < config.max_iterations {
        iterations += 1;
        let mut max_change = Decimal::ZERO;

        for (r, target) in row_targets.iter().enumerate() {
            let current: Decimal = matrix[r].iter().copied().sum();
            max_change = max_change.max(rescale(
                matrix[r].iter_mut(),
                current,
                *target,
            ));
        }

        for (c, target) in column_targets.iter().enumerate() {
            let current: Decimal = matrix.iter().map(|row| row[c]).sum();
            max_change = max_change.max(rescale(
                matrix.iter_mut().map(|row| &mut row[c]),
                current,
                *target,
            ));
        }

        if max_change < config.tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!("IPF converged after {} iterations", iterations);
    } else {
        warn!(
            "IPF did not converge within {} iterations",
            config.max_iterations
        );
    }

    IpfOutcome {
        matrix,
        iterations,
        converged,
    }
}

/// Rescales one row or column to `target`, returning the largest cell change.
fn rescale<'a>(
    cells: impl Iterator<Item = &'a mut Decimal>,
    current: Decimal,
    target: Decimal,
) -> Decimal {
    let mut max_change = Decimal::ZERO;
    if current.is_zero() {
        // Nothing to scale: a zero target keeps it zero, a positive one is unreachable.
        return max_change;
    }
    let target = target.max(Decimal::ZERO);
    for cell in cells {
        let updated = *cell / current * target;
        max_change = max_change.max((updated - *cell).abs());
        *cell = updated;
    }
    max_change
}
