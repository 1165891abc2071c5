//! Proportional capital distribution.

use rust_decimal::Decimal;

/// Splits `amount` across the pool proportionally to each weight.
///
/// Every key receives `amount * weight / Σweights`. A zero or negative amount,
/// or a pool whose weights sum to zero, yields zero for every key. No rounding
/// is applied.
pub fn distribute_proportionally<K: Clone>(
    pool: &[(K, Decimal)],
    amount: Decimal,
) -> Vec<(K, Decimal)> {
    let total_weight: Decimal = pool
        .iter()
        .map(|(_, w)| *w)
        .filter(|w| *w > Decimal::ZERO)
        .sum();

    if total_weight.is_zero() || amount <= Decimal::ZERO {
        return pool.iter().map(|(k, _)| (k.clone(), Decimal::ZERO)).collect();
    }

    pool.iter()
        .map(|(key, weight)| {
            let share = if *weight > Decimal::ZERO {
                amount * (*weight / total_weight)
            } else {
                Decimal::ZERO
            };
            (key.clone(), share)
        })
        .collect()
}
