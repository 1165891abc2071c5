//! Capacity simulation: builds the country x category seed from existing
//! positions and fits it to the user's two independent target vectors.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::constants::{INTERSECTION_KEY_SEPARATOR, MAX_AMOUNT, MAX_WEIGHT, ONE_HUNDRED};
use crate::errors::{Error, Result, ValidationError};

use super::{
    fit, CapacityCell, CapacityInput, CapacityLimit, CapacityMatrix, CapacityTargets,
    IntersectionCell, IpfConfig,
};

/// Key of a country/category intersection.
pub fn intersection_key(country: &str, category: &str) -> String {
    format!("{}{}{}", country, INTERSECTION_KEY_SEPARATOR, category)
}

/// Groups existing positions by `(country, category)`.
///
/// Country positions carry their category; category positions only contribute
/// when they name a country and are not already listed under that country.
pub fn build_intersections(input: &CapacityInput) -> BTreeMap<String, IntersectionCell> {
    let mut cells: BTreeMap<String, IntersectionCell> = BTreeMap::new();

    let mut add = |country: &str, category: &str, name: &str, value: Decimal| {
        let cell = cells.entry(intersection_key(country, category)).or_default();
        if cell.positions.iter().any(|p| p == name) {
            return;
        }
        cell.positions.push(name.to_string());
        cell.total_value += value.max(Decimal::ZERO);
    };

    for country in &input.countries {
        for position in &country.positions {
            if let Some(category) = position.category.as_deref() {
                add(&country.country, category, &position.name, position.value);
            }
        }
    }
    for category in &input.categories {
        for position in &category.positions {
            if let Some(country) = position.country.as_deref() {
                add(country, &category.category, &position.name, position.value);
            }
        }
    }

    cells
}

/// Upper bound for a dimension: `rule% × total capital`, if a rule applies.
fn max_allowed(rule: Option<Decimal>, total_capital: Decimal) -> Option<Decimal> {
    rule.filter(|_| total_capital > Decimal::ZERO)
        .map(|pct| (pct.max(Decimal::ZERO) / ONE_HUNDRED * total_capital).max(Decimal::ZERO))
}

fn ensure_unique<'a>(kind: &'static str, names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(Error::Validation(ValidationError::Duplicate {
                kind,
                name: name.to_string(),
            }));
        }
    }
    Ok(())
}

fn ensure_in_range(what: &str, value: Decimal, limit: Decimal) -> Result<()> {
    if value.abs() > limit {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "{} is out of range: {}",
            what, value
        ))));
    }
    Ok(())
}

/// Rejects amounts and rule percentages too large to simulate.
fn validate_ranges(input: &CapacityInput, targets: &CapacityTargets) -> Result<()> {
    ensure_in_range("totalInvestableCapital", input.total_investable_capital, MAX_AMOUNT)?;
    ensure_in_range("availableToInvest", input.available_to_invest, MAX_AMOUNT)?;
    for rule in [input.rules.max_per_country, input.rules.max_per_category]
        .into_iter()
        .flatten()
    {
        ensure_in_range("Capacity rule", rule, MAX_WEIGHT)?;
    }
    let positions = input
        .countries
        .iter()
        .flat_map(|c| c.positions.iter())
        .chain(input.categories.iter().flat_map(|c| c.positions.iter()));
    for position in positions {
        ensure_in_range(&format!("Value of '{}'", position.name), position.value, MAX_AMOUNT)?;
    }
    let requested = targets
        .country_targets
        .iter()
        .chain(targets.category_targets.iter());
    for (name, value) in requested {
        ensure_in_range(&format!("Target for '{}'", name), *value, MAX_AMOUNT)?;
    }
    Ok(())
}

/// Clamps each named slider to `[0, max_allowed]`; unknown names are ignored.
fn clamp_targets(
    kind: &str,
    names: &[&str],
    targets: &HashMap<String, Decimal>,
    caps: &[Option<Decimal>],
) -> Vec<Decimal> {
    for name in targets.keys() {
        if !names.contains(&name.as_str()) {
            warn!("Ignoring target for unknown {} '{}'", kind, name);
        }
    }
    names
        .iter()
        .zip(caps)
        .map(|(name, cap)| {
            let requested = targets.get(*name).copied().unwrap_or(Decimal::ZERO);
            let mut value = requested.max(Decimal::ZERO);
            if let Some(cap) = cap {
                if value > *cap {
                    debug!("Clamping {} '{}' target {} to {}", kind, name, value, cap);
                    value = *cap;
                }
            }
            value
        })
        .collect()
}

fn limits(
    names: &[&str],
    current: &[Decimal],
    caps: &[Option<Decimal>],
    targets: &[Decimal],
    allocated: &[Decimal],
) -> Vec<CapacityLimit> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| CapacityLimit {
            name: name.to_string(),
            current_invested: current[i],
            max_allowed: caps[i],
            remaining_capacity: caps[i].map(|cap| (cap - current[i]).max(Decimal::ZERO)),
            target: targets[i],
            allocated: allocated[i],
        })
        .collect()
}

/// Runs the capacity simulation for one set of slider positions.
pub fn simulate_capacity(
    input: &CapacityInput,
    targets: &CapacityTargets,
    config: &IpfConfig,
) -> Result<CapacityMatrix> {
    ensure_unique("country", input.countries.iter().map(|c| c.country.as_str()))?;
    ensure_unique("category", input.categories.iter().map(|c| c.category.as_str()))?;
    validate_ranges(input, targets)?;

    let country_names: Vec<&str> = input.countries.iter().map(|c| c.country.as_str()).collect();
    let category_names: Vec<&str> = input
        .categories
        .iter()
        .map(|c| c.category.as_str())
        .collect();

    let total_capital = input.total_investable_capital;
    let country_caps: Vec<Option<Decimal>> = country_names
        .iter()
        .map(|_| max_allowed(input.rules.max_per_country, total_capital))
        .collect();
    let category_caps: Vec<Option<Decimal>> = category_names
        .iter()
        .map(|_| max_allowed(input.rules.max_per_category, total_capital))
        .collect();

    let row_targets = clamp_targets("country", &country_names, &targets.country_targets, &country_caps);
    let column_targets = clamp_targets(
        "category",
        &category_names,
        &targets.category_targets,
        &category_caps,
    );

    let intersections = build_intersections(input);
    let grand_total: Decimal = intersections.values().map(|c| c.total_value).sum();
    let seed: Vec<Vec<Decimal>> = country_names
        .iter()
        .map(|country| {
            category_names
                .iter()
                .map(|category| {
                    match intersections.get(&intersection_key(country, category)) {
                        Some(cell) if grand_total > Decimal::ZERO => cell.total_value / grand_total,
                        _ => Decimal::ZERO,
                    }
                })
                .collect()
        })
        .collect();

    let outcome = fit(&seed, &row_targets, &column_targets, config);
    let row_totals = outcome.row_totals();
    let column_totals = if outcome.matrix.is_empty() {
        vec![Decimal::ZERO; category_names.len()]
    } else {
        outcome.column_totals()
    };

    let cells: Vec<CapacityCell> = country_names
        .iter()
        .enumerate()
        .flat_map(|(r, country)| {
            let matrix = &outcome.matrix;
            let intersections = &intersections;
            category_names.iter().enumerate().map(move |(c, category)| {
                let positions = intersections
                    .get(&intersection_key(country, category))
                    .map(|cell| cell.positions.clone())
                    .unwrap_or_default();
                CapacityCell {
                    country: country.to_string(),
                    category: category.to_string(),
                    amount: matrix[r][c],
                    populated: !positions.is_empty(),
                    positions,
                }
            })
        })
        .collect();

    let country_total: Decimal = row_targets.iter().copied().sum();
    let category_total: Decimal = column_targets.iter().copied().sum();
    let total_allocated: Decimal = row_totals.iter().copied().sum();
    let totals_mismatch = (country_total - category_total).abs() >= config.tolerance;
    if totals_mismatch {
        warn!(
            "Country targets total {} but category targets total {}",
            country_total, category_total
        );
    }

    let country_current: Vec<Decimal> = input.countries.iter().map(|c| c.current_invested).collect();
    let category_current: Vec<Decimal> = input
        .categories
        .iter()
        .map(|c| c.current_invested)
        .collect();

    Ok(CapacityMatrix {
        cells,
        countries: limits(
            &country_names,
            &country_current,
            &country_caps,
            &row_targets,
            &row_totals,
        ),
        categories: limits(
            &category_names,
            &category_current,
            &category_caps,
            &column_targets,
            &column_totals,
        ),
        country_total,
        category_total,
        total_allocated,
        available_to_invest: input.available_to_invest,
        totals_mismatch,
        exceeds_available: total_allocated > input.available_to_invest + config.tolerance,
        iterations: outcome.iterations,
        converged: outcome.converged,
    })
}
