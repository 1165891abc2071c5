//! Stateful controller owning the snapshot and the user's selections.

use log::debug;
use rust_decimal::Decimal;

use crate::errors::{Error, Result, ValidationError};
use crate::rebalancing::RebalanceMode;
use crate::snapshot::PortfolioSnapshot;

use super::{
    compute_with_state, validate_investment_amount, AllocationResult, AllocatorState,
    AllocatorUpdate,
};

/// Holds one snapshot plus [`AllocatorState`] and recomputes on every event.
///
/// Events that leave the state unchanged reuse the previous result, so
/// high-frequency input (slider drags, keystrokes) does not trigger redundant
/// full recomputations.
pub struct Allocator {
    snapshot: PortfolioSnapshot,
    state: AllocatorState,
    cache: Option<(AllocatorState, AllocationResult)>,
}

impl Allocator {
    pub fn new(snapshot: PortfolioSnapshot) -> Self {
        Self::with_state(snapshot, AllocatorState::default())
    }

    pub fn with_state(snapshot: PortfolioSnapshot, state: AllocatorState) -> Self {
        Self {
            snapshot,
            state,
            cache: None,
        }
    }

    pub fn snapshot(&self) -> &PortfolioSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &AllocatorState {
        &self.state
    }

    /// Returns the result for the current state, computing it if needed.
    pub fn result(&mut self) -> Result<&AllocationResult> {
        let fresh = matches!(&self.cache, Some((state, _)) if *state == self.state);
        if fresh {
            debug!("Reusing allocation result for unchanged state");
        } else {
            let result = compute_with_state(&self.snapshot, &self.state)?;
            self.cache = Some((self.state.clone(), result));
        }
        self.cache
            .as_ref()
            .map(|(_, result)| result)
            .ok_or_else(|| Error::Unexpected("Allocation result missing".to_string()))
    }

    pub fn set_mode(&mut self, mode: RebalanceMode) -> Result<&AllocationResult> {
        self.state.mode = mode;
        self.result()
    }

    pub fn set_investment_amount(&mut self, amount: Decimal) -> Result<&AllocationResult> {
        validate_investment_amount(amount)?;
        self.state.investment_amount = amount;
        self.result()
    }

    pub fn select_portfolio(&mut self, name: Option<String>) -> Result<&AllocationResult> {
        self.ensure_portfolio(name.as_deref())?;
        self.state.selected_portfolio = name;
        self.result()
    }

    /// Applies every field of `update`, then recomputes once.
    ///
    /// All fields are validated first; on error the state is left untouched.
    pub fn apply(&mut self, update: AllocatorUpdate) -> Result<&AllocationResult> {
        if let Some(amount) = update.investment_amount {
            validate_investment_amount(amount)?;
        }
        if let Some(selection) = &update.selected_portfolio {
            self.ensure_portfolio(selection.as_deref())?;
        }

        if let Some(mode) = update.mode {
            self.state.mode = mode;
        }
        if let Some(amount) = update.investment_amount {
            self.state.investment_amount = amount;
        }
        if let Some(selection) = update.selected_portfolio {
            self.state.selected_portfolio = selection;
        }
        if let Some(key) = update.toggle_category {
            self.toggle_key(key);
        }
        self.result()
    }

    fn ensure_portfolio(&self, name: Option<&str>) -> Result<()> {
        match name {
            Some(name) if self.snapshot.find_portfolio(name).is_none() => Err(Error::Validation(
                ValidationError::UnknownPortfolio(name.to_string()),
            )),
            _ => Ok(()),
        }
    }

    fn toggle_key(&mut self, key: String) {
        if !self.state.expanded_categories.remove(&key) {
            self.state.expanded_categories.insert(key);
        }
    }

    /// Expands a collapsed category or collapses an expanded one.
    pub fn toggle_category(&mut self, key: &str) -> Result<&AllocationResult> {
        self.toggle_key(key.to_string());
        self.result()
    }

    /// Swaps in a freshly fetched snapshot, keeping selections that still apply.
    pub fn replace_snapshot(&mut self, snapshot: PortfolioSnapshot) -> Result<&AllocationResult> {
        let selection_gone = self
            .state
            .selected_portfolio
            .as_deref()
            .is_some_and(|name| snapshot.find_portfolio(name).is_none());
        if selection_gone {
            debug!("Selected portfolio no longer present, falling back to the first one");
            self.state.selected_portfolio = None;
        }
        self.snapshot = snapshot;
        self.cache = None;
        self.result()
    }
}
