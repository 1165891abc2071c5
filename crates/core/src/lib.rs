//! Rebalancer Core - portfolio rebalancing allocation engine.
//!
//! Pure computation between a snapshot fetch and a presentation layer:
//! target normalization, gap-based rebalancing policies at portfolio and
//! position level, hierarchical roll-up with a consistency check, and a
//! country x category capacity simulator.

pub mod allocation;
pub mod capacity;
pub mod constants;
pub mod errors;
pub mod rebalancing;
pub mod snapshot;
pub mod targets;
pub mod utils;

pub use allocation::{
    compute_allocations, AllocationResult, Allocator, AllocatorState, AllocatorUpdate,
};
pub use rebalancing::RebalanceMode;
pub use snapshot::PortfolioSnapshot;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
