//! Expiry-cycle backtesting for index options.
//!
//! One cycle per expiration date: rank the quotes observed the day before,
//! allocate capital across them under the budget constraints, then settle
//! every position against the underlying at expiration.

pub mod allocator;
pub mod engine;
pub mod fees;
pub mod metrics;
pub mod ranking;
pub mod settlement;

#[cfg(test)]
mod test_support;

pub use allocator::{Allocation, AllocationStop, BudgetAllocator, Fill};
pub use engine::{BacktestEngine, BacktestResults, CycleOutcome, CycleReport};
pub use fees::{fee_model_for, FeeModel, FlatOrderFee, NoFees};
pub use metrics::{MetricsCalculator, PerformanceMetrics};
pub use ranking::{ContractRanker, FillTerms, RankedQuote};
pub use settlement::{CycleSettlement, SettledPosition, SettlementEngine};
