//! Expiry-cycle backtest engine.
//!
//! Drives the cycles in ascending expiration order. Each cycle ranks the
//! quotes observed the day before expiration, allocates capital across them
//! and settles the resulting positions at expiration. The capital ledger is
//! the only state carried from one cycle to the next.
//!
//! # Example
//!
//! ```ignore
//! let engine = BacktestEngine::new(StrategyConfig::selling())?;
//! let results = engine.run(&store)?;
//! CsvStorage::write_orders("orders.csv", &results.orders)?;
//! ```

use chrono::NaiveDate;
use expiry_trade_core::{BacktestError, CapitalLedger, CycleErrorPolicy, Order, StrategyConfig};
use expiry_trade_data::MarketDataStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::allocator::{AllocationStop, BudgetAllocator, Fill};
use crate::fees::FeeModel;
use crate::metrics::{MetricsCalculator, PerformanceMetrics};
use crate::ranking::ContractRanker;
use crate::settlement::{SettledPosition, SettlementEngine};

/// How a cycle ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Completed,
    Aborted { error: String },
}

/// Summary of one expiration cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub expiration: NaiveDate,
    /// Date whose quotes were ranked.
    pub observed_on: NaiveDate,
    pub candidates: usize,
    pub quotes_considered: usize,
    pub orders_filled: usize,
    pub stop: Option<AllocationStop>,
    pub capital_before: Decimal,
    pub capital_after: Decimal,
    /// Net ledger change at fill time.
    pub premium_cash_flow: Decimal,
    /// Net ledger change at settlement.
    pub settlement_cash_flow: Decimal,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    #[must_use]
    pub fn pnl(&self) -> Decimal {
        self.capital_after - self.capital_before
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == CycleOutcome::Completed
    }
}

/// Results from a backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResults {
    /// Every order in emission order.
    pub orders: Vec<Order>,
    pub fills: Vec<Fill>,
    pub settlements: Vec<SettledPosition>,
    pub cycles: Vec<CycleReport>,
    pub ledger: CapitalLedger,
    pub metrics: PerformanceMetrics,
    /// Configuration used for the run.
    pub config: StrategyConfig,
}

impl BacktestResults {
    #[must_use]
    pub fn final_capital(&self) -> Decimal {
        self.ledger.capital()
    }

    /// Initial capital plus every fill delta and settlement payoff.
    ///
    /// Equals [`Self::final_capital`] for a consistent run.
    #[must_use]
    pub fn reconciled_capital(&self) -> Decimal {
        let fills: Decimal = self.fills.iter().map(|f| f.ledger_delta).sum();
        let payoffs: Decimal = self.settlements.iter().map(|s| s.payoff).sum();
        self.ledger.initial() + fills + payoffs
    }

    #[must_use]
    pub fn aborted_cycles(&self) -> usize {
        self.cycles.iter().filter(|c| !c.is_completed()).count()
    }
}

/// Backtest engine that runs the expiration cycles.
pub struct BacktestEngine {
    config: StrategyConfig,
    allocator: BudgetAllocator,
    settlement: SettlementEngine,
}

impl BacktestEngine {
    /// Creates an engine using the configured flat order fee.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` if the configuration fails validation
    pub fn new(config: StrategyConfig) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self {
            allocator: BudgetAllocator::from_config(&config),
            settlement: SettlementEngine::from_config(&config),
            config,
        })
    }

    /// Creates an engine with a custom fee model.
    ///
    /// # Errors
    /// Returns `BacktestError::InvalidConfig` if the configuration fails validation
    pub fn with_fee_model(
        config: StrategyConfig,
        fee_model: Box<dyn FeeModel>,
    ) -> Result<Self, BacktestError> {
        config.validate()?;
        Ok(Self {
            allocator: BudgetAllocator::new(&config, fee_model),
            settlement: SettlementEngine::from_config(&config),
            config,
        })
    }

    /// Returns a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    /// Runs every expiration cycle in the store that falls inside the
    /// configured date range.
    ///
    /// # Errors
    /// Returns the first cycle error when `on_cycle_error` is `abort_run`
    pub fn run(&self, store: &MarketDataStore) -> Result<BacktestResults, BacktestError> {
        let mut ledger = CapitalLedger::new(self.config.capital);
        let mut metrics = MetricsCalculator::new(self.config.capital);
        let mut fills = Vec::new();
        let mut settlements = Vec::new();
        let mut cycles = Vec::new();

        let expirations: Vec<NaiveDate> = store
            .expirations()
            .filter(|expiration| self.config.includes_expiration(*expiration))
            .collect();
        tracing::info!(
            cycles = expirations.len(),
            capital = %ledger.capital(),
            policy = ?self.config.ranking_policy,
            "Starting backtest"
        );

        for expiration in expirations {
            let capital_before = ledger.capital();
            let observed_on = ContractRanker::trading_day_before(expiration);

            let ranked = self.allocator.ranker().rank(store, expiration);
            let allocation = self.allocator.allocate(&ranked, &mut ledger);
            let premium_cash_flow = allocation.premium_cash_flow();
            let settlement = self.settlement.settle(store, &allocation.positions, &mut ledger);
            let settlement_cash_flow = settlement.cash_flow();

            let outcome = match &settlement.failure {
                None => CycleOutcome::Completed,
                Some(err) => CycleOutcome::Aborted {
                    error: err.to_string(),
                },
            };

            let report = CycleReport {
                expiration,
                observed_on,
                candidates: ranked.len(),
                quotes_considered: allocation.quotes_considered,
                orders_filled: allocation.fills.len(),
                stop: allocation.stop,
                capital_before,
                capital_after: ledger.capital(),
                premium_cash_flow,
                settlement_cash_flow,
                outcome,
            };
            tracing::info!(
                %expiration,
                candidates = report.candidates,
                orders = report.orders_filled,
                premium = %report.premium_cash_flow,
                settlement = %report.settlement_cash_flow,
                capital = %report.capital_after,
                "Cycle complete"
            );

            metrics.add_cycle(report.capital_after, report.orders_filled);
            fills.extend(allocation.fills);
            settlements.extend(settlement.settled);
            cycles.push(report);

            if let Some(err) = settlement.failure {
                match self.config.on_cycle_error {
                    CycleErrorPolicy::SkipCycle => {
                        tracing::warn!(%expiration, error = %err, "Cycle aborted, continuing");
                    }
                    CycleErrorPolicy::AbortRun => {
                        tracing::error!(%expiration, error = %err, "Cycle aborted, stopping run");
                        return Err(err);
                    }
                }
            }
        }

        let metrics = metrics.calculate();
        tracing::info!(
            final_capital = %ledger.capital(),
            total_return = %metrics.total_return,
            orders = fills.len(),
            "Backtest finished"
        );

        Ok(BacktestResults {
            orders: fills.iter().map(|fill| fill.order.clone()).collect(),
            fills,
            settlements,
            cycles,
            ledger,
            metrics,
            config: self.config.clone(),
        })
    }
}
