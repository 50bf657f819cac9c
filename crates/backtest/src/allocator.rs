//! Budget-constrained allocation over a ranked candidate list.
//!
//! One forward pass per cycle. The ledger is updated after every fill, so the
//! capacity of each quote depends on the fills ahead of it. Allocation stops
//! at the first quote whose score fails the threshold or whose capacity is no
//! longer positive.

use expiry_trade_core::{
    ActivePosition, CapitalLedger, Order, OptionQuote, OptionType, RankingPolicy, StrategyConfig,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::fees::{fee_model_for, FeeModel};
use crate::ranking::{ContractRanker, RankedQuote};

/// Decimal places kept on a capital-bound order size. Truncating keeps
/// `size * multiplier * price` within the capital it was sized against.
const SIZE_SCALE: u32 = 8;

/// Audit record for one filled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order: Order,
    /// Premium per share on the side the order filled against.
    pub price: Decimal,
    /// `size * multiplier * price`.
    pub premium: Decimal,
    pub fee: Decimal,
    /// Capital held back when sizing: margin for written options, the cycle
    /// spend limit for bought ones.
    pub reserve: Decimal,
    pub capital_before: Decimal,
    /// Signed change applied to the ledger at fill time.
    pub ledger_delta: Decimal,
}

impl Fill {
    /// Capital that was available for this order's premium.
    #[must_use]
    pub fn available(&self) -> Decimal {
        self.capital_before - self.reserve
    }
}

/// Why the forward pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStop {
    /// Every candidate was evaluated.
    Exhausted,
    /// The candidate at `index` failed the score threshold.
    BelowThreshold { index: usize },
    /// The candidate at `index` had no positive capacity left.
    CapitalExhausted { index: usize },
}

/// Fills and positions opened for one cycle.
#[derive(Debug, Clone, Default)]
pub struct Allocation {
    pub fills: Vec<Fill>,
    pub positions: Vec<ActivePosition>,
    /// Candidates inspected before the pass stopped.
    pub quotes_considered: usize,
    pub stop: Option<AllocationStop>,
}

impl Allocation {
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.fills.iter().map(|fill| fill.order.clone()).collect()
    }

    /// Sum of ledger deltas applied at fill time.
    #[must_use]
    pub fn premium_cash_flow(&self) -> Decimal {
        self.fills.iter().map(|fill| fill.ledger_delta).sum()
    }
}

/// Sizes orders against the ledger for either ranking policy.
pub struct BudgetAllocator {
    ranker: ContractRanker,
    margin_rate: Decimal,
    spend_limit_ratio: Decimal,
    min_premium: Decimal,
    multiplier: Decimal,
    fee_model: Box<dyn FeeModel>,
}

impl BudgetAllocator {
    #[must_use]
    pub fn new(config: &StrategyConfig, fee_model: Box<dyn FeeModel>) -> Self {
        Self {
            ranker: ContractRanker::from_config(config),
            margin_rate: config.margin_rate,
            spend_limit_ratio: config.spend_limit_ratio,
            min_premium: config.min_premium,
            multiplier: config.multiplier,
            fee_model,
        }
    }

    /// Allocator whose fee model is the configured flat `order_fee`.
    #[must_use]
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config, fee_model_for(config.order_fee))
    }

    #[must_use]
    pub fn ranker(&self) -> &ContractRanker {
        &self.ranker
    }

    /// Per-contract margin for writing `quote`.
    #[must_use]
    pub fn margin(&self, quote: &OptionQuote) -> Decimal {
        match quote.option_type {
            OptionType::Call => self.margin_rate * quote.strike_price,
            OptionType::Put => self.margin_rate * quote.underlying_price,
        }
    }

    /// Walks `ranked` once, emitting orders and updating `ledger` after each.
    pub fn allocate(&self, ranked: &[RankedQuote<'_>], ledger: &mut CapitalLedger) -> Allocation {
        let mut allocation = Allocation::default();
        // Fixed for the whole cycle.
        let spend_limit = ledger.capital() * self.spend_limit_ratio;

        for (index, candidate) in ranked.iter().enumerate() {
            allocation.quotes_considered = index + 1;

            if !self.ranker.is_eligible(candidate.score) {
                allocation.stop = Some(AllocationStop::BelowThreshold { index });
                break;
            }

            let quote = candidate.quote;
            let terms = self.ranker.fill_terms(quote);
            if !terms.is_tradable() {
                tracing::trace!(contract = %quote.contract_id, "Skipping quote with empty side");
                continue;
            }

            let reserve = match self.ranker.policy() {
                RankingPolicy::DeviateAscending => self.margin(quote),
                RankingPolicy::SpreadAdjustedDescending => spend_limit,
            };
            let capital_before = ledger.capital();
            let capacity = ((capital_before - reserve) / (terms.price * self.multiplier))
                .round_dp_with_strategy(SIZE_SCALE, RoundingStrategy::ToZero);
            let size = capacity.min(Decimal::from(terms.size));
            if size <= Decimal::ZERO {
                allocation.stop = Some(AllocationStop::CapitalExhausted { index });
                break;
            }

            let premium = size * self.multiplier * terms.price;
            if premium < self.min_premium {
                continue;
            }

            let fee = self.fee_model.order_fee(size, terms.price);
            let ledger_delta = match self.ranker.policy() {
                RankingPolicy::DeviateAscending => {
                    // The order stands even when the premium is not booked.
                    let credited = if capital_before >= reserve + premium {
                        ledger.credit_premium(premium);
                        premium
                    } else {
                        tracing::debug!(
                            contract = %quote.contract_id,
                            %premium,
                            margin = %reserve,
                            "Premium not credited, capital below margin plus premium"
                        );
                        Decimal::ZERO
                    };
                    ledger.charge_fee(fee);
                    credited - fee
                }
                RankingPolicy::SpreadAdjustedDescending => {
                    ledger.debit_premium(premium);
                    ledger.charge_fee(fee);
                    -(premium + fee)
                }
            };

            let side = self.ranker.policy().order_side();
            let order = Order::new(
                quote.received_at,
                quote.receipt_text.clone(),
                quote.contract_id.clone(),
                side,
                size,
            );
            allocation.positions.push(ActivePosition {
                contract_id: quote.contract_id.clone(),
                strike_price: quote.strike_price,
                option_type: quote.option_type,
                side,
                size,
                order_time: quote.timestamp,
                expiration_date: quote.expiration_date,
            });
            allocation.fills.push(Fill {
                order,
                price: terms.price,
                premium,
                fee,
                reserve,
                capital_before,
                ledger_delta,
            });
        }

        if allocation.stop.is_none() {
            allocation.stop = Some(AllocationStop::Exhausted);
        }
        allocation
    }
}
