//! Expiration settlement of the positions opened in one cycle.
//!
//! Each position settles against the underlying minute snapshot on its
//! expiration date, at the order's time of day clamped into the settlement
//! window. Positions settle in fill order and each payoff is applied to the
//! ledger before the next lookup. A missing snapshot stops settlement; payoffs
//! applied before it stay on the ledger.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use expiry_trade_core::{
    ActivePosition, BacktestError, CapitalLedger, OrderSide, SettlementWindow, StrategyConfig,
};
use expiry_trade_data::MarketDataStore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Settlement record for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledPosition {
    pub position: ActivePosition,
    /// Expiration date at the clamped settlement minute.
    pub settled_at: NaiveDateTime,
    pub settlement_price: Decimal,
    /// Signed ledger change: negative for written options paying out.
    pub payoff: Decimal,
}

impl SettledPosition {
    #[must_use]
    pub fn is_in_the_money(&self) -> bool {
        !self.payoff.is_zero()
    }
}

/// Outcome of settling a cycle's positions.
#[derive(Debug, Default)]
pub struct CycleSettlement {
    pub settled: Vec<SettledPosition>,
    /// Set when a settlement price was missing; later positions were not settled.
    pub failure: Option<BacktestError>,
}

impl CycleSettlement {
    /// Net ledger change from the positions that did settle.
    #[must_use]
    pub fn cash_flow(&self) -> Decimal {
        self.settled.iter().map(|s| s.payoff).sum()
    }
}

#[derive(Debug, Clone)]
pub struct SettlementEngine {
    window: SettlementWindow,
    multiplier: Decimal,
}

impl SettlementEngine {
    #[must_use]
    pub const fn new(window: SettlementWindow, multiplier: Decimal) -> Self {
        Self { window, multiplier }
    }

    #[must_use]
    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.settlement_window, config.multiplier)
    }

    /// Clamped settlement time for `position` on its expiration date.
    #[must_use]
    pub fn settlement_time(&self, position: &ActivePosition) -> (u32, u32) {
        let order_time = position.order_time.time();
        self.window.clamp(order_time.hour(), order_time.minute())
    }

    /// Prices one position without touching the ledger.
    ///
    /// # Errors
    /// Returns `BacktestError::MissingSettlementPrice` if the store has no
    /// snapshot at the clamped minute.
    pub fn price_position(
        &self,
        store: &MarketDataStore,
        position: &ActivePosition,
    ) -> Result<SettledPosition, BacktestError> {
        let expiration = position.expiration_date;
        let (hour, minute) = self.settlement_time(position);
        let settlement_price = store.minute_snapshot(expiration, hour, minute).ok_or_else(|| {
            BacktestError::MissingSettlementPrice {
                expiration,
                hour,
                minute,
                contract_id: position.contract_id.clone(),
            }
        })?;

        let value = position.intrinsic_value(settlement_price, self.multiplier);
        let payoff = match position.side {
            OrderSide::Sell => -value,
            OrderSide::Buy => value,
        };
        // clamp() only yields valid clock times
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);

        Ok(SettledPosition {
            position: position.clone(),
            settled_at: expiration.and_time(time),
            settlement_price,
            payoff,
        })
    }

    /// Settles `positions` in order, applying each payoff to `ledger`.
    pub fn settle(
        &self,
        store: &MarketDataStore,
        positions: &[ActivePosition],
        ledger: &mut CapitalLedger,
    ) -> CycleSettlement {
        let mut outcome = CycleSettlement::default();

        for position in positions {
            let settled = match self.price_position(store, position) {
                Ok(settled) => settled,
                Err(err) => {
                    tracing::warn!(
                        contract = %position.contract_id,
                        error = %err,
                        remaining = positions.len() - outcome.settled.len(),
                        "Settlement stopped"
                    );
                    outcome.failure = Some(err);
                    break;
                }
            };

            if settled.payoff < Decimal::ZERO {
                ledger.pay_settlement(-settled.payoff);
            } else if settled.payoff > Decimal::ZERO {
                ledger.receive_settlement(settled.payoff);
            }
            tracing::trace!(
                contract = %position.contract_id,
                price = %settled.settlement_price,
                payoff = %settled.payoff,
                "Position settled"
            );
            outcome.settled.push(settled);
        }

        outcome
    }
}
