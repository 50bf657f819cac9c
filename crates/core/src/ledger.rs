//! Capital ledger shared by every expiration cycle of a run.
//!
//! The ledger is the only mutable state that survives between cycles. It is
//! owned by the engine and lent out by `&mut` to the allocator and to
//! settlement, so updates are strictly sequential.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Running capital plus the cash-flow totals that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalLedger {
    initial: Decimal,
    capital: Decimal,
    premium_received: Decimal,
    premium_paid: Decimal,
    fees_paid: Decimal,
    settlement_paid: Decimal,
    settlement_received: Decimal,
}

impl CapitalLedger {
    #[must_use]
    pub const fn new(initial: Decimal) -> Self {
        Self {
            initial,
            capital: initial,
            premium_received: Decimal::ZERO,
            premium_paid: Decimal::ZERO,
            fees_paid: Decimal::ZERO,
            settlement_paid: Decimal::ZERO,
            settlement_received: Decimal::ZERO,
        }
    }

    #[must_use]
    pub const fn capital(&self) -> Decimal {
        self.capital
    }

    #[must_use]
    pub const fn initial(&self) -> Decimal {
        self.initial
    }

    /// Credits premium received for a written option.
    pub fn credit_premium(&mut self, premium: Decimal) {
        self.capital += premium;
        self.premium_received += premium;
    }

    /// Debits premium paid for a bought option.
    pub fn debit_premium(&mut self, premium: Decimal) {
        self.capital -= premium;
        self.premium_paid += premium;
    }

    pub fn charge_fee(&mut self, fee: Decimal) {
        self.capital -= fee;
        self.fees_paid += fee;
    }

    /// Pays out the intrinsic value owed on a written option at expiration.
    pub fn pay_settlement(&mut self, amount: Decimal) {
        self.capital -= amount;
        self.settlement_paid += amount;
    }

    /// Receives the intrinsic value of a long option at expiration.
    pub fn receive_settlement(&mut self, amount: Decimal) {
        self.capital += amount;
        self.settlement_received += amount;
    }

    #[must_use]
    pub const fn premium_received(&self) -> Decimal {
        self.premium_received
    }

    #[must_use]
    pub const fn premium_paid(&self) -> Decimal {
        self.premium_paid
    }

    #[must_use]
    pub const fn fees_paid(&self) -> Decimal {
        self.fees_paid
    }

    #[must_use]
    pub const fn settlement_paid(&self) -> Decimal {
        self.settlement_paid
    }

    #[must_use]
    pub const fn settlement_received(&self) -> Decimal {
        self.settlement_received
    }

    /// Net profit or loss since the ledger was opened.
    #[must_use]
    pub fn net_pnl(&self) -> Decimal {
        self.capital - self.initial
    }
}
