//! Fee models applied to filled option orders.
//!
//! The premium-buying variant pays a flat fee per order; the premium-selling
//! variant trades fee-free.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Trait for calculating per-order fees.
pub trait FeeModel: Send + Sync {
    /// Fee charged for one fill.
    ///
    /// # Arguments
    /// * `order_size` - Contracts filled
    /// * `price` - Premium per share
    fn order_fee(&self, order_size: Decimal, price: Decimal) -> Decimal;

    /// Returns the name of this fee model.
    fn name(&self) -> &str;
}

/// A zero-fee model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoFees;

impl FeeModel for NoFees {
    fn order_fee(&self, _order_size: Decimal, _price: Decimal) -> Decimal {
        Decimal::ZERO
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// The same fee on every order, independent of size and price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatOrderFee {
    pub amount: Decimal,
}

impl FlatOrderFee {
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self { amount }
    }
}

impl FeeModel for FlatOrderFee {
    fn order_fee(&self, _order_size: Decimal, _price: Decimal) -> Decimal {
        self.amount
    }

    fn name(&self) -> &str {
        "flat"
    }
}

/// Picks the fee model for a configured per-order fee.
#[must_use]
pub fn fee_model_for(order_fee: Decimal) -> Box<dyn FeeModel> {
    if order_fee.is_zero() {
        Box::new(NoFees)
    } else {
        Box::new(FlatOrderFee::new(order_fee))
    }
}
