use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Run-level performance computed from the per-cycle capital series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_capital: Decimal,
    pub final_capital: Decimal,
    pub total_return: Decimal,
    /// Annualised with `sqrt(252)`.
    pub sharpe_ratio: f64,
    pub max_drawdown: Decimal,
    pub num_cycles: usize,
    pub winning_cycles: usize,
    pub losing_cycles: usize,
    pub win_rate: f64,
    pub num_orders: usize,
}

pub struct MetricsCalculator {
    returns: Vec<Decimal>,
    equity_curve: Vec<Decimal>,
    wins: usize,
    losses: usize,
    orders: usize,
}

impl MetricsCalculator {
    /// Creates a new `MetricsCalculator` with the specified initial capital.
    #[must_use]
    pub fn new(initial_capital: Decimal) -> Self {
        Self {
            returns: Vec::new(),
            equity_curve: vec![initial_capital],
            wins: 0,
            losses: 0,
            orders: 0,
        }
    }

    fn current_equity(&self) -> Decimal {
        self.equity_curve.last().copied().unwrap_or(Decimal::ZERO)
    }

    fn initial_equity(&self) -> Decimal {
        self.equity_curve.first().copied().unwrap_or(Decimal::ZERO)
    }

    /// Records the capital at the end of one cycle and the orders it filled.
    pub fn add_cycle(&mut self, capital_after: Decimal, orders: usize) {
        let previous = self.current_equity();
        let pnl = capital_after - previous;
        self.equity_curve.push(capital_after);
        self.orders += orders;

        if pnl > Decimal::ZERO {
            self.wins += 1;
        } else if pnl < Decimal::ZERO {
            self.losses += 1;
        }

        if !previous.is_zero() {
            self.returns.push(pnl / previous);
        }
    }

    /// Equity after each recorded cycle, starting with the initial capital.
    #[must_use]
    pub fn equity_curve(&self) -> &[Decimal] {
        &self.equity_curve
    }

    /// Calculates and returns performance metrics.
    #[must_use]
    pub fn calculate(&self) -> PerformanceMetrics {
        let initial = self.initial_equity();
        let final_capital = self.current_equity();
        let total_return = if initial.is_zero() {
            Decimal::ZERO
        } else {
            (final_capital - initial) / initial
        };

        let num_cycles = self.equity_curve.len() - 1;
        let decided = self.wins + self.losses;
        #[allow(clippy::cast_precision_loss)]
        let win_rate = if decided > 0 {
            self.wins as f64 / decided as f64
        } else {
            0.0
        };

        PerformanceMetrics {
            initial_capital: initial,
            final_capital,
            total_return,
            sharpe_ratio: self.sharpe_ratio(),
            max_drawdown: self.calculate_max_drawdown(),
            num_cycles,
            winning_cycles: self.wins,
            losing_cycles: self.losses,
            win_rate,
            num_orders: self.orders,
        }
    }

    fn sharpe_ratio(&self) -> f64 {
        if self.returns.is_empty() {
            return 0.0;
        }
        let returns: Vec<f64> = self
            .returns
            .iter()
            .map(|r| r.to_f64().unwrap_or(0.0))
            .collect();

        #[allow(clippy::cast_precision_loss)]
        let len = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / len;
        let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / len;

        let std_dev = variance.sqrt();
        if std_dev > 0.0 {
            mean / std_dev * (252.0_f64).sqrt()
        } else {
            0.0
        }
    }

    fn calculate_max_drawdown(&self) -> Decimal {
        let mut max_drawdown = Decimal::ZERO;
        let mut peak = self.initial_equity();

        for &equity in &self.equity_curve {
            if equity > peak {
                peak = equity;
            }
            if peak <= Decimal::ZERO {
                continue;
            }
            let drawdown = (peak - equity) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }

        max_drawdown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_run_has_neutral_metrics() {
        let metrics = MetricsCalculator::new(dec!(1000)).calculate();
        assert_eq!(metrics.total_return, Decimal::ZERO);
        assert_eq!(metrics.max_drawdown, Decimal::ZERO);
        assert_eq!(metrics.num_cycles, 0);
        assert!((metrics.sharpe_ratio - 0.0).abs() < f64::EPSILON);
        assert!((metrics.win_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn tracks_return_drawdown_and_win_rate() {
        let mut calc = MetricsCalculator::new(dec!(1000));
        calc.add_cycle(dec!(1100), 3);
        calc.add_cycle(dec!(880), 2);
        calc.add_cycle(dec!(880), 0);
        calc.add_cycle(dec!(1210), 4);

        let metrics = calc.calculate();
        assert_eq!(metrics.total_return, dec!(0.21));
        // Peak 1100, trough 880
        assert_eq!(metrics.max_drawdown, dec!(0.2));
        assert_eq!(metrics.num_cycles, 4);
        assert_eq!(metrics.winning_cycles, 2);
        assert_eq!(metrics.losing_cycles, 1);
        assert!((metrics.win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(metrics.num_orders, 9);
        assert_eq!(calc.equity_curve().len(), 5);
    }

    #[test]
    fn constant_returns_have_zero_sharpe() {
        let mut calc = MetricsCalculator::new(dec!(100));
        calc.add_cycle(dec!(110), 1);
        calc.add_cycle(dec!(121), 1);
        let metrics = calc.calculate();
        assert!((metrics.sharpe_ratio - 0.0).abs() < f64::EPSILON);
        assert_eq!(metrics.total_return, dec!(0.21));
    }

    #[test]
    fn positive_mixed_returns_have_positive_sharpe() {
        let mut calc = MetricsCalculator::new(dec!(100));
        calc.add_cycle(dec!(110), 1);
        calc.add_cycle(dec!(105), 1);
        calc.add_cycle(dec!(120), 1);
        assert!(calc.calculate().sharpe_ratio > 0.0);
    }
}
