//! CLI commands for the expiry-cycle backtester.

pub mod backtest;
pub mod replay;

pub use backtest::{run_backtest, BacktestArgs};
pub use replay::{run_replay, ReplayArgs};
