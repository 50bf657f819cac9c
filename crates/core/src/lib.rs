pub mod config;
pub mod config_loader;
pub mod error;
pub mod ledger;
pub mod order;
pub mod position;
pub mod quote;

pub use config::{
    AppConfig, CycleErrorPolicy, DataConfig, QuoteTimezone, RankingPolicy, SettlementRule,
    SettlementWindow, StrategyConfig, SymbolErrorPolicy, SymbolLayout, UnderlyingAlignment,
};
pub use config_loader::ConfigLoader;
pub use error::BacktestError;
pub use ledger::CapitalLedger;
pub use order::{Order, OrderSide};
pub use position::ActivePosition;
pub use quote::{OptionQuote, OptionType};
