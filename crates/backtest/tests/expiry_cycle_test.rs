//! End-to-end runs over vendor-shaped rows: ingestion, ranking, allocation,
//! settlement, and the order table.

use expiry_trade_backtest::{BacktestEngine, ContractRanker, CycleOutcome};
use expiry_trade_core::{
    CycleErrorPolicy, DataConfig, OptionType, OrderSide, RankingPolicy, StrategyConfig,
};
use expiry_trade_data::{assemble, CsvStorage, MarketDataStore, OptionQuoteRow, UnderlyingTickRow};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use tempfile::TempDir;

fn row(ts: &str, symbol: &str, bid: (Decimal, u64), ask: (Decimal, u64)) -> OptionQuoteRow {
    OptionQuoteRow {
        ts_recv: ts.to_string(),
        symbol: symbol.to_string(),
        bid_price: Some(bid.0),
        ask_price: Some(ask.0),
        bid_size: Some(bid.1),
        ask_size: Some(ask.1),
    }
}

fn tick(date: u32, ms_of_day: i64, price: Decimal) -> UnderlyingTickRow {
    UnderlyingTickRow {
        date,
        ms_of_day,
        price,
    }
}

const TEN_AM: i64 = 36_000_000;
const TEN_THIRTY: i64 = 37_800_000;

/// Two cycles. Jan 5 expires out of the money; the Jan 12 call finishes 60
/// points in the money at the 15:30 settlement minute.
fn market() -> MarketDataStore {
    let quotes = vec![
        row("2024-01-04T15:00:00.5Z", "SPX 20240105P4500000", (dec!(1.25), 12), (dec!(1.4), 10)),
        row("2024-01-04T15:00:01.5Z", "SPX 20240105C5000000", (dec!(0.8), 0), (dec!(0.9), 4)),
        row("2024-01-04T15:00:02.5Z", "SPX 20240105C4950000", (dec!(1.1), 7), (dec!(1.3), 7)),
        row("2024-01-04T15:00:03.5Z", "SPX 20240105P4700000", (dec!(3), 9), (dec!(3.2), 9)),
        row("2024-01-04T15:00:04.5Z", "SPX 20240105P5000000", (dec!(10), 5), (dec!(10.5), 5)),
        row("2024-01-04T15:00:05.5Z", "BAD SYMBOL", (dec!(1), 1), (dec!(1), 1)),
        row("2024-01-11T15:30:00.0Z", "SPX 20240112C4900000", (dec!(2), 3), (dec!(2.2), 3)),
    ];
    let ticks = vec![
        tick(20240104, TEN_AM, dec!(4800)),
        tick(20240105, TEN_AM, dec!(4790)),
        tick(20240111, TEN_AM, dec!(4750)),
        tick(20240112, TEN_THIRTY, dec!(4960)),
        tick(20240112, TEN_AM, dec!(-1)),
    ];
    let (store, stats) = assemble(quotes, &ticks, &DataConfig::default(), None).unwrap();
    assert_eq!(stats.rejected_symbols, 1);
    assert_eq!(stats.non_positive_ticks, 1);
    store
}

#[test]
fn selling_run_matches_hand_computed_ledger() {
    let store = market();
    let results = BacktestEngine::new(StrategyConfig::selling()).unwrap().run(&store).unwrap();

    let orders: Vec<_> = results
        .orders
        .iter()
        .map(|o| (o.contract_id.as_str(), o.side, o.size))
        .collect();
    assert_eq!(
        orders,
        vec![
            ("SPX 20240105P4500000", OrderSide::Sell, dec!(12)),
            ("SPX 20240105C4950000", OrderSide::Sell, dec!(7)),
            ("SPX 20240112C4900000", OrderSide::Sell, dec!(3)),
        ]
    );

    // Premiums 1500 + 770 + 600, then the Jan 12 call pays 3 * 100 * 60.
    assert_eq!(results.cycles[0].premium_cash_flow, dec!(2270));
    assert_eq!(results.cycles[0].settlement_cash_flow, Decimal::ZERO);
    assert_eq!(results.cycles[1].settlement_cash_flow, dec!(-18_000));
    assert_eq!(results.final_capital(), dec!(99_984_870));
    assert_eq!(results.final_capital(), results.reconciled_capital());
    assert!(results.cycles.iter().all(|c| c.outcome == CycleOutcome::Completed));
}

#[test]
fn ledger_reconciles_from_orders_and_settlement_prices() {
    let store = market();
    let config = StrategyConfig::selling();
    let results = BacktestEngine::new(config.clone()).unwrap().run(&store).unwrap();

    // Bid prices by contract, straight from the input rows.
    let bids: HashMap<&str, Decimal> = [
        ("SPX 20240105P4500000", dec!(1.25)),
        ("SPX 20240105C4950000", dec!(1.1)),
        ("SPX 20240112C4900000", dec!(2)),
    ]
    .into_iter()
    .collect();

    assert_eq!(results.orders.len(), 3);
    let mut expected = config.capital;
    for (order, fill) in results.orders.iter().zip(&results.fills) {
        let premium = order.size * bids[order.contract_id.as_str()] * config.multiplier;
        // Credited only when capital covered margin plus premium at fill time.
        if fill.capital_before >= fill.reserve + premium {
            expected += premium;
        }
        expected -= config.order_fee;
    }
    for settled in &results.settlements {
        let diff = settled.settlement_price - settled.position.strike_price;
        let owed = match settled.position.option_type {
            OptionType::Call if diff > Decimal::ZERO => diff,
            OptionType::Put if diff < Decimal::ZERO => -diff,
            _ => Decimal::ZERO,
        } * settled.position.size
            * config.multiplier;
        expected -= owed;
    }
    assert_eq!(results.ledger.capital(), expected);
}

#[test]
fn no_fill_exceeds_available_capital() {
    let store = market();
    let config = StrategyConfig::selling().with_capital(dec!(2000));
    let results = BacktestEngine::new(config).unwrap().run(&store).unwrap();

    assert!(!results.fills.is_empty());
    for fill in &results.fills {
        assert!(fill.premium <= fill.available(), "{fill:?}");
    }
}

#[test]
fn ranked_candidates_are_monotonic_and_orders_stop_at_threshold() {
    let store = market();
    let config = StrategyConfig::selling();
    let ranker = ContractRanker::from_config(&config);
    let expiration = store.expirations().next().unwrap();
    let ranked = ranker.rank(&store, expiration);

    assert!(ranked.windows(2).all(|w| w[0].score <= w[1].score));
    let cutoff = ranked.iter().position(|r| !ranker.is_eligible(r.score)).unwrap();

    let results = BacktestEngine::new(config).unwrap().run(&store).unwrap();
    let filled: Vec<_> = results
        .orders
        .iter()
        .filter(|o| o.contract_id.contains("20240105"))
        .map(|o| o.contract_id.clone())
        .collect();
    let eligible: Vec<_> = ranked[..cutoff]
        .iter()
        .map(|r| r.quote.contract_id.clone())
        .collect();
    assert!(filled.iter().all(|id| eligible.contains(id)));
}

#[test]
fn buying_run_uses_ask_side_and_fee() {
    let store = market();
    let config = StrategyConfig::buying().with_threshold(dec!(50));
    let results = BacktestEngine::new(config).unwrap().run(&store).unwrap();

    // Only the Jan 5 P5000 scores above 50: 200 - 10.5 = 189.5.
    assert_eq!(results.orders.len(), 1);
    let fill = &results.fills[0];
    assert_eq!(fill.order.side, OrderSide::Buy);
    assert_eq!(fill.price, dec!(10.5));
    assert_eq!(fill.order.size, dec!(5));
    assert_eq!(fill.ledger_delta, dec!(-5250.5));
    // Opening-floor window keeps 15:00; the put is worth 210 at 4790.
    assert_eq!(results.cycles[0].settlement_cash_flow, dec!(105_000));
    assert_eq!(results.final_capital(), results.reconciled_capital());
    assert_eq!(results.config.ranking_policy, RankingPolicy::SpreadAdjustedDescending);
}

#[test]
fn missing_settlement_minute_is_reported_per_policy() {
    let quotes = vec![row(
        "2024-01-04T16:45:00.0Z",
        "SPX 20240105P4500000",
        (dec!(1), 5),
        (dec!(1.2), 5),
    )];
    let ticks = vec![tick(20240104, TEN_AM, dec!(4800)), tick(20240105, TEN_AM, dec!(4790))];
    let (store, _) = assemble(quotes, &ticks, &DataConfig::default(), None).unwrap();

    let skipped = BacktestEngine::new(StrategyConfig::selling()).unwrap().run(&store).unwrap();
    assert!(matches!(skipped.cycles[0].outcome, CycleOutcome::Aborted { .. }));
    assert_eq!(skipped.orders.len(), 1);

    let config = StrategyConfig::selling().with_cycle_error_policy(CycleErrorPolicy::AbortRun);
    assert!(BacktestEngine::new(config).unwrap().run(&store).is_err());
}

#[test]
fn order_table_round_trips_through_csv() {
    let store = market();
    let results = BacktestEngine::new(StrategyConfig::selling()).unwrap().run(&store).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orders.csv");

    CsvStorage::write_orders(&path, &results.orders).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("2024-01-04T15:00:00.5Z,SPX 20240105P4500000,S,12"));
    assert!(text.contains("2024-01-11T15:30:00.0Z,SPX 20240112C4900000,S,3"));

    let loaded = CsvStorage::read_orders(&path).unwrap();
    assert_eq!(loaded, results.orders);
}
