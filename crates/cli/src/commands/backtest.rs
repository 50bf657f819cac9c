//! Backtest CLI command.
//!
//! Loads the option quote and underlying tick files, runs every expiration
//! cycle and writes the order table plus a summary report.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;

use expiry_trade_backtest::{BacktestEngine, BacktestResults, CycleOutcome};
use expiry_trade_core::{AppConfig, ConfigLoader};
use expiry_trade_data::{assemble, CsvStorage, IngestStats};

/// Arguments for the backtest command.
#[derive(Args, Debug, Clone)]
pub struct BacktestArgs {
    /// Base configuration file
    #[arg(short, long, default_value = "config/Config.toml")]
    pub config: String,

    /// Profile layered over the base file (reads Config.{profile}.toml)
    #[arg(long, env = "EXPIRY_PROFILE")]
    pub profile: Option<String>,

    /// Option quote CSV (overrides data.options_csv)
    #[arg(long)]
    pub options: Option<String>,

    /// Underlying tick CSV (overrides data.underlying_csv)
    #[arg(long)]
    pub underlying: Option<String>,

    /// Order table to write (overrides data.orders_csv)
    #[arg(long)]
    pub orders: Option<String>,

    /// Opening capital (overrides strategy.capital)
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// First expiration date to trade, YYYY-MM-DD
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last expiration date to trade, YYYY-MM-DD
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Output JSON results to file
    #[arg(long)]
    pub output: Option<String>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Output format for backtest reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format: '{}'. Valid formats: text, json", s)),
        }
    }
}

/// Everything written to the JSON report.
#[derive(Debug, Serialize)]
struct Report<'a> {
    ingest: IngestStats,
    #[serde(flatten)]
    results: &'a BacktestResults,
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(mut config: AppConfig, args: &BacktestArgs) -> Result<AppConfig> {
    if let Some(path) = &args.options {
        config.data.options_csv = path.clone();
    }
    if let Some(path) = &args.underlying {
        config.data.underlying_csv = path.clone();
    }
    if let Some(path) = &args.orders {
        config.data.orders_csv = path.clone();
    }
    if let Some(capital) = args.capital {
        config.strategy.capital = capital;
    }
    if args.start.is_some() {
        config.strategy.start_date = args.start;
    }
    if args.end.is_some() {
        config.strategy.end_date = args.end;
    }
    config.validate()?;
    Ok(config)
}

/// Formats the backtest results as a text report.
fn format_text_report(results: &BacktestResults, ingest: &IngestStats) -> String {
    let metrics = &results.metrics;
    let ledger = &results.ledger;

    let mut output = String::new();

    output.push('\n');
    output.push_str("===============================================================\n");
    output.push_str("                 EXPIRY CYCLE BACKTEST RESULTS                 \n");
    output.push_str("===============================================================\n");
    output.push_str(&format!("Policy:         {:?}\n", results.config.ranking_policy));
    output.push_str(&format!("Threshold:      {}\n", results.config.threshold));
    output.push_str(&format!(
        "Quotes:         {} accepted, {} rejected symbols\n",
        ingest.quotes_accepted, ingest.rejected_symbols
    ));
    output.push('\n');

    output.push_str("CYCLES\n");
    output.push_str("---------------------------------------------------------------\n");
    for cycle in &results.cycles {
        let status = match &cycle.outcome {
            CycleOutcome::Completed => "ok".to_string(),
            CycleOutcome::Aborted { error } => format!("ABORTED: {error}"),
        };
        output.push_str(&format!(
            "{}  orders {:>4}  premium {:>14.2}  settlement {:>14.2}  {}\n",
            cycle.expiration,
            cycle.orders_filled,
            cycle.premium_cash_flow,
            cycle.settlement_cash_flow,
            status
        ));
    }
    output.push('\n');

    output.push_str("LEDGER\n");
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!("Initial:        {:.2}\n", ledger.initial()));
    output.push_str(&format!("Premium In:     {:.2}\n", ledger.premium_received()));
    output.push_str(&format!("Premium Out:    {:.2}\n", ledger.premium_paid()));
    output.push_str(&format!("Fees:           {:.2}\n", ledger.fees_paid()));
    output.push_str(&format!("Settled Out:    {:.2}\n", ledger.settlement_paid()));
    output.push_str(&format!("Settled In:     {:.2}\n", ledger.settlement_received()));
    output.push_str(&format!("Final:          {:.2}\n", ledger.capital()));
    output.push_str(&format!("Net P&L:        {:.2}\n", ledger.net_pnl()));
    output.push('\n');

    output.push_str("PERFORMANCE\n");
    output.push_str("---------------------------------------------------------------\n");
    output.push_str(&format!("Orders:         {}\n", metrics.num_orders));
    output.push_str(&format!(
        "Cycles:         {} ({} won, {} lost, {} aborted)\n",
        metrics.num_cycles,
        metrics.winning_cycles,
        metrics.losing_cycles,
        results.aborted_cycles()
    ));
    output.push_str(&format!("Win Rate:       {:.1}%\n", metrics.win_rate * 100.0));
    output.push_str(&format!(
        "Total Return:   {:.4}%\n",
        metrics.total_return * Decimal::ONE_HUNDRED
    ));
    output.push_str(&format!(
        "Max Drawdown:   {:.4}%\n",
        metrics.max_drawdown * Decimal::ONE_HUNDRED
    ));
    output.push_str(&format!("Sharpe:         {:.3}\n", metrics.sharpe_ratio));
    output.push_str("===============================================================\n");

    output
}

/// Runs the backtest command.
///
/// # Errors
/// Returns an error if configuration or input files are invalid, a cycle
/// aborts under `abort_run`, or the order table cannot be written.
pub async fn run_backtest(args: BacktestArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;
    let loaded = ConfigLoader::load_from(&args.config, args.profile.as_deref())
        .with_context(|| format!("Failed to load configuration from {}", args.config))?;
    let config = apply_overrides(loaded, &args)?;

    tracing::info!(
        options = %config.data.options_csv,
        underlying = %config.data.underlying_csv,
        "Loading market data"
    );

    // The two files are independent; read them side by side.
    let options_path = config.data.options_csv.clone();
    let underlying_path = config.data.underlying_csv.clone();
    let (quote_rows, tick_rows) = tokio::try_join!(
        tokio::task::spawn_blocking(move || CsvStorage::read_option_quotes(options_path)),
        tokio::task::spawn_blocking(move || CsvStorage::read_underlying_ticks(underlying_path)),
    )?;
    let (quote_rows, tick_rows) = (quote_rows?, tick_rows?);

    let (store, ingest) = assemble(quote_rows, &tick_rows, &config.data, config.strategy.end_date)
        .context("Failed to assemble market data")?;

    let engine = BacktestEngine::new(config.strategy.clone())?;
    let results = engine.run(&store)?;

    CsvStorage::write_orders(&config.data.orders_csv, &results.orders)?;
    tracing::info!(
        path = %config.data.orders_csv,
        orders = results.orders.len(),
        "Order table written"
    );

    match format {
        OutputFormat::Text => {
            println!("{}", format_text_report(&results, &ingest));
        }
        OutputFormat::Json => {
            let report = Report {
                ingest,
                results: &results,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(output_path) = args.output {
        let report = Report {
            ingest,
            results: &results,
        };
        std::fs::write(&output_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write {output_path}"))?;
        tracing::info!("Results written to {}", output_path);
    }

    Ok(())
}
