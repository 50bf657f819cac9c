//! Replay CLI command.
//!
//! Copies a previously generated order table to a new location, row for row,
//! without ranking or settlement.

use anyhow::Result;
use clap::Args;

use expiry_trade_data::CsvStorage;

/// Arguments for the replay command.
#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Order table to read
    #[arg(short, long)]
    pub input: String,

    /// Order table to write
    #[arg(short, long)]
    pub output: String,
}

/// Runs the replay command.
///
/// # Errors
/// Returns an error if the input cannot be read or the output cannot be written.
pub fn run_replay(args: &ReplayArgs) -> Result<()> {
    let rows = CsvStorage::read_order_rows(&args.input)?;
    CsvStorage::write_order_rows(&args.output, &rows)?;
    tracing::info!(
        input = %args.input,
        output = %args.output,
        orders = rows.len(),
        "Order table replayed"
    );
    Ok(())
}
