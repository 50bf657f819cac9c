use anyhow::{Context, Result};
use csv::{Reader, Writer};
use expiry_trade_core::Order;
use std::fs::File;
use std::path::Path;

use crate::etl::parse_receipt_time;
use crate::models::{OptionQuoteRow, OrderRow, UnderlyingTickRow};

pub struct CsvStorage;

impl CsvStorage {
    /// Reads the vendor option quote file.
    ///
    /// Required columns: `ts_recv,symbol,bid_px_00,ask_px_00,bid_sz_00,ask_sz_00`.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row fails to deserialize
    pub fn read_option_quotes(path: impl AsRef<Path>) -> Result<Vec<OptionQuoteRow>> {
        read_rows(path.as_ref())
    }

    /// Reads the underlying tick file.
    ///
    /// Format: date,ms_of_day,price
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row fails to deserialize
    pub fn read_underlying_ticks(path: impl AsRef<Path>) -> Result<Vec<UnderlyingTickRow>> {
        read_rows(path.as_ref())
    }

    /// Writes the order table.
    ///
    /// Format: datetime,option_symbol,action,order_size. The datetime column
    /// is the quote's receipt timestamp as the vendor wrote it.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_orders(path: impl AsRef<Path>, orders: &[Order]) -> Result<()> {
        let rows: Vec<OrderRow> = orders
            .iter()
            .map(|order| OrderRow {
                datetime: order.receipt_text.clone(),
                option_symbol: order.contract_id.clone(),
                action: order.side.code().to_string(),
                order_size: order.size.normalize(),
            })
            .collect();
        Self::write_order_rows(path, &rows)
    }

    /// Writes pre-built order rows unchanged.
    ///
    /// # Errors
    /// Returns error if file cannot be created or writing fails
    pub fn write_order_rows(path: impl AsRef<Path>, rows: &[OrderRow]) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
        let mut writer = Writer::from_writer(file);

        // Header is written even for an empty table
        writer.write_record(["datetime", "option_symbol", "action", "order_size"])?;
        for row in rows {
            writer.write_record(&[
                row.datetime.clone(),
                row.option_symbol.clone(),
                row.action.clone(),
                row.order_size.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Reads an order table as raw rows.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or a row fails to deserialize
    pub fn read_order_rows(path: impl AsRef<Path>) -> Result<Vec<OrderRow>> {
        read_rows(path.as_ref())
    }

    /// Reads an order table back into typed orders.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, or a timestamp or side is invalid
    pub fn read_orders(path: impl AsRef<Path>) -> Result<Vec<Order>> {
        Self::read_order_rows(path)?
            .into_iter()
            .map(|row| -> Result<Order> {
                let side = row.action.parse().map_err(anyhow::Error::msg)?;
                Ok(Order::new(
                    parse_receipt_time(&row.datetime)?,
                    row.datetime,
                    row.option_symbol,
                    side,
                    row.order_size,
                ))
            })
            .collect()
    }
}

fn read_rows<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    let mut rows = Vec::new();
    for (line, result) in reader.deserialize().enumerate() {
        let row: T = result
            .with_context(|| format!("Invalid row {} in {}", line + 2, path.display()))?;
        rows.push(row);
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "CSV loaded");
    Ok(rows)
}
