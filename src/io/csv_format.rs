//! CSV output for price histories
//!
//! Writes the points returned by the price oracle as `date,<coin>_usd` rows,
//! ready for a spreadsheet or charting tool. Pure over any `Write`.

use crate::types::{Coin, PricePoint};
use std::io::Write;

/// Write a price history to CSV format
///
/// Columns are `date` (ISO 8601) and `<coin>_usd` with two decimal places.
/// Rows are written in date order regardless of input order.
///
/// # Arguments
///
/// * `coin` - The coin the history belongs to, used in the header
/// * `points` - Daily closes to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_price_history_csv(
    coin: Coin,
    points: &[PricePoint],
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    let price_column = format!("{}_usd", coin.symbol().to_lowercase());
    writer
        .write_record(["date", price_column.as_str()])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted_points = points.to_vec();
    sorted_points.sort_by_key(|point| point.date);

    for point in sorted_points {
        writer
            .write_record(&[
                point.date.format("%Y-%m-%d").to_string(),
                format!("{:.2}", point.close_usd),
            ])
            .map_err(|e| format!("Failed to write price record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
